use log::{debug, error};
use lsf_compile::{
    command::{Command, Registry},
    interpret::Interpreter,
    run, run_session, stdlib,
};
use std::{
    env, fs,
    io::{self, Write},
    process,
    sync::{Arc, Mutex},
};

fn main() {
    pretty_env_logger::init();
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() > 1 {
        eprintln!("Usage: lsf [script.lsf]");
        process::exit(2);
    }
    let last_error = Arc::new(Mutex::new(None));
    let mut interpreter = Interpreter::new(Arc::new(registry(Arc::clone(&last_error))));
    let ok = if args.is_empty() {
        run_repl(&mut interpreter, &last_error)
    } else {
        run_file(&args[0], &mut interpreter)
    };
    if !ok {
        process::exit(1);
    }
}

/// The built-in commands plus the host-only `lasterror` and `help`.
fn registry(last_error: Arc<Mutex<Option<String>>>) -> Registry {
    let mut registry = Registry::new();
    stdlib::init(&mut registry);
    registry.register(Command::new(
        "lasterror",
        "prints the most recent error",
        vec![],
        move |_| {
            let last = last_error.lock().map_err(|e| e.to_string())?;
            println!("{}", last.as_deref().unwrap_or("no errors"));
            Ok(())
        },
    ));
    // Registered last so that its listing includes every other command
    let mut usage = registry.usage();
    usage.push_str("\nhelp - lists the available commands");
    registry.register(Command::new(
        "help",
        "lists the available commands",
        vec![],
        move |_| {
            println!("{usage}");
            Ok(())
        },
    ));
    registry
}

fn run_repl(interpreter: &mut Interpreter, last_error: &Mutex<Option<String>>) -> bool {
    let (stdin, mut stdout) = (io::stdin(), io::stdout());
    loop {
        let mut line = String::default();
        print!(">>> ");
        if let Err(e) = stdout.flush() {
            error!("Failed to flush stdout: {e}");
            return false;
        }
        match stdin.read_line(&mut line) {
            // If zero bytes are read, then exit (usually triggered by Ctrl-D)
            Ok(0) => return true,
            Ok(_) => (),
            Err(e) => {
                error!("Failed to read line: {e}");
                return false;
            }
        }
        if let Err(e) = run_session(&line, interpreter) {
            eprintln!("{e}");
            match last_error.lock() {
                Ok(mut last) => *last = Some(e.to_string()),
                Err(e) => debug!("Could not retain error: {e}"),
            }
        }
    }
}

fn run_file(file_path: &str, interpreter: &mut Interpreter) -> bool {
    let source = match fs::read_to_string(file_path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Failed to read {file_path}: {e}");
            return false;
        }
    };
    match run(&source, interpreter) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("{e}");
            false
        }
    }
}
