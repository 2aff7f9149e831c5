use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
};

use crate::command::{Arg, Command, CommandParam, ParamType, Registry};

pub fn init(registry: &mut Registry) {
    init_io(registry, Arc::new(Mutex::new(io::stdout())));
}

/// Registers the built-in commands, writing their output to `out`.
pub fn init_io<W>(registry: &mut Registry, out: Arc<Mutex<W>>)
where
    W: Write + Send + 'static,
{
    // echo [text]
    registry.register(Command::new(
        "echo",
        "prints the text",
        vec![CommandParam::optional("text", ParamType::Str)],
        move |args| {
            let text = args
                .first()
                .and_then(Arg::value)
                .map(ToString::to_string)
                .unwrap_or_default();
            let mut out = out.lock().map_err(|e| e.to_string())?;
            writeln!(out, "{text}").map_err(|e| e.to_string())
        },
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{interpret::Interpreter, types::Value};
    use lsf_syntax::parse;

    fn echo(source: &str) -> String {
        let out = Arc::new(Mutex::new(Vec::<u8>::new()));
        let mut registry = Registry::new();
        init_io(&mut registry, Arc::clone(&out));
        let mut interpreter = Interpreter::new(Arc::new(registry));
        interpreter.run_file(&parse(source).unwrap()).unwrap();
        let bytes = out.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn echo_prints() {
        assert_eq!(echo("echo \"hi \" + 2 * 3"), "hi 6\n");
        assert_eq!(echo("echo 13\necho true"), "13\ntrue\n");
    }

    #[test]
    fn echo_without_text() {
        assert_eq!(echo("echo"), "\n");
        assert_eq!(echo("echo $unset"), "\n");
    }

    #[test]
    fn echo_is_registered() {
        let mut registry = Registry::new();
        init(&mut registry);
        let echo = registry.get("echo").unwrap();
        assert_eq!(echo.required_count(), 0);
        assert!(echo.bind(vec![Value::Number(1.0)]).is_ok());
    }
}
