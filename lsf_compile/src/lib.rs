pub mod command;
pub mod environment;
pub mod error;
pub mod interpret;
pub mod stdlib;
pub mod types;

use crate::error::Error;
use interpret::Interpreter;
use log::trace;

/// Parses and runs a script in a fresh frame.
pub fn run(source: &str, interpreter: &mut Interpreter) -> Result<(), Error> {
    let file = lsf_syntax::parse(source)?;
    trace!("Running {file:#?}");
    interpreter.run_file(&file)?;
    Ok(())
}

/// Parses and runs input in the interpreter's current frame, keeping the
/// variables and functions it defines for later input.
pub fn run_session(source: &str, interpreter: &mut Interpreter) -> Result<(), Error> {
    let file = lsf_syntax::parse(source)?;
    trace!("Running {file:#?} in session");
    interpreter.interpret_all(&file.statements)?;
    Ok(())
}
