use std::fmt::Display;

use lsf_syntax::error::ParseError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorMsg {
    // Lookup errors
    CommandNotFound,
    FunctionNotFound,
    // Arity errors
    TooFewArgs,
    TooManyArgs,
    // Type errors
    InvalidOperator,
    CannotNegate,
    ConversionFailed,
    // Resource errors
    CallTooDeep,
    RepeatTooLarge,
    // Raised by a host command
    CommandFailed,
}

impl Display for ErrorMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::CommandNotFound => "command not found",
            Self::FunctionNotFound => "function not found",
            Self::TooFewArgs => "too few arguments",
            Self::TooManyArgs => "too many arguments",
            Self::InvalidOperator => "invalid operator",
            Self::CannotNegate => "cannot negate",
            Self::ConversionFailed => "cannot convert",
            Self::CallTooDeep => "call stack too deep",
            Self::RepeatTooLarge => "string repetition too large",
            Self::CommandFailed => "command failed",
        })
    }
}

/// A runtime failure together with the line of every statement it passed
/// through, innermost first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeError {
    pub msg: ErrorMsg,
    pub detail: String,
    pub trace: Vec<usize>,
}

impl RuntimeError {
    pub fn at_line(mut self, line: usize) -> Self {
        self.trace.push(line);
        self
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Runtime error: {}", self.msg)?;
        if !self.detail.is_empty() {
            write!(f, " {}", self.detail)?;
        }
        for line in &self.trace {
            write!(f, " at line {line}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RuntimeError {}

pub fn runtime_error(msg: ErrorMsg, detail: impl Display) -> RuntimeError {
    RuntimeError {
        msg,
        detail: detail.to_string(),
        trace: Vec::default(),
    }
}

/// Any failure of a whole `run`.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    Parse(ParseError),
    Runtime(RuntimeError),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{e}"),
            Self::Runtime(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<RuntimeError> for Error {
    fn from(e: RuntimeError) -> Self {
        Self::Runtime(e)
    }
}
