use std::fmt::Display;

use crate::token::{Lexeme, SourceLocation};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorMsg {
    // Lexical errors surfaced by the parser
    InvalidString,
    UnterminatedString,
    // Parse errors
    Expected(String),
    ExpectedExpression,
    ExpectedStatement,
    ExpectedIdent,
    NestedFunction,
    InvalidOperatorChain,
    MissingTerminator,
    TooDeep,
}

impl Display for ErrorMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidString => f.write_str("invalid string"),
            Self::UnterminatedString => f.write_str("unterminated string"),
            Self::Expected(what) => write!(f, "expected {what}"),
            Self::ExpectedExpression => f.write_str("expected expression"),
            Self::ExpectedStatement => f.write_str("expected statement"),
            Self::ExpectedIdent => f.write_str("expected identifier"),
            Self::NestedFunction => f.write_str("functions cannot be declared inside functions"),
            Self::InvalidOperatorChain => f.write_str("invalid operator chain"),
            Self::MissingTerminator => f.write_str("expected end of statement"),
            Self::TooDeep => f.write_str("expression nested too deeply"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub msg: ErrorMsg,
    pub location: SourceLocation,
    pub found: String,
}

impl ParseError {
    pub fn new(msg: ErrorMsg, lexeme: &Lexeme) -> Self {
        Self {
            msg,
            location: lexeme.begin,
            found: lexeme.to_string(),
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Parse error at {}: {}, found {}",
            self.location, self.msg, self.found
        )
    }
}

impl std::error::Error for ParseError {}
