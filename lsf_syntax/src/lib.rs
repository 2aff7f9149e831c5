pub mod ast;
pub mod cursor;
pub mod error;
pub mod lex;
pub mod parse;
pub mod token;

use ast::File;
use error::ParseError;
use lex::Lexer;
use log::trace;
use parse::Parser;

/// Lexes and parses a whole script.
pub fn parse(source: &str) -> Result<File, ParseError> {
    trace!("Lexing {source:?}");
    let lexemes = Lexer::new(source).lex_all();
    trace!("Parsing {lexemes:#?}");
    Parser::new(&lexemes).parse_all()
}
