use crate::token::{Lexeme, LexemeKind, SourceLocation};
use log::trace;
use std::{iter::Peekable, str::Chars};

#[derive(Debug)]
pub struct Lexer<'a> {
    stream: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    start: SourceLocation,
    content: String,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            stream: source.chars().peekable(),
            line: 1,
            column: 1,
            start: SourceLocation::new(1, 1),
            content: String::default(),
        }
    }

    /// Lexes the whole source. The result always ends with a single
    /// `EndOfFile` lexeme.
    pub fn lex_all(mut self) -> Vec<Lexeme> {
        let mut lexemes = Vec::default();
        loop {
            let lexeme = self.lex();
            let done = lexeme.is(LexemeKind::EndOfFile);
            lexemes.push(lexeme);
            if done {
                break;
            }
        }
        trace!("Lexed {} lexemes", lexemes.len());
        lexemes
    }

    pub fn lex(&mut self) -> Lexeme {
        self.start = self.location();
        self.content.clear();
        let Some(c) = self.advance() else {
            return self.make_lexeme(LexemeKind::EndOfFile);
        };
        match c {
            '\n' => self.make_lexeme(LexemeKind::NewLine),
            '\r' if self.advance_if(|c| c == '\n').is_some() => {
                self.make_lexeme(LexemeKind::NewLine)
            }
            '#' => {
                self.advance_while(|c| c != '\n' && c != '\r');
                self.make_lexeme(LexemeKind::Hashtag)
            }
            '"' => self.lex_quoted(),
            c if is_space(c) => {
                self.advance_while(is_space);
                self.make_lexeme(LexemeKind::Whitespace)
            }
            c => match LexemeKind::from_char(c) {
                Some(kind) => self.make_lexeme(kind),
                None => self.lex_word(),
            },
        }
    }

    fn lex_word(&mut self) -> Lexeme {
        self.advance_while(is_word);
        if LexemeKind::is_keyword(&self.content) {
            self.make_lexeme(LexemeKind::Keyword)
        } else {
            self.make_lexeme(LexemeKind::String)
        }
    }

    fn lex_quoted(&mut self) -> Lexeme {
        // The opening quote is already consumed. Stop at the closing quote,
        // or before the end of the line if the string is unterminated.
        while let Some(c) = self.advance_if(|c| c != '\n') {
            match c {
                '\\' => {
                    self.advance_if(|c| c != '\n');
                }
                '"' => break,
                _ => (),
            }
        }
        self.make_lexeme(LexemeKind::QuotedString)
    }

    fn make_lexeme(&self, kind: LexemeKind) -> Lexeme {
        Lexeme::new(kind, self.content.clone(), self.start, self.location())
    }

    fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.stream.next()?;
        self.content.push(c);
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn advance_if<F>(&mut self, cond: F) -> Option<char>
    where
        F: FnOnce(char) -> bool,
    {
        if self.stream.peek().filter(|&&c| cond(c)).is_some() {
            self.advance()
        } else {
            None
        }
    }

    fn advance_while<F>(&mut self, cond: F) -> usize
    where
        F: Fn(char) -> bool,
    {
        let mut count: usize = 0;
        while self.advance_if(&cond).is_some() {
            count += 1;
        }
        count
    }
}

fn is_space(c: char) -> bool {
    c != '\n' && c.is_whitespace()
}

fn is_word(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '#' | '"') && LexemeKind::from_char(c).is_none()
}

/// Decodes the content of a `QuotedString` lexeme. Returns `None` if the
/// closing quote is missing.
///
/// Recognised escapes are `\"`, `\\`, `\n` and `\t`. Any other backslash
/// sequence is kept as written.
pub fn unquote(raw: &str) -> Option<String> {
    let inner = raw.strip_prefix('"')?;
    let mut chars = inner.chars();
    let mut out = String::with_capacity(inner.len());
    while let Some(c) = chars.next() {
        match c {
            '"' => return chars.next().is_none().then_some(out),
            '\\' => match chars.next() {
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => return None,
            },
            _ => out.push(c),
        }
    }
    None
}
