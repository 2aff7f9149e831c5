use crate::{
    error::{ErrorMsg, ParseError},
    token::{Lexeme, LexemeKind},
};

/// Which layout lexemes may be skipped before a take.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Skip {
    Nothing,
    Whitespace,
    Layout,
}

impl Skip {
    fn skips(&self, kind: LexemeKind) -> bool {
        match self {
            Self::Nothing => false,
            Self::Whitespace => kind == LexemeKind::Whitespace,
            Self::Layout => kind.is_layout(),
        }
    }
}

/// An index into a lexeme stream that can be rolled back to checkpoints.
///
/// The stream must end with `EndOfFile`; the index never moves past it.
#[derive(Debug)]
pub struct Cursor<'a> {
    lexemes: &'a [Lexeme],
    index: usize,
    checkpoints: Vec<usize>,
}

impl<'a> Cursor<'a> {
    pub fn new(lexemes: &'a [Lexeme]) -> Self {
        debug_assert!(lexemes.last().map_or(false, |l| l.is(LexemeKind::EndOfFile)));
        Self {
            lexemes,
            index: 0,
            checkpoints: Vec::default(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn peek(&self) -> &'a Lexeme {
        &self.lexemes[self.index]
    }

    /// Peeks past any lexemes matched by `skip`, without moving.
    pub fn peek_past(&self, skip: Skip) -> &'a Lexeme {
        let mut index = self.index;
        while skip.skips(self.lexemes[index].kind) && index < self.last() {
            index += 1;
        }
        &self.lexemes[index]
    }

    pub fn advance(&mut self) -> &'a Lexeme {
        let lexeme = self.peek();
        self.index = (self.index + 1).min(self.last());
        lexeme
    }

    pub fn is_at_end(&self) -> bool {
        self.peek().is(LexemeKind::EndOfFile)
    }

    pub fn push(&mut self) {
        self.checkpoints.push(self.index);
    }

    /// Drops the latest checkpoint and keeps the current position.
    pub fn commit(&mut self) {
        self.checkpoints.pop();
    }

    /// Returns to the latest checkpoint and drops it.
    pub fn pop(&mut self) {
        if let Some(index) = self.checkpoints.pop() {
            self.index = index;
        }
    }

    pub fn skip(&mut self, skip: Skip) {
        while skip.skips(self.peek().kind) {
            self.advance();
        }
    }

    /// Consumes a lexeme of `kind`, skipping layout first as requested. On a
    /// mismatch nothing is consumed.
    pub fn try_take(&mut self, kind: LexemeKind, skip: Skip) -> Option<&'a Lexeme> {
        self.try_take_if(|l| l.is(kind), skip)
    }

    pub fn try_take_if<F>(&mut self, cond: F, skip: Skip) -> Option<&'a Lexeme>
    where
        F: FnOnce(&Lexeme) -> bool,
    {
        self.push();
        self.skip(skip);
        if cond(self.peek()) {
            self.commit();
            Some(self.advance())
        } else {
            self.pop();
            None
        }
    }

    /// Like `try_take`, but a mismatch is a parse error naming the expected
    /// and found lexemes.
    pub fn take(&mut self, kind: LexemeKind, skip: Skip) -> Result<&'a Lexeme, ParseError> {
        self.try_take(kind, skip).ok_or_else(|| {
            ParseError::new(ErrorMsg::Expected(kind.to_string()), self.peek_past(skip))
        })
    }

    fn last(&self) -> usize {
        self.lexemes.len() - 1
    }
}
