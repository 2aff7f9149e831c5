use std::fmt::Display;

/// A 1-based line and column pair, counted in characters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LexemeKind {
    // Words
    Keyword,
    String,
    QuotedString,
    // Layout
    Whitespace,
    NewLine,
    Hashtag,
    // Operators
    Exclamation,
    Plus,
    Minus,
    Multiply,
    Divide,
    Equals,
    // Symbols
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Semicolon,
    EndOfFile,
}

impl LexemeKind {
    pub fn from_char(c: char) -> Option<Self> {
        let kind = match c {
            '!' => Self::Exclamation,
            '+' => Self::Plus,
            '-' => Self::Minus,
            '*' => Self::Multiply,
            '/' => Self::Divide,
            '=' => Self::Equals,
            '(' => Self::LeftParen,
            ')' => Self::RightParen,
            '{' => Self::LeftBrace,
            '}' => Self::RightBrace,
            ',' => Self::Comma,
            ';' => Self::Semicolon,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_keyword(word: &str) -> bool {
        matches!(word, "function" | "true" | "false")
    }

    /// Whitespace and newlines, which the parser skips on request.
    pub fn is_layout(&self) -> bool {
        matches!(self, Self::Whitespace | Self::NewLine)
    }
}

impl Display for LexemeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Keyword => "keyword",
            Self::String => "word",
            Self::QuotedString => "quoted string",
            Self::Whitespace => "whitespace",
            Self::NewLine => "newline",
            Self::Hashtag => "comment",
            Self::Exclamation => "`!`",
            Self::Plus => "`+`",
            Self::Minus => "`-`",
            Self::Multiply => "`*`",
            Self::Divide => "`/`",
            Self::Equals => "`=`",
            Self::LeftParen => "`(`",
            Self::RightParen => "`)`",
            Self::LeftBrace => "`{`",
            Self::RightBrace => "`}`",
            Self::Comma => "`,`",
            Self::Semicolon => "`;`",
            Self::EndOfFile => "end of file",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lexeme {
    pub kind: LexemeKind,
    pub content: String,
    pub begin: SourceLocation,
    pub end: SourceLocation,
}

impl Display for Lexeme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            LexemeKind::EndOfFile => f.write_str("end of file"),
            LexemeKind::NewLine => f.write_str("newline"),
            _ => write!(f, "`{}`", self.content),
        }
    }
}

impl Lexeme {
    pub fn new(
        kind: LexemeKind,
        content: String,
        begin: SourceLocation,
        end: SourceLocation,
    ) -> Self {
        Self {
            kind,
            content,
            begin,
            end,
        }
    }

    pub fn is(&self, kind: LexemeKind) -> bool {
        self.kind == kind
    }
}
