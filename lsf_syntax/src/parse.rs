use log::trace;

use crate::{
    ast::{BinOp, Expr, File, Literal, Parameter, Statement, StatementKind, UnaryOp},
    cursor::{Cursor, Skip},
    error::{ErrorMsg, ParseError},
    lex,
    token::{Lexeme, LexemeKind},
};

/// Expressions nested deeper than this are rejected, which bounds the
/// recursion of everything that walks the tree.
pub const MAX_DEPTH: usize = 256;

/// One element of an operator chain before precedence is applied.
#[derive(Debug)]
enum Link {
    Operand(Expr),
    Operator(BinOp),
}

#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    in_function: bool,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// `lexemes` must be the output of `Lexer::lex_all`, ending in `EndOfFile`.
    pub fn new(lexemes: &'a [Lexeme]) -> Self {
        Self {
            cursor: Cursor::new(lexemes),
            in_function: false,
            depth: 0,
        }
    }

    pub fn parse_all(mut self) -> Result<File, ParseError> {
        let statements = self.parse_statements(false)?;
        trace!("Parsed {} top-level statements", statements.len());
        Ok(File { statements })
    }

    /// Parses statements until the end of file, or until a closing brace
    /// when parsing a function body. The brace is left in the stream.
    fn parse_statements(&mut self, in_block: bool) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::default();
        loop {
            self.cursor.skip(Skip::Layout);
            if self.cursor.try_take(LexemeKind::Semicolon, Skip::Nothing).is_some() {
                continue;
            }
            let lexeme = self.cursor.peek();
            match lexeme.kind {
                LexemeKind::EndOfFile if in_block => {
                    return Err(ParseError::new(
                        ErrorMsg::Expected(LexemeKind::RightBrace.to_string()),
                        lexeme,
                    ))
                }
                LexemeKind::EndOfFile => break,
                LexemeKind::RightBrace if in_block => break,
                _ => {
                    if let Some(stmt) = self.parse_statement()? {
                        statements.push(stmt);
                    }
                }
            }
        }
        Ok(statements)
    }

    /// Returns `None` for comments, which are dropped from the tree.
    fn parse_statement(&mut self) -> Result<Option<Statement>, ParseError> {
        let lexeme = self.cursor.peek();
        let location = lexeme.begin;
        let kind = match lexeme.kind {
            LexemeKind::Hashtag => {
                self.cursor.advance();
                return Ok(None);
            }
            LexemeKind::Keyword if lexeme.content == "function" => self.parse_function()?,
            LexemeKind::Exclamation => self.parse_expr_stmt()?,
            LexemeKind::String if lexeme.content.starts_with('$') => self.parse_expr_stmt()?,
            LexemeKind::String => self.parse_command()?,
            _ => return Err(ParseError::new(ErrorMsg::ExpectedStatement, lexeme)),
        };
        Ok(Some(Statement { kind, location }))
    }

    fn parse_function(&mut self) -> Result<StatementKind, ParseError> {
        // Consume the `function` keyword
        let keyword = self.cursor.advance();
        if self.in_function {
            return Err(ParseError::new(ErrorMsg::NestedFunction, keyword));
        }
        let name = self.take_ident(Skip::Whitespace)?;
        self.cursor.take(LexemeKind::LeftParen, Skip::Whitespace)?;
        let mut params = vec![];
        if self
            .cursor
            .try_take(LexemeKind::RightParen, Skip::Layout)
            .is_none()
        {
            loop {
                let ty = self.take_ident(Skip::Layout)?;
                let name = self.take_ident(Skip::Layout)?;
                params.push(Parameter {
                    ty,
                    name: name.trim_start_matches('$').to_string(),
                });
                if self
                    .cursor
                    .try_take(LexemeKind::Comma, Skip::Layout)
                    .is_none()
                {
                    break;
                }
            }
            self.cursor.take(LexemeKind::RightParen, Skip::Layout)?;
        }
        self.cursor.take(LexemeKind::LeftBrace, Skip::Layout)?;

        self.in_function = true;
        let body = self.parse_statements(true);
        self.in_function = false;
        let body = body?;
        self.cursor.take(LexemeKind::RightBrace, Skip::Nothing)?;

        Ok(StatementKind::FunctionDeclaration { name, params, body })
    }

    fn parse_command(&mut self) -> Result<StatementKind, ParseError> {
        let name = self.cursor.advance().content.clone();
        let args = self.parse_args()?;
        self.end_statement()?;
        Ok(StatementKind::Command { name, args })
    }

    fn parse_expr_stmt(&mut self) -> Result<StatementKind, ParseError> {
        let expr = self.parse_expr()?;
        self.end_statement()?;
        Ok(StatementKind::Expression(expr))
    }

    /// A statement ends at `;`, a newline, a trailing comment or the end of
    /// file. A closing brace also ends it but stays in the stream.
    fn end_statement(&mut self) -> Result<(), ParseError> {
        self.cursor.skip(Skip::Whitespace);
        let lexeme = self.cursor.peek();
        match lexeme.kind {
            LexemeKind::Semicolon | LexemeKind::NewLine | LexemeKind::Hashtag => {
                self.cursor.advance();
                Ok(())
            }
            LexemeKind::EndOfFile | LexemeKind::RightBrace => Ok(()),
            _ => Err(ParseError::new(ErrorMsg::MissingTerminator, lexeme)),
        }
    }

    /// Parses expressions on the current line until one fails to start.
    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = vec![];
        loop {
            self.cursor.push();
            self.cursor.skip(Skip::Whitespace);
            if !args.is_empty() {
                self.cursor.try_take(LexemeKind::Comma, Skip::Nothing);
                self.cursor.skip(Skip::Whitespace);
            }
            match self.try_parse_expr()? {
                Some(expr) => {
                    self.cursor.commit();
                    args.push(expr);
                }
                None => {
                    self.cursor.pop();
                    break;
                }
            }
        }
        Ok(args)
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        match self.try_parse_expr()? {
            Some(expr) => Ok(expr),
            None => Err(ParseError::new(
                ErrorMsg::ExpectedExpression,
                self.cursor.peek(),
            )),
        }
    }

    /// Parses a primary expression followed by any operator chain. Returns
    /// `None` without consuming anything if no expression starts here.
    fn try_parse_expr(&mut self) -> Result<Option<Expr>, ParseError> {
        let start = self.cursor.peek();
        let Some(first) = self.parse_primary()? else {
            return Ok(None);
        };
        let mut chain = vec![Link::Operand(first)];
        while let Some(op) = self.cursor.try_take_if(
            |l| BinOp::from_lexeme(l.kind).is_some(),
            Skip::Whitespace,
        ) {
            // Each operator adds a level to the resolved tree
            if chain.len() / 2 >= MAX_DEPTH {
                return Err(ParseError::new(ErrorMsg::TooDeep, op));
            }
            self.cursor.skip(Skip::Whitespace);
            let Some(rhs) = self.parse_primary()? else {
                return Err(ParseError::new(
                    ErrorMsg::ExpectedExpression,
                    self.cursor.peek(),
                ));
            };
            // Infallible as the lexeme kind is checked above
            if let Some(op) = BinOp::from_lexeme(op.kind) {
                chain.push(Link::Operator(op));
            }
            chain.push(Link::Operand(rhs));
        }
        let expr = resolve_chain(chain, start)?;
        if expr.depth() > MAX_DEPTH {
            return Err(ParseError::new(ErrorMsg::TooDeep, start));
        }
        Ok(Some(expr))
    }

    /// Every nested expression passes through here, so this is where the
    /// nesting depth is tracked.
    fn parse_primary(&mut self) -> Result<Option<Expr>, ParseError> {
        let lexeme = self.cursor.peek();
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::new(ErrorMsg::TooDeep, lexeme));
        }
        self.depth += 1;
        let res = self.parse_nested(lexeme);
        self.depth -= 1;
        res
    }

    fn parse_nested(&mut self, lexeme: &'a Lexeme) -> Result<Option<Expr>, ParseError> {
        let expr = match lexeme.kind {
            LexemeKind::LeftParen => {
                self.cursor.advance();
                self.cursor.skip(Skip::Whitespace);
                let expr = self.parse_expr()?;
                self.cursor.take(LexemeKind::RightParen, Skip::Whitespace)?;
                expr
            }
            LexemeKind::QuotedString => {
                self.cursor.advance();
                match lex::unquote(&lexeme.content) {
                    Some(s) => Expr::Literal(Literal::Str(s)),
                    None => return Err(ParseError::new(ErrorMsg::UnterminatedString, lexeme)),
                }
            }
            LexemeKind::Keyword => {
                let value = match lexeme.content.as_str() {
                    "true" => true,
                    "false" => false,
                    _ => return Err(ParseError::new(ErrorMsg::ExpectedExpression, lexeme)),
                };
                self.cursor.advance();
                Expr::Literal(Literal::Boolean(value))
            }
            LexemeKind::String => {
                self.cursor.advance();
                self.parse_word(lexeme)?
            }
            LexemeKind::Exclamation => {
                self.cursor.advance();
                self.parse_call_or_negation()?
            }
            LexemeKind::Minus => match self.negative_number() {
                Some(n) => Expr::Literal(Literal::Number(n)),
                None => return Ok(None),
            },
            _ => return Ok(None),
        };
        Ok(Some(expr))
    }

    /// Numbers first, then `$name` references. Any other word is invalid in
    /// expression position.
    fn parse_word(&mut self, lexeme: &Lexeme) -> Result<Expr, ParseError> {
        if let Some(n) = parse_number(&lexeme.content) {
            return Ok(Expr::Literal(Literal::Number(n)));
        }
        let Some(name) = variable_name(&lexeme.content) else {
            return Err(ParseError::new(ErrorMsg::InvalidString, lexeme));
        };
        if self
            .cursor
            .try_take(LexemeKind::Equals, Skip::Whitespace)
            .is_some()
        {
            self.cursor.skip(Skip::Whitespace);
            let value = self.parse_expr()?;
            return Ok(Expr::Assignment {
                name: name.to_string(),
                value: Box::new(value),
            });
        }
        Ok(Expr::Variable(name.to_string()))
    }

    /// `!name args..` calls a function, `!` before anything else negates it.
    fn parse_call_or_negation(&mut self) -> Result<Expr, ParseError> {
        let lexeme = self.cursor.peek();
        if lexeme.is(LexemeKind::String) && is_name(&lexeme.content) {
            self.cursor.advance();
            let args = self.parse_args()?;
            return Ok(Expr::Call {
                name: lexeme.content.clone(),
                args,
            });
        }
        match self.parse_primary()? {
            Some(expr) => Ok(Expr::Unary {
                op: UnaryOp::Negate,
                expr: Box::new(expr),
            }),
            None => Err(ParseError::new(ErrorMsg::ExpectedExpression, lexeme)),
        }
    }

    /// Consumes `-` directly followed by a number, with nothing in between.
    fn negative_number(&mut self) -> Option<f64> {
        self.cursor.push();
        self.cursor.advance();
        let number = self
            .cursor
            .try_take_if(
                |l| l.is(LexemeKind::String) && parse_number(&l.content).is_some(),
                Skip::Nothing,
            )
            .and_then(|l| parse_number(&l.content));
        match number {
            Some(n) => {
                self.cursor.commit();
                Some(-n)
            }
            None => {
                self.cursor.pop();
                None
            }
        }
    }

    fn take_ident(&mut self, skip: Skip) -> Result<String, ParseError> {
        let lexeme = self.cursor.peek_past(skip);
        self.cursor
            .try_take_if(|l| l.is(LexemeKind::String), skip)
            .map(|l| l.content.clone())
            .ok_or_else(|| ParseError::new(ErrorMsg::ExpectedIdent, lexeme))
    }
}

/// Collapses a flat operand/operator chain into a tree. Tiers are applied
/// from the tightest binding one down, each scanned left to right, which
/// makes every operator left-associative within its tier.
fn resolve_chain(mut chain: Vec<Link>, start: &Lexeme) -> Result<Expr, ParseError> {
    let invalid = || ParseError::new(ErrorMsg::InvalidOperatorChain, start);
    for tier in (0..=BinOp::MAX_PRECEDENCE).rev() {
        let mut i = 0;
        while i < chain.len() {
            if !matches!(&chain[i], Link::Operator(op) if op.precedence() == tier) {
                i += 1;
                continue;
            }
            if i == 0 || i + 1 >= chain.len() {
                return Err(invalid());
            }
            let node = {
                let mut parts = chain.drain(i - 1..=i + 1);
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(Link::Operand(lhs)), Some(Link::Operator(op)), Some(Link::Operand(rhs))) => {
                        Expr::Binary {
                            lhs: Box::new(lhs),
                            op,
                            rhs: Box::new(rhs),
                        }
                    }
                    _ => return Err(invalid()),
                }
            };
            // The next operator now sits at `i`
            chain.insert(i - 1, Link::Operand(node));
        }
    }
    match (chain.pop(), chain.is_empty()) {
        (Some(Link::Operand(expr)), true) => Ok(expr),
        _ => Err(invalid()),
    }
}

/// Culture-independent decimal parse. Words such as `inf` or `nan` are not
/// numbers here.
fn parse_number(word: &str) -> Option<f64> {
    word.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        .then(|| word.parse().ok())
        .flatten()
}

fn variable_name(word: &str) -> Option<&str> {
    word.strip_prefix('$').filter(|name| !name.is_empty())
}

fn is_name(word: &str) -> bool {
    !word.starts_with('$') && parse_number(word).is_none()
}
