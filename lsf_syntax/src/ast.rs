use std::fmt::Display;

use crate::token::{LexemeKind, SourceLocation};

#[derive(Clone, Debug, PartialEq)]
pub struct File {
    pub statements: Vec<Statement>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub location: SourceLocation,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StatementKind {
    Command {
        name: String,
        args: Vec<Expr>,
    },
    Expression(Expr),
    FunctionDeclaration {
        name: String,
        params: Vec<Parameter>,
        body: Vec<Statement>,
    },
}

/// A declared parameter of a script function. The type name is kept for
/// display only, calls are checked for arity alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameter {
    pub ty: String,
    pub name: String,
}

impl Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.ty, self.name)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Negate => "!",
        })
    }
}

/// Binary operators, declared from the loosest to the tightest binding tier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum BinOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
        })
    }
}

impl BinOp {
    pub const MAX_PRECEDENCE: u8 = 1;

    pub fn from_lexeme(kind: LexemeKind) -> Option<Self> {
        let op = match kind {
            LexemeKind::Plus => Self::Add,
            LexemeKind::Minus => Self::Subtract,
            LexemeKind::Multiply => Self::Multiply,
            LexemeKind::Divide => Self::Divide,
            _ => return None,
        };
        Some(op)
    }

    pub fn precedence(&self) -> u8 {
        match self {
            Self::Add | Self::Subtract => 0,
            Self::Multiply | Self::Divide => 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Number(f64),
    Str(String),
    Boolean(bool),
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Str(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            }
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Variable(String),
    Assignment {
        name: String,
        value: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        lhs: Box<Expr>,
        op: BinOp,
        rhs: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// The number of nodes on the longest path from this node to a leaf.
    pub fn depth(&self) -> usize {
        match self {
            Self::Literal(_) | Self::Variable(_) => 1,
            Self::Assignment { value: expr, .. } | Self::Unary { expr, .. } => 1 + expr.depth(),
            Self::Binary { lhs, rhs, .. } => 1 + lhs.depth().max(rhs.depth()),
            Self::Call { args, .. } => 1 + args.iter().map(Expr::depth).max().unwrap_or(0),
        }
    }
}

/// Renders the expression with every operator application parenthesised,
/// which makes the shape of the tree visible.
impl Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(lit) => write!(f, "{lit}"),
            Self::Variable(name) => write!(f, "${name}"),
            Self::Assignment { name, value } => write!(f, "(${name} = {value})"),
            Self::Unary { op, expr } => write!(f, "({op}{expr})"),
            Self::Binary { lhs, op, rhs } => write!(f, "({lhs} {op} {rhs})"),
            Self::Call { name, args } => {
                write!(f, "(!{name}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            StatementKind::Command { name, args } => {
                f.write_str(name)?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                Ok(())
            }
            // Statement-level assignments and calls are written bare
            StatementKind::Expression(Expr::Assignment { name, value }) => {
                write!(f, "${name} = {value}")
            }
            StatementKind::Expression(Expr::Call { name, args }) => {
                write!(f, "!{name}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                Ok(())
            }
            StatementKind::Expression(expr) => write!(f, "{expr}"),
            StatementKind::FunctionDeclaration { name, params, body } => {
                let params = params
                    .iter()
                    .map(Parameter::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                writeln!(f, "function {name}({params}) {{")?;
                for stmt in body {
                    writeln!(f, "    {stmt}")?;
                }
                f.write_str("}")
            }
        }
    }
}
