use std::fmt::Display;

use lsf_syntax::ast::{Literal, Parameter, Statement};

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    Number(f64),
    Str(String),
    Boolean(bool),
    #[default]
    Null,
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Null => Ok(()),
        }
    }
}

impl From<Literal> for Value {
    fn from(lit: Literal) -> Self {
        match lit {
            Literal::Number(n) => Self::Number(n),
            Literal::Str(s) => Self::Str(s),
            Literal::Boolean(b) => Self::Boolean(b),
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::Null => "null",
        }
    }
}

/// A script function, stored in the frame that declared it.
#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<Parameter>,
    pub body: Vec<Statement>,
}

impl Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params = self
            .params
            .iter()
            .map(Parameter::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "function {}({})", self.name, params)
    }
}

impl Function {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}
