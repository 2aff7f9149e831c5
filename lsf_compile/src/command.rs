use std::{
    collections::BTreeMap,
    fmt::{Debug, Display},
    sync::Arc,
};

use log::debug;

use crate::{
    error::{runtime_error, ErrorMsg, RuntimeError},
    types::Value,
};

/// The type a command declares for one of its parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParamType {
    Number,
    Str,
    Boolean,
    Any,
}

impl Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Number => "number",
            Self::Str => "string",
            Self::Boolean => "boolean",
            Self::Any => "any",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandParam {
    pub name: String,
    pub ty: ParamType,
    pub required: bool,
}

impl CommandParam {
    pub fn required(name: &str, ty: ParamType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            required: true,
        }
    }

    pub fn optional(name: &str, ty: ParamType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            required: false,
        }
    }
}

impl Display for CommandParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.required {
            write!(f, "<{}: {}>", self.name, self.ty)
        } else {
            write!(f, "[{}: {}]", self.name, self.ty)
        }
    }
}

/// A bound argument. Optional parameters that were not supplied are
/// `Missing`, which is distinct from a supplied null.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    Value(Value),
    Missing,
}

impl Arg {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Missing => None,
        }
    }
}

pub type CommandFn = Arc<dyn Fn(&[Arg]) -> Result<(), String> + Send + Sync>;

#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub description: String,
    pub params: Vec<CommandParam>,
    pub body: CommandFn,
}

impl Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        for param in &self.params {
            write!(f, " {param}")?;
        }
        if !self.description.is_empty() {
            write!(f, " - {}", self.description)?;
        }
        Ok(())
    }
}

impl Command {
    pub fn new<F>(name: &str, description: &str, params: Vec<CommandParam>, body: F) -> Self
    where
        F: Fn(&[Arg]) -> Result<(), String> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            params,
            body: Arc::new(body),
        }
    }

    pub fn required_count(&self) -> usize {
        self.params.iter().filter(|p| p.required).count()
    }

    /// Checks the argument count and converts every value to the type of
    /// its parameter. Unsupplied optional parameters become `Arg::Missing`.
    pub fn bind(&self, values: Vec<Value>) -> Result<Vec<Arg>, RuntimeError> {
        let count = values.len();
        if count < self.required_count() {
            return Err(runtime_error(
                ErrorMsg::TooFewArgs,
                format!(
                    "for `{}`: {} supplied, {} required",
                    self.name,
                    count,
                    self.required_count()
                ),
            ));
        }
        if count > self.params.len() {
            return Err(runtime_error(
                ErrorMsg::TooManyArgs,
                format!(
                    "for `{}`: {} supplied, at most {} accepted",
                    self.name,
                    count,
                    self.params.len()
                ),
            ));
        }
        let mut args = values
            .into_iter()
            .zip(&self.params)
            .map(|(value, param)| convert(value, param).map(Arg::Value))
            .collect::<Result<Vec<_>, _>>()?;
        args.resize(self.params.len(), Arg::Missing);
        Ok(args)
    }

    pub fn invoke(&self, values: Vec<Value>) -> Result<(), RuntimeError> {
        let args = self.bind(values)?;
        debug!("Invoke {} with {args:?}", self.name);
        (self.body)(args.as_slice())
            .map_err(|e| runtime_error(ErrorMsg::CommandFailed, format!("`{}`: {e}", self.name)))
    }
}

fn convert(value: Value, param: &CommandParam) -> Result<Value, RuntimeError> {
    let converted = match (param.ty, value) {
        (ParamType::Any, value) => Some(value),
        // Null becomes an empty string, anything else is stringified
        (ParamType::Str, value) => Some(Value::Str(value.to_string())),
        (ParamType::Number, Value::Number(n)) => Some(Value::Number(n)),
        (ParamType::Number, Value::Str(s)) => s.trim().parse().ok().map(Value::Number),
        (ParamType::Number, Value::Boolean(b)) => Some(Value::Number(if b { 1.0 } else { 0.0 })),
        (ParamType::Boolean, Value::Boolean(b)) => Some(Value::Boolean(b)),
        (ParamType::Boolean, Value::Str(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Value::Boolean(true)),
            "false" => Some(Value::Boolean(false)),
            _ => None,
        },
        (ParamType::Boolean, Value::Number(n)) => Some(Value::Boolean(n != 0.0)),
        (ParamType::Number | ParamType::Boolean, Value::Null) => None,
    };
    converted.ok_or_else(|| {
        runtime_error(
            ErrorMsg::ConversionFailed,
            format!("argument `{}` to {}", param.name, param.ty),
        )
    })
}

/// Resolves command names for the interpreter.
pub trait CommandResolver {
    fn resolve(&self, name: &str) -> Option<&Command>;
}

impl<T: CommandResolver + ?Sized> CommandResolver for Arc<T> {
    fn resolve(&self, name: &str) -> Option<&Command> {
        (**self).resolve(name)
    }
}

/// A registration table filled by the host at startup.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    commands: BTreeMap<String, Command>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command, replacing any previous one of the same name.
    pub fn register(&mut self, command: Command) -> Option<Command> {
        debug!("Register {command}");
        self.commands.insert(command.name.clone(), command)
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// One line per command, sorted by name.
    pub fn usage(&self) -> String {
        self.commands
            .values()
            .map(Command::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl CommandResolver for Registry {
    fn resolve(&self, name: &str) -> Option<&Command> {
        self.get(name)
    }
}
