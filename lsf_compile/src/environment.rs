use std::collections::HashMap;

use log::debug;

use crate::types::{Function, Value};

/// One scope frame, created for a script run or a function call.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunContext {
    variables: HashMap<String, Value>,
    functions: HashMap<String, Function>,
}

impl RunContext {
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }
}

/// The frames of one interpreter, innermost last.
///
/// Lookups search every frame from the innermost outwards, so a function
/// body sees the variables of whoever called it. Writes always go to the
/// innermost frame and disappear when it is popped.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ContextStack {
    frames: Vec<RunContext>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push(&mut self) {
        self.frames.push(RunContext::default());
        debug!("Push frame {}", self.frames.len());
    }

    pub fn pop(&mut self) -> Option<RunContext> {
        debug!("Pop frame {}", self.frames.len());
        self.frames.pop()
    }

    /// Returns `Value::Null` for names that are not set anywhere.
    pub fn get(&self, name: &str) -> Value {
        debug!("Get {name}");
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.variable(name))
            .cloned()
            .unwrap_or_default()
    }

    pub fn set(&mut self, name: &str, value: Value) {
        debug!("Set {name} -> {value:?}");
        self.current().variables.insert(name.to_string(), value);
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        debug!("Get function {name}");
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.function(name))
    }

    pub fn declare_function(&mut self, func: Function) {
        debug!("Declare {func}");
        self.current().functions.insert(func.name.clone(), func);
    }

    /// Pushes the root frame if there is no frame yet.
    pub fn ensure_root(&mut self) {
        if self.frames.is_empty() {
            self.push();
        }
    }

    fn current(&mut self) -> &mut RunContext {
        self.ensure_root();
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variable_is_null() {
        let stack = ContextStack::new();
        assert_eq!(stack.get("nope"), Value::Null);
    }

    #[test]
    fn inner_frames_see_outer_variables() {
        let mut stack = ContextStack::new();
        stack.push();
        stack.set("x", Value::Number(1.0));
        stack.push();
        assert_eq!(stack.get("x"), Value::Number(1.0));
    }

    #[test]
    fn inner_frames_shadow_and_vanish() {
        let mut stack = ContextStack::new();
        stack.push();
        stack.set("x", Value::Number(1.0));
        stack.push();
        stack.set("x", Value::Number(2.0));
        stack.set("y", Value::Boolean(true));
        assert_eq!(stack.get("x"), Value::Number(2.0));
        stack.pop();
        assert_eq!(stack.get("x"), Value::Number(1.0));
        assert_eq!(stack.get("y"), Value::Null);
    }

    #[test]
    fn redeclaring_overwrites_in_same_frame() {
        let mut stack = ContextStack::new();
        stack.push();
        let func = |n: usize| Function {
            name: "f".to_string(),
            params: vec![
                lsf_syntax::ast::Parameter {
                    ty: "number".to_string(),
                    name: "a".to_string(),
                };
                n
            ],
            body: vec![],
        };
        stack.declare_function(func(0));
        stack.declare_function(func(2));
        assert_eq!(stack.get_function("f").map(Function::arity), Some(2));
        stack.push();
        assert!(stack.get_function("f").is_some());
        stack.pop();
        stack.pop();
        assert!(stack.get_function("f").is_none());
    }

    #[test]
    fn set_without_frames_creates_root() {
        let mut stack = ContextStack::new();
        stack.set("x", Value::Str("a".to_string()));
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.get("x"), Value::Str("a".to_string()));
    }

    #[test]
    fn ensure_root_pushes_once() {
        let mut stack = ContextStack::new();
        stack.ensure_root();
        stack.ensure_root();
        assert_eq!(stack.depth(), 1);
    }
}
