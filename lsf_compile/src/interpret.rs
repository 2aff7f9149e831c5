use std::{cmp::Ordering, sync::Arc};

use log::{debug, trace};
use lsf_syntax::ast::{BinOp, Expr, File, Parameter, Statement, StatementKind, UnaryOp};

use crate::{
    command::{CommandResolver, Registry},
    environment::ContextStack,
    error::{runtime_error, ErrorMsg, RuntimeError},
    types::{Function, Value},
};

/// Nested function calls deeper than this fail instead of exhausting the
/// native stack.
pub const MAX_CALL_DEPTH: usize = 128;

/// The longest string, in bytes, that `*` may build.
pub const MAX_REPEAT_LEN: usize = 1 << 24;

pub struct Interpreter {
    pub contexts: ContextStack,
    commands: Arc<dyn CommandResolver + Send + Sync>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Arc::new(Registry::default()))
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("contexts", &self.contexts)
            .finish_non_exhaustive()
    }
}

impl Interpreter {
    pub fn new(commands: Arc<dyn CommandResolver + Send + Sync>) -> Self {
        Self {
            contexts: ContextStack::new(),
            commands,
        }
    }

    pub fn run_file(&mut self, file: &File) -> Result<(), RuntimeError> {
        self.run(&file.statements)
    }

    /// Runs statements in a fresh frame, which is popped again whether or
    /// not they succeed.
    pub fn run(&mut self, statements: &[Statement]) -> Result<(), RuntimeError> {
        self.contexts.push();
        let res = self.interpret_all(statements);
        self.contexts.pop();
        res
    }

    /// Runs statements in the current frame, so that whatever they set
    /// outlives the call. Used by interactive sessions.
    pub fn interpret_all(&mut self, statements: &[Statement]) -> Result<(), RuntimeError> {
        self.contexts.ensure_root();
        for stmt in statements {
            self.interpret(stmt)
                .map_err(|e| e.at_line(stmt.location.line))?;
        }
        Ok(())
    }

    pub fn interpret(&mut self, stmt: &Statement) -> Result<(), RuntimeError> {
        trace!("Interpreting {stmt}");
        match &stmt.kind {
            StatementKind::Command { name, args } => self.interpret_command(name, args),
            StatementKind::Expression(expr) => self.interpret_expr(expr).map(|_| ()),
            StatementKind::FunctionDeclaration { name, params, body } => {
                self.interpret_function(name, params, body);
                Ok(())
            }
        }
    }

    fn interpret_command(&mut self, name: &str, arg_exprs: &[Expr]) -> Result<(), RuntimeError> {
        let Some(command) = self.commands.resolve(name).cloned() else {
            return Err(runtime_error(ErrorMsg::CommandNotFound, format!("`{name}`")));
        };
        let mut args = Vec::with_capacity(arg_exprs.len());
        for arg in arg_exprs {
            args.push(self.interpret_expr(arg)?);
        }
        debug!("Dispatch {name} with {} arguments", args.len());
        command.invoke(args)
    }

    fn interpret_function(&mut self, name: &str, params: &[Parameter], body: &[Statement]) {
        self.contexts.declare_function(Function {
            name: name.to_string(),
            params: params.to_vec(),
            body: body.to_vec(),
        });
    }

    pub fn interpret_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(lit) => Ok(Value::from(lit.clone())),
            Expr::Variable(name) => Ok(self.contexts.get(name)),
            Expr::Assignment { name, value } => self.interpret_assignment(name, value),
            Expr::Unary { op, expr } => self.interpret_unary(*op, expr),
            Expr::Binary { lhs, op, rhs } => self.interpret_binary(lhs, *op, rhs),
            Expr::Call { name, args } => self.interpret_func_call(name, args),
        }
    }

    fn interpret_assignment(&mut self, name: &str, expr: &Expr) -> Result<Value, RuntimeError> {
        let value = self.interpret_expr(expr)?;
        self.contexts.set(name, value.clone());
        Ok(value)
    }

    fn interpret_unary(&mut self, op: UnaryOp, expr: &Expr) -> Result<Value, RuntimeError> {
        let value = self.interpret_expr(expr)?;
        match (op, value) {
            (UnaryOp::Negate, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
            (UnaryOp::Negate, other) => Err(runtime_error(
                ErrorMsg::CannotNegate,
                format!("a {}", other.type_name()),
            )),
        }
    }

    fn interpret_binary(&mut self, lhs: &Expr, op: BinOp, rhs: &Expr) -> Result<Value, RuntimeError> {
        let left = self.interpret_expr(lhs)?;
        let right = self.interpret_expr(rhs)?;
        apply_binary(left, op, right)
    }

    fn interpret_func_call(&mut self, name: &str, arg_exprs: &[Expr]) -> Result<Value, RuntimeError> {
        let Some(func) = self.contexts.get_function(name).cloned() else {
            return Err(runtime_error(ErrorMsg::FunctionNotFound, format!("`{name}`")));
        };
        // Ensure the number of arguments matches the function definition
        match func.arity().cmp(&arg_exprs.len()) {
            Ordering::Greater => {
                return Err(runtime_error(
                    ErrorMsg::TooFewArgs,
                    format!("for `{name}`: {} supplied, expected {}", arg_exprs.len(), func.arity()),
                ))
            }
            Ordering::Less => {
                return Err(runtime_error(
                    ErrorMsg::TooManyArgs,
                    format!("for `{name}`: {} supplied, expected {}", arg_exprs.len(), func.arity()),
                ))
            }
            Ordering::Equal => (),
        }
        if self.contexts.depth() > MAX_CALL_DEPTH {
            return Err(runtime_error(
                ErrorMsg::CallTooDeep,
                format!("calling `{name}`, limit is {MAX_CALL_DEPTH}"),
            ));
        }
        // Arguments are evaluated in the caller's frame
        let mut args = Vec::with_capacity(arg_exprs.len());
        for arg in arg_exprs {
            args.push(self.interpret_expr(arg)?);
        }

        debug!("Call {func}");
        self.contexts.push();
        for (param, value) in func.params.iter().zip(args) {
            self.contexts.set(&param.name, value);
        }
        let res = self.interpret_all(&func.body);
        // Restore the caller's frame
        self.contexts.pop();
        res.map(|()| Value::Null)
    }
}

pub fn apply_binary(left: Value, op: BinOp, right: Value) -> Result<Value, RuntimeError> {
    let value = match (left, op, right) {
        (Value::Str(l), BinOp::Add, r) => Value::Str(l + &r.to_string()),
        (Value::Str(l), BinOp::Multiply, Value::Number(n)) => Value::Str(repeat(&l, n)?),
        (l, BinOp::Add, Value::Str(r)) => Value::Str(l.to_string() + &r),
        (Value::Number(l), op, Value::Number(r)) => Value::Number(match op {
            BinOp::Add => l + r,
            BinOp::Subtract => l - r,
            BinOp::Multiply => l * r,
            BinOp::Divide => l / r,
        }),
        (l, op, r) => {
            return Err(runtime_error(
                ErrorMsg::InvalidOperator,
                format!("`{op}` between {} and {}", l.type_name(), r.type_name()),
            ))
        }
    };
    Ok(value)
}

/// Repeats `s` a truncated `count` times. Negative and NaN counts give an
/// empty string.
fn repeat(s: &str, count: f64) -> Result<String, RuntimeError> {
    let count = count.trunc();
    if s.is_empty() || count.is_nan() || count <= 0.0 {
        return Ok(String::new());
    }
    let too_large = || {
        runtime_error(
            ErrorMsg::RepeatTooLarge,
            format!("{} bytes times {count}, limit is {MAX_REPEAT_LEN}", s.len()),
        )
    };
    if count > MAX_REPEAT_LEN as f64 {
        return Err(too_large());
    }
    let count = count as usize;
    match s.len().checked_mul(count) {
        Some(len) if len <= MAX_REPEAT_LEN => Ok(s.repeat(count)),
        _ => Err(too_large()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Arg, Command, CommandParam, ParamType};
    use lsf_syntax::{ast::Literal, parse};
    use proptest::prelude::*;
    use std::sync::Mutex;

    /// An interpreter with a `log` command that records its argument.
    fn interpreter() -> (Interpreter, Arc<Mutex<Vec<Value>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut registry = Registry::new();
        registry.register(Command::new(
            "log",
            "",
            vec![CommandParam::optional("value", ParamType::Any)],
            move |args| {
                let value = args[0].value().cloned().unwrap_or(Value::Null);
                sink.lock().unwrap().push(value);
                Ok(())
            },
        ));
        registry.register(Command::new(
            "pair",
            "",
            vec![
                CommandParam::required("a", ParamType::Number),
                CommandParam::required("b", ParamType::Number),
                CommandParam::optional("label", ParamType::Str),
            ],
            |args| match &args[2] {
                Arg::Missing | Arg::Value(Value::Str(_)) => Ok(()),
                other => Err(format!("unexpected {other:?}")),
            },
        ));
        (Interpreter::new(Arc::new(registry)), seen)
    }

    fn run(source: &str) -> (Result<(), RuntimeError>, Vec<Value>) {
        let (mut interpreter, seen) = interpreter();
        let file = parse(source).unwrap();
        let res = interpreter.run_file(&file);
        assert_eq!(interpreter.contexts.depth(), 0);
        let values = seen.lock().unwrap().clone();
        (res, values)
    }

    fn logged(source: &str) -> Vec<Value> {
        let (res, values) = run(source);
        res.unwrap();
        values
    }

    fn eval(source: &str) -> Result<Value, RuntimeError> {
        let file = parse(&format!("$result = {source}")).unwrap();
        let StatementKind::Expression(expr) = &file.statements[0].kind else {
            panic!("expected an expression statement");
        };
        Interpreter::default().interpret_expr(expr)
    }

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    fn text(s: &str) -> Value {
        Value::Str(s.to_string())
    }

    #[test]
    fn literals() {
        let mut interpreter = Interpreter::default();
        let lit = |l| Expr::Literal(l);
        assert_eq!(
            interpreter.interpret_expr(&lit(Literal::Number(10.5))).unwrap(),
            num(10.5)
        );
        assert_eq!(
            interpreter
                .interpret_expr(&lit(Literal::Boolean(true)))
                .unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            interpreter
                .interpret_expr(&lit(Literal::Str("hello".to_string())))
                .unwrap(),
            text("hello")
        );
    }

    #[test]
    fn precedence() {
        assert_eq!(eval("2 + 4 * 3 - 1").unwrap(), num(13.0));
        assert_eq!(eval("(2 + 4) * 3").unwrap(), num(18.0));
    }

    #[test]
    fn associativity() {
        assert_eq!(eval("10 - 3 - 2").unwrap(), num(5.0));
        assert_eq!(eval("16 / 4 / 2").unwrap(), num(2.0));
    }

    #[test]
    fn string_operators() {
        assert_eq!(eval("\"ab\" * 3").unwrap(), text("ababab"));
        assert_eq!(eval("\"ab\" * 2.9").unwrap(), text("abab"));
        assert_eq!(eval("\"a\" + 1").unwrap(), text("a1"));
        assert_eq!(eval("1 + \"a\"").unwrap(), text("1a"));
        assert_eq!(eval("true + \"a\"").unwrap(), text("truea"));
        assert_eq!(eval("\"n=\" + 1.5").unwrap(), text("n=1.5"));
        assert_eq!(eval("\"ab\" * -1").unwrap(), text(""));
        assert_eq!(eval("\"ab\" * (0 / 0)").unwrap(), text(""));
    }

    #[test]
    fn huge_string_repetition_fails() {
        let too_large = |source| eval(source).unwrap_err().msg;
        assert_eq!(too_large("\"ab\" * 1e19"), ErrorMsg::RepeatTooLarge);
        assert_eq!(too_large("\"ab\" * 1e12"), ErrorMsg::RepeatTooLarge);
        assert_eq!(too_large("\"ab\" * (1 / 0)"), ErrorMsg::RepeatTooLarge);
        assert_eq!(too_large("\"ab\" * 8388609"), ErrorMsg::RepeatTooLarge);
        assert_eq!(eval("\"ab\" * 8388608").unwrap().to_string().len(), MAX_REPEAT_LEN);
        assert_eq!(eval("\"\" * 1e19").unwrap(), text(""));
        let (res, _) = run("$r = \"ab\" * 1e19\nlog $r");
        let err = res.unwrap_err();
        assert_eq!(err.msg, ErrorMsg::RepeatTooLarge);
        assert_eq!(err.trace, vec![1]);
    }

    #[test]
    fn invalid_operators() {
        let invalid = |source| eval(source).unwrap_err().msg;
        assert_eq!(invalid("3 * \"ab\""), ErrorMsg::InvalidOperator);
        assert_eq!(invalid("\"ab\" - 1"), ErrorMsg::InvalidOperator);
        assert_eq!(invalid("\"ab\" / 1"), ErrorMsg::InvalidOperator);
        assert_eq!(invalid("\"ab\" * \"c\""), ErrorMsg::InvalidOperator);
        assert_eq!(invalid("1 - \"ab\""), ErrorMsg::InvalidOperator);
        assert_eq!(invalid("true + 1"), ErrorMsg::InvalidOperator);
        assert_eq!(invalid("$missing * 2"), ErrorMsg::InvalidOperator);
    }

    #[test]
    fn division_follows_ieee() {
        assert_eq!(eval("1 / 0").unwrap(), num(f64::INFINITY));
        assert_eq!(eval("-1 / 0").unwrap(), num(f64::NEG_INFINITY));
        let Value::Number(n) = eval("0 / 0").unwrap() else {
            panic!("expected a number");
        };
        assert!(n.is_nan());
    }

    #[test]
    fn negation() {
        assert_eq!(eval("!true").unwrap(), Value::Boolean(false));
        assert_eq!(eval("!!false").unwrap(), Value::Boolean(false));
        assert_eq!(eval("!1").unwrap_err().msg, ErrorMsg::CannotNegate);
        assert_eq!(eval("!\"a\"").unwrap_err().msg, ErrorMsg::CannotNegate);
    }

    #[test]
    fn undefined_variable_is_null() {
        assert_eq!(eval("$nothing").unwrap(), Value::Null);
        assert_eq!(logged("log $nothing"), vec![Value::Null]);
    }

    #[test]
    fn assignment_returns_value() {
        assert_eq!(logged("log $x = 2 * 3\nlog $x"), vec![num(6.0), num(6.0)]);
    }

    #[test]
    fn command_dispatch() {
        assert_eq!(logged("log 1 + 1; log \"a\" * 2"), vec![num(2.0), text("aa")]);
        assert_eq!(logged("log"), vec![Value::Null]);
    }

    #[test]
    fn command_not_found() {
        let (res, _) = run("nope 1");
        let err = res.unwrap_err();
        assert_eq!(err.msg, ErrorMsg::CommandNotFound);
        assert_eq!(err.trace, vec![1]);
    }

    #[test]
    fn command_arity() {
        assert_eq!(run("pair 1").0.unwrap_err().msg, ErrorMsg::TooFewArgs);
        assert!(run("pair 1 2").0.is_ok());
        assert!(run("pair 1 2 3").0.is_ok());
        assert_eq!(run("pair 1 2 3 4").0.unwrap_err().msg, ErrorMsg::TooManyArgs);
        assert_eq!(run("pair 1 \"x\"").0.unwrap_err().msg, ErrorMsg::ConversionFailed);
    }

    #[test]
    fn function_call() {
        let source = "
function show(number a, string b) {
    log $a
    log $b
}
!show 1 \"two\"
";
        assert_eq!(logged(source), vec![num(1.0), text("two")]);
    }

    #[test]
    fn function_arity() {
        let source = "function f(number a) { log $a }\n";
        assert_eq!(
            run(&format!("{source}!f")).0.unwrap_err().msg,
            ErrorMsg::TooFewArgs
        );
        assert_eq!(
            run(&format!("{source}!f 1 2")).0.unwrap_err().msg,
            ErrorMsg::TooManyArgs
        );
    }

    #[test]
    fn function_not_found() {
        assert_eq!(run("!missing").0.unwrap_err().msg, ErrorMsg::FunctionNotFound);
    }

    #[test]
    fn function_returns_null() {
        assert_eq!(
            logged("function f() { }\nlog (!f)"),
            vec![Value::Null]
        );
    }

    #[test]
    fn redeclaration_overwrites() {
        let source = "
function f() { log 1 }
function f() { log 2 }
!f
";
        assert_eq!(logged(source), vec![num(2.0)]);
    }

    #[test]
    fn callee_sees_caller_variables() {
        let source = "
function f() { log $outer }
$outer = \"visible\"
!f
";
        assert_eq!(logged(source), vec![text("visible")]);
    }

    #[test]
    fn callee_variables_do_not_leak() {
        let source = "
function f() { $inner = 1 }
!f
log $inner
";
        assert_eq!(logged(source), vec![Value::Null]);
    }

    #[test]
    fn callee_assignment_shadows_caller() {
        let source = "
function f() {
    $x = 2
    log $x
}
$x = 1
!f
log $x
";
        assert_eq!(logged(source), vec![num(2.0), num(1.0)]);
    }

    #[test]
    fn arguments_evaluate_in_caller_frame() {
        let source = "
function f(number a) { log $a }
$a = 5
!f $a + 1
log $a
";
        assert_eq!(logged(source), vec![num(6.0), num(5.0)]);
    }

    #[test]
    fn functions_call_each_other() {
        let source = "
function inner(number n) { log $n * 2 }
function outer(number n) { !inner $n + 1 }
!outer 1
";
        assert_eq!(logged(source), vec![num(4.0)]);
    }

    #[test]
    fn error_trace_has_every_line() {
        let source = "
function inner() {
    log 1
    log \"a\" - 1
}
function outer() {
    !inner
}
!outer
";
        let (res, values) = run(source);
        let err = res.unwrap_err();
        assert_eq!(err.msg, ErrorMsg::InvalidOperator);
        assert_eq!(err.trace, vec![4, 7, 9]);
        assert_eq!(values, vec![num(1.0)]);
    }

    #[test]
    fn frames_are_popped_on_error() {
        let (mut interpreter, _) = interpreter();
        let file = parse("function f() { !g }\n!f").unwrap();
        assert!(interpreter.run_file(&file).is_err());
        assert_eq!(interpreter.contexts.depth(), 0);
    }

    #[test]
    fn runaway_recursion_fails() {
        let (res, _) = run("function f() { !f }\n!f");
        assert_eq!(res.unwrap_err().msg, ErrorMsg::CallTooDeep);
    }

    #[test]
    fn session_keeps_state() {
        let (mut interpreter, seen) = interpreter();
        let first = parse("$x = 3\nfunction f() { log $x }").unwrap();
        interpreter.interpret_all(&first.statements).unwrap();
        let second = parse("!f").unwrap();
        interpreter.interpret_all(&second.statements).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![num(3.0)]);
        assert_eq!(interpreter.contexts.depth(), 1);
    }

    #[test]
    fn session_starts_with_root_frame() {
        let (mut interpreter, seen) = interpreter();
        assert_eq!(interpreter.contexts.depth(), 0);
        let file = parse("log 1
function f() { log 2 }").unwrap();
        interpreter.interpret_all(&file.statements[..1]).unwrap();
        assert_eq!(interpreter.contexts.depth(), 1);
        interpreter.interpret_all(&file.statements[1..]).unwrap();
        assert!(interpreter.contexts.get_function("f").is_some());
        assert_eq!(interpreter.contexts.depth(), 1);
        assert_eq!(*seen.lock().unwrap(), vec![num(1.0)]);
    }

    proptest! {
        #[test]
        fn arithmetic_matches_native(a in 0u32..1000, b in 0u32..1000, c in 1u32..1000) {
            let (a, b, c) = (f64::from(a), f64::from(b), f64::from(c));
            let value = eval(&format!("{a} - {b} * {c} + {a} / {c}")).unwrap();
            prop_assert_eq!(value, Value::Number(a - b * c + a / c));
        }
    }
}
