//! Tree-walking evaluator with call-stack tracking for tracebacks.

use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use crate::ast::{BinaryOp, Expr, Program, Stmt, UnaryOp};
use crate::error::{ErrorKind, ExecError, Frame, RuntimeError};
use crate::value::{Builtin, Value};

/// Variable bindings for one scope.
pub type Env = HashMap<String, Value>;

/// Calls nested deeper than this raise a recursion error instead of
/// exhausting the process stack.
const MAX_CALL_DEPTH: usize = 200;

/// A fresh global environment with the builtins installed.
pub fn default_env() -> Env {
    let mut env = Env::new();
    env.insert("print".to_string(), Value::Builtin(Builtin::Print));
    env.insert("len".to_string(), Value::Builtin(Builtin::Len));
    env
}

/// Where assignments land and where name lookup starts.
enum Scope {
    /// Executing at the top level: the globals are the scope.
    Global,
    /// Executing inside a function call.
    Local(Env),
}

/// What a statement did with control flow.
enum Flow {
    Normal,
    Return(Value),
}

/// The statement-language interpreter.
///
/// Holds the global environment across statements; each [`run`] call
/// executes one parsed statement sequence against it. Runtime errors
/// carry a snapshot of the call stack for traceback rendering and leave
/// the globals in whatever state execution reached.
///
/// [`run`]: Interpreter::run
pub struct Interpreter {
    globals: Env,
    frames: Vec<Frame>,
}

impl Interpreter {
    pub fn new(globals: Env) -> Self {
        Self {
            globals,
            frames: Vec::new(),
        }
    }

    pub fn globals(&self) -> &Env {
        &self.globals
    }

    pub fn into_globals(self) -> Env {
        self.globals
    }

    /// Execute a parsed program, writing any produced output to `out`.
    ///
    /// With `echo` set, top-level expression statements whose value is
    /// non-null print the value's repr, the interactive convention.
    pub fn run(
        &mut self,
        program: &Program,
        out: &mut dyn Write,
        echo: bool,
    ) -> Result<(), ExecError> {
        self.frames.clear();
        self.frames.push(Frame {
            line: 0,
            name: "<module>".to_string(),
        });
        let mut scope = Scope::Global;
        let result = self.exec_block(&program.body, &mut scope, out, echo);
        self.frames.clear();
        result.map(|_| ())
    }

    fn exec_block(
        &mut self,
        body: &[Stmt],
        scope: &mut Scope,
        out: &mut dyn Write,
        echo: bool,
    ) -> Result<Flow, ExecError> {
        for stmt in body {
            match self.exec_stmt(stmt, scope, out, echo)? {
                Flow::Normal => {}
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(
        &mut self,
        stmt: &Stmt,
        scope: &mut Scope,
        out: &mut dyn Write,
        echo: bool,
    ) -> Result<Flow, ExecError> {
        match stmt {
            Stmt::Assign { name, value, line } => {
                self.set_line(*line);
                let value = self.eval_expr(value, scope, out)?;
                self.bind(scope, name, value);
                Ok(Flow::Normal)
            }
            Stmt::Expr { value, line } => {
                self.set_line(*line);
                let value = self.eval_expr(value, scope, out)?;
                if echo && !value.is_null() {
                    writeln!(out, "{}", value.repr())?;
                }
                Ok(Flow::Normal)
            }
            Stmt::Return { value, line } => {
                self.set_line(*line);
                let value = match value {
                    Some(expr) => self.eval_expr(expr, scope, out)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Stmt::FnDef(def) => {
                self.set_line(def.line);
                self.bind(scope, &def.name, Value::Func(Rc::clone(def)));
                Ok(Flow::Normal)
            }
            Stmt::If {
                cond,
                then,
                orelse,
                line,
            } => {
                self.set_line(*line);
                if self.eval_expr(cond, scope, out)?.truthy() {
                    self.exec_block(then, scope, out, echo)
                } else {
                    self.exec_block(orelse, scope, out, echo)
                }
            }
            Stmt::While { cond, body, line } => {
                loop {
                    self.set_line(*line);
                    if !self.eval_expr(cond, scope, out)?.truthy() {
                        break;
                    }
                    if let flow @ Flow::Return(_) = self.exec_block(body, scope, out, echo)? {
                        return Ok(flow);
                    }
                }
                Ok(Flow::Normal)
            }
        }
    }

    fn eval_expr(
        &mut self,
        expr: &Expr,
        scope: &mut Scope,
        out: &mut dyn Write,
    ) -> Result<Value, ExecError> {
        match expr {
            Expr::Null { .. } => Ok(Value::Null),
            Expr::Bool { value, .. } => Ok(Value::Bool(*value)),
            Expr::Num { value, .. } => Ok(Value::Num(*value)),
            Expr::Str { value, .. } => Ok(Value::Str(value.clone())),
            Expr::Name { name, .. } => self.lookup(scope, name),
            Expr::List { items, .. } => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item, scope, out)?);
                }
                Ok(Value::List(values))
            }
            Expr::Unary { op, operand, .. } => {
                let value = self.eval_expr(operand, scope, out)?;
                self.apply_unary(*op, value)
            }
            Expr::Binary { op, lhs, rhs, .. } => match op {
                BinaryOp::And => {
                    let lhs = self.eval_expr(lhs, scope, out)?;
                    if !lhs.truthy() {
                        Ok(lhs)
                    } else {
                        self.eval_expr(rhs, scope, out)
                    }
                }
                BinaryOp::Or => {
                    let lhs = self.eval_expr(lhs, scope, out)?;
                    if lhs.truthy() {
                        Ok(lhs)
                    } else {
                        self.eval_expr(rhs, scope, out)
                    }
                }
                _ => {
                    let lhs = self.eval_expr(lhs, scope, out)?;
                    let rhs = self.eval_expr(rhs, scope, out)?;
                    self.apply_binary(*op, lhs, rhs)
                }
            },
            Expr::Call { callee, args, line } => {
                let callee = self.eval_expr(callee, scope, out)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, scope, out)?);
                }
                // The caller's frame points at the call site.
                self.set_line(*line);
                self.call(callee, values, out)
            }
            Expr::Index { target, index, .. } => {
                let target = self.eval_expr(target, scope, out)?;
                let index = self.eval_expr(index, scope, out)?;
                self.index(target, index)
            }
        }
    }

    fn call(
        &mut self,
        callee: Value,
        args: Vec<Value>,
        out: &mut dyn Write,
    ) -> Result<Value, ExecError> {
        match callee {
            Value::Builtin(builtin) => self.call_builtin(builtin, args, out),
            Value::Func(def) => {
                if args.len() != def.params.len() {
                    return Err(self.raise(
                        ErrorKind::Type,
                        format!(
                            "{}() takes {} arguments ({} given)",
                            def.name,
                            def.params.len(),
                            args.len()
                        ),
                    ));
                }
                if self.frames.len() >= MAX_CALL_DEPTH {
                    return Err(self.raise(
                        ErrorKind::Recursion,
                        "maximum recursion depth exceeded".to_string(),
                    ));
                }
                let mut locals = Env::new();
                for (param, arg) in def.params.iter().zip(args) {
                    locals.insert(param.clone(), arg);
                }
                self.frames.push(Frame {
                    line: def.line,
                    name: def.name.clone(),
                });
                let mut scope = Scope::Local(locals);
                let flow = self.exec_block(&def.body, &mut scope, out, false)?;
                self.frames.pop();
                Ok(match flow {
                    Flow::Return(value) => value,
                    Flow::Normal => Value::Null,
                })
            }
            other => Err(self.raise(
                ErrorKind::Type,
                format!("'{}' object is not callable", other.type_name()),
            )),
        }
    }

    fn call_builtin(
        &mut self,
        builtin: Builtin,
        args: Vec<Value>,
        out: &mut dyn Write,
    ) -> Result<Value, ExecError> {
        match builtin {
            Builtin::Print => {
                let parts: Vec<String> = args.iter().map(Value::to_string).collect();
                writeln!(out, "{}", parts.join(" "))?;
                Ok(Value::Null)
            }
            Builtin::Len => match args.as_slice() {
                [Value::Str(s)] => Ok(Value::Num(s.chars().count() as f64)),
                [Value::List(items)] => Ok(Value::Num(items.len() as f64)),
                [other] => Err(self.raise(
                    ErrorKind::Type,
                    format!("object of type '{}' has no len()", other.type_name()),
                )),
                _ => Err(self.raise(
                    ErrorKind::Type,
                    format!("len() takes 1 argument ({} given)", args.len()),
                )),
            },
        }
    }

    fn apply_unary(&self, op: UnaryOp, value: Value) -> Result<Value, ExecError> {
        match op {
            UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
            UnaryOp::Neg => match value {
                Value::Num(n) => Ok(Value::Num(-n)),
                other => Err(self.raise(
                    ErrorKind::Type,
                    format!("bad operand type for unary -: '{}'", other.type_name()),
                )),
            },
        }
    }

    fn apply_binary(&self, op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, ExecError> {
        use BinaryOp::*;
        match (op, &lhs, &rhs) {
            (Eq, _, _) => return Ok(Value::Bool(lhs == rhs)),
            (Ne, _, _) => return Ok(Value::Bool(lhs != rhs)),
            _ => {}
        }
        match (op, lhs, rhs) {
            (Add, Value::Num(a), Value::Num(b)) => Ok(Value::Num(a + b)),
            (Sub, Value::Num(a), Value::Num(b)) => Ok(Value::Num(a - b)),
            (Mul, Value::Num(a), Value::Num(b)) => Ok(Value::Num(a * b)),
            (Div, Value::Num(a), Value::Num(b)) => {
                if b == 0.0 {
                    Err(self.raise(ErrorKind::ZeroDivision, "division by zero".to_string()))
                } else {
                    Ok(Value::Num(a / b))
                }
            }
            (Rem, Value::Num(a), Value::Num(b)) => {
                if b == 0.0 {
                    Err(self.raise(ErrorKind::ZeroDivision, "modulo by zero".to_string()))
                } else {
                    Ok(Value::Num(a % b))
                }
            }
            (Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
            (Add, Value::List(mut a), Value::List(b)) => {
                a.extend(b);
                Ok(Value::List(a))
            }
            (Lt, Value::Num(a), Value::Num(b)) => Ok(Value::Bool(a < b)),
            (Le, Value::Num(a), Value::Num(b)) => Ok(Value::Bool(a <= b)),
            (Gt, Value::Num(a), Value::Num(b)) => Ok(Value::Bool(a > b)),
            (Ge, Value::Num(a), Value::Num(b)) => Ok(Value::Bool(a >= b)),
            (Lt, Value::Str(a), Value::Str(b)) => Ok(Value::Bool(a < b)),
            (Le, Value::Str(a), Value::Str(b)) => Ok(Value::Bool(a <= b)),
            (Gt, Value::Str(a), Value::Str(b)) => Ok(Value::Bool(a > b)),
            (Ge, Value::Str(a), Value::Str(b)) => Ok(Value::Bool(a >= b)),
            (op, lhs, rhs) => Err(self.raise(
                ErrorKind::Type,
                format!(
                    "unsupported operand type(s) for {}: '{}' and '{}'",
                    op_symbol(op),
                    lhs.type_name(),
                    rhs.type_name()
                ),
            )),
        }
    }

    fn index(&self, target: Value, index: Value) -> Result<Value, ExecError> {
        let n = match index {
            Value::Num(n) if n == n.trunc() => n as i64,
            other => {
                return Err(self.raise(
                    ErrorKind::Type,
                    format!("indices must be integers, not '{}'", other.type_name()),
                ))
            }
        };
        match target {
            Value::List(items) => {
                let len = items.len() as i64;
                let i = if n < 0 { n + len } else { n };
                if (0..len).contains(&i) {
                    Ok(items[i as usize].clone())
                } else {
                    Err(self.raise(
                        ErrorKind::Index,
                        "list index out of range".to_string(),
                    ))
                }
            }
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let len = chars.len() as i64;
                let i = if n < 0 { n + len } else { n };
                if (0..len).contains(&i) {
                    Ok(Value::Str(chars[i as usize].to_string()))
                } else {
                    Err(self.raise(
                        ErrorKind::Index,
                        "string index out of range".to_string(),
                    ))
                }
            }
            other => Err(self.raise(
                ErrorKind::Type,
                format!("'{}' object is not subscriptable", other.type_name()),
            )),
        }
    }

    fn lookup(&self, scope: &Scope, name: &str) -> Result<Value, ExecError> {
        if let Scope::Local(env) = scope {
            if let Some(value) = env.get(name) {
                return Ok(value.clone());
            }
        }
        match self.globals.get(name) {
            Some(value) => Ok(value.clone()),
            None => Err(self.raise(
                ErrorKind::Name,
                format!("name '{}' is not defined", name),
            )),
        }
    }

    fn bind(&mut self, scope: &mut Scope, name: &str, value: Value) {
        match scope {
            Scope::Local(env) => {
                env.insert(name.to_string(), value);
            }
            Scope::Global => {
                self.globals.insert(name.to_string(), value);
            }
        }
    }

    fn set_line(&mut self, line: usize) {
        if let Some(frame) = self.frames.last_mut() {
            frame.line = line;
        }
    }

    /// Snapshot the call stack into a runtime error.
    fn raise(&self, kind: ErrorKind, message: String) -> ExecError {
        ExecError::Raised(RuntimeError {
            kind,
            message,
            traceback: self.frames.clone(),
        })
    }
}

fn op_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Rem => "%",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn run_source(source: &str, env: Env) -> (Result<(), ExecError>, String, Env) {
        let program = parse(source).expect("parse failed");
        let mut interp = Interpreter::new(env);
        let mut out = Vec::new();
        let result = interp.run(&program, &mut out, true);
        (result, String::from_utf8(out).unwrap(), interp.into_globals())
    }

    #[test]
    fn test_echo_expression_value() {
        let (result, out, _) = run_source("1 + 2\n", default_env());
        result.unwrap();
        assert_eq!(out, "3\n");
    }

    #[test]
    fn test_assignment_mutates_globals() {
        let (result, out, env) = run_source("x = 2\nx * x\n", default_env());
        result.unwrap();
        assert_eq!(out, "4\n");
        assert_eq!(env.get("x"), Some(&Value::Num(2.0)));
    }

    #[test]
    fn test_function_call_and_locals() {
        let source = "fn sq(x):\n    return x * x\n\nsq(3)\n";
        let (result, out, env) = run_source(source, default_env());
        result.unwrap();
        assert_eq!(out, "9\n");
        // The parameter stays local.
        assert!(!env.contains_key("x"));
    }

    #[test]
    fn test_if_else_and_while() {
        let source = "\
total = 0
i = 0
while i < 4:
    if i % 2 == 0:
        total = total + i
    else:
        total = total
    i = i + 1
total
";
        let (result, out, _) = run_source(source, default_env());
        result.unwrap();
        assert_eq!(out, "2\n");
    }

    #[test]
    fn test_print_uses_display_not_repr() {
        let (result, out, _) = run_source("print('hi', 1 + 1)\n", default_env());
        result.unwrap();
        assert_eq!(out, "hi 2\n");
    }

    #[test]
    fn test_name_error_has_module_frame() {
        let (result, out, _) = run_source("nope\n", default_env());
        assert!(out.is_empty());
        match result.unwrap_err() {
            ExecError::Raised(err) => {
                assert_eq!(err.kind, ErrorKind::Name);
                assert_eq!(err.message, "name 'nope' is not defined");
                assert_eq!(err.traceback.len(), 1);
                assert_eq!(err.traceback[0].name, "<module>");
                assert_eq!(err.traceback[0].line, 1);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_traceback_lines_are_relative_to_defining_statement() {
        // The function is defined by one statement, called by another; the
        // callee frame keeps the def statement's numbering.
        let def = parse("fn a():\n    b\n").expect("parse failed");
        let call = parse("a()\n").expect("parse failed");
        let mut interp = Interpreter::new(default_env());
        let mut out = Vec::new();
        interp.run(&def, &mut out, true).unwrap();
        let err = match interp.run(&call, &mut out, true) {
            Err(ExecError::Raised(err)) => err,
            other => panic!("unexpected result: {:?}", other),
        };
        assert_eq!(err.traceback.len(), 2);
        assert_eq!(err.traceback[0].name, "<module>");
        assert_eq!(err.traceback[0].line, 1);
        assert_eq!(err.traceback[1].name, "a");
        assert_eq!(err.traceback[1].line, 2);
    }

    #[test]
    fn test_runaway_recursion_raises() {
        let source = "fn a():\n    return a()\n\na()\n";
        let (result, out, _) = run_source(source, default_env());
        assert!(out.is_empty());
        match result.unwrap_err() {
            ExecError::Raised(err) => {
                assert_eq!(err.kind, ErrorKind::Recursion);
                assert_eq!(err.message, "maximum recursion depth exceeded");
                assert_eq!(err.traceback.len(), MAX_CALL_DEPTH);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_division_by_zero() {
        let (result, _, _) = run_source("1 / 0\n", default_env());
        match result.unwrap_err() {
            ExecError::Raised(err) => assert_eq!(err.kind, ErrorKind::ZeroDivision),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_type_error_mentions_both_types() {
        let (result, _, _) = run_source("1 + 'a'\n", default_env());
        match result.unwrap_err() {
            ExecError::Raised(err) => {
                assert_eq!(err.kind, ErrorKind::Type);
                assert_eq!(
                    err.message,
                    "unsupported operand type(s) for +: 'number' and 'string'"
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_indexing() {
        let (result, out, _) = run_source("xs = [1, 2, 3]\nxs[-1]\n'abc'[1]\n", default_env());
        result.unwrap();
        assert_eq!(out, "3\n'b'\n");
    }

    #[test]
    fn test_short_circuit() {
        // The right-hand side would raise if evaluated.
        let (result, out, _) = run_source("false and nope\n", default_env());
        result.unwrap();
        assert_eq!(out, "false\n");
    }

    #[test]
    fn test_len_builtin() {
        let (result, out, _) = run_source("len('abc') + len([1, 2])\n", default_env());
        result.unwrap();
        assert_eq!(out, "5\n");
    }
}
