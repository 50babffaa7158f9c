//! Runtime values for the statement language.

use std::fmt;
use std::rc::Rc;

use crate::ast::FnDef;

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    /// The null value.
    Null,
    /// A boolean value.
    Bool(bool),
    /// A numeric value (always f64; integer-like values display without
    /// a decimal point).
    Num(f64),
    /// A string value.
    Str(String),
    /// A list of values.
    List(Vec<Value>),
    /// A user-defined function.
    Func(Rc<FnDef>),
    /// A builtin function.
    Builtin(Builtin),
}

/// Builtin functions installed in every default environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Len,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Len => "len",
        }
    }
}

impl Value {
    /// The type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Func(_) | Value::Builtin(_) => "function",
        }
    }

    /// Coerce this value to a boolean.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Func(_) | Value::Builtin(_) => true,
        }
    }

    /// The REPL echo form: strings quoted and escaped, lists element-wise.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => {
                format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
            }
            Value::List(items) => {
                let items: Vec<String> = items.iter().map(Value::repr).collect();
                format!("[{}]", items.join(", "))
            }
            other => other.to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Func(a), Value::Func(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Num(n) => {
                if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_infinite() {
                    write!(f, "{}", if *n > 0.0 { "Infinity" } else { "-Infinity" })
                } else if *n == n.trunc() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Str(s) => write!(f, "{}", s),
            Value::List(_) => write!(f, "{}", self.repr()),
            Value::Func(def) => write!(f, "<function {}>", def.name),
            Value::Builtin(b) => write!(f, "<builtin {}>", b.name()),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_like_display() {
        assert_eq!(Value::Num(1.0).to_string(), "1");
        assert_eq!(Value::Num(-3.0).to_string(), "-3");
        assert_eq!(Value::Num(1.5).to_string(), "1.5");
    }

    #[test]
    fn test_repr_quotes_strings() {
        assert_eq!(Value::Str("hi".to_string()).repr(), "'hi'");
        assert_eq!(Value::Str("it's".to_string()).repr(), "'it\\'s'");
        assert_eq!(Value::Num(2.0).repr(), "2");
    }

    #[test]
    fn test_repr_lists_elementwise() {
        let v = Value::List(vec![Value::Num(1.0), Value::Str("a".to_string())]);
        assert_eq!(v.repr(), "[1, 'a']");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.truthy());
        assert!(!Value::Num(0.0).truthy());
        assert!(!Value::Str(String::new()).truthy());
        assert!(Value::Num(2.0).truthy());
        assert!(Value::List(vec![Value::Null]).truthy());
    }
}
