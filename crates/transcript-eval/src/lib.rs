//! A small statement language with an incremental interactive console.
//!
//! This crate supplies the evaluator capability behind transcript
//! synthesis: statements are pushed one physical line at a time, the
//! console reports whether more lines are needed (open brackets, or a
//! block waiting for its terminating blank line), and a completed
//! statement is executed against the console's environment with all
//! output, including formatted tracebacks, written to the caller's sink.
//!
//! The language is deliberately small: assignment, expressions, `fn` /
//! `if` / `while` with colon-and-indentation blocks terminated by a blank
//! line. Runtime failures become transcript content, never process
//! errors.

pub mod ast;
mod console;
mod error;
mod interpreter;
mod lexer;
mod parser;
mod value;

pub use console::InteractiveConsole;
pub use error::{
    Error, ErrorKind, ExecError, Frame, RuntimeError, SyntaxError, TracebackStyle,
};
pub use interpreter::{default_env, Env, Interpreter};
pub use parser::parse;
pub use value::{Builtin, Value};

/// Result type for parse and evaluation operations.
pub type Result<T> = std::result::Result<T, Error>;
