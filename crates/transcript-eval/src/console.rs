//! The interactive console: statement buffering and execute-with-capture.
//!
//! Mirrors the classic incremental-console contract: lines are pushed one
//! at a time, `push` answers "do you need more?", and a completed
//! statement runs immediately with its output (or formatted error report)
//! written to the caller's sink before `push` returns.

use std::io::{self, Write};

use transcript_core::Console;

use crate::error::{Error, ExecError, TracebackStyle};
use crate::interpreter::{Env, Interpreter};
use crate::lexer::{lex_line, Token};
use crate::parser;

/// Source name used in error reports.
const SOURCE_NAME: &str = "<input>";

/// An incremental evaluator over one mutable environment.
///
/// Completeness rules, matching what the engine needs for prompts:
/// - open brackets keep a statement incomplete across physical lines;
/// - a compound statement (`fn` / `if` / `while`) stays incomplete until
///   a blank line terminates it;
/// - a lex error or a stray closing bracket forces evaluation at once,
///   so the syntax error surfaces mid-block instead of swallowing the
///   rest of the input.
pub struct InteractiveConsole {
    interp: Interpreter,
    buffer: Vec<String>,
    style: TracebackStyle,
}

impl InteractiveConsole {
    pub fn new(globals: Env, style: TracebackStyle) -> Self {
        Self {
            interp: Interpreter::new(globals),
            buffer: Vec::new(),
            style,
        }
    }

    /// The environment, as mutated by the statements run so far.
    pub fn globals(&self) -> &Env {
        self.interp.globals()
    }

    fn needs_more(&self) -> bool {
        let mut depth: i32 = 0;
        for (i, line) in self.buffer.iter().enumerate() {
            let tokens = match lex_line(line, i + 1) {
                Ok(tokens) => tokens,
                // Can never become complete; evaluate now and report.
                Err(_) => return false,
            };
            for t in &tokens {
                match t.token {
                    Token::LParen | Token::LBracket => depth += 1,
                    Token::RParen | Token::RBracket => {
                        depth -= 1;
                        if depth < 0 {
                            return false;
                        }
                    }
                    _ => {}
                }
            }
        }
        if depth > 0 {
            return true;
        }
        if self.compound() {
            // Block statements end at an empty line, not a whitespace one:
            // an indented blank line belongs to the block body.
            return !self.buffer.last().map(String::is_empty).unwrap_or(true);
        }
        false
    }

    /// Whether the buffered statement opened with a block keyword.
    fn compound(&self) -> bool {
        let first = match self.buffer.first() {
            Some(line) => line,
            None => return false,
        };
        let head = lex_line(first, 1)
            .ok()
            .and_then(|tokens| tokens.into_iter().next());
        matches!(
            head.map(|s| s.token),
            Some(Token::Fn | Token::If | Token::While)
        )
    }

    fn run_buffered(&mut self, out: &mut dyn Write) -> io::Result<()> {
        let source = self.buffer.join("\n");
        self.buffer.clear();
        let program = match parser::parse(&source) {
            Ok(program) => program,
            Err(err) => {
                let report = Error::from(err).report(&source, SOURCE_NAME, self.style);
                return out.write_all(report.as_bytes());
            }
        };
        match self.interp.run(&program, out, true) {
            Ok(()) => Ok(()),
            Err(ExecError::Raised(err)) => {
                let report = Error::from(err).report(&source, SOURCE_NAME, self.style);
                out.write_all(report.as_bytes())
            }
            Err(ExecError::Io(err)) => Err(err),
        }
    }
}

impl Console for InteractiveConsole {
    fn push(&mut self, line: &str, out: &mut dyn Write) -> io::Result<bool> {
        self.buffer.push(line.to_string());
        if self.needs_more() {
            return Ok(true);
        }
        self.run_buffered(out)?;
        Ok(false)
    }
}
