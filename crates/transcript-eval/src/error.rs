//! Errors for the statement language and their transcript-facing reports.
//!
//! Two report shapes exist: syntax errors quote the offending line with a
//! caret, runtime errors print a traceback. [`TracebackStyle::Doctest`]
//! collapses the frame list to a fixed elision line so transcripts stay
//! stable when unrelated context changes move line numbers around.

use std::fmt::{self, Write as _};
use std::io;

use thiserror::Error;

/// A syntax error with the position of the offending token.
///
/// `line` is 1-based within the statement that produced it; `column` is a
/// 0-based byte offset within that line.
#[derive(Debug, Clone, Error)]
#[error("{message} (line {line})")]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// The kind of a runtime error; its label leads the final report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Name,
    Type,
    Index,
    ZeroDivision,
    Recursion,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Name => "NameError",
            ErrorKind::Type => "TypeError",
            ErrorKind::Index => "IndexError",
            ErrorKind::ZeroDivision => "ZeroDivisionError",
            ErrorKind::Recursion => "RecursionError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One call-stack frame: the statement line being executed and the
/// enclosing function name (`<module>` at top level).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub line: usize,
    pub name: String,
}

/// A runtime error carrying the call stack active when it was raised.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    /// Outermost frame first.
    pub traceback: Vec<Frame>,
}

/// Any failure produced by parsing or executing one statement.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Why execution stopped early: the program raised, or the sink failed.
///
/// A raise is transcript content; an I/O failure is a real error.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error(transparent)]
    Raised(#[from] RuntimeError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// How runtime tracebacks are rendered into the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracebackStyle {
    /// Every active frame, outermost first.
    #[default]
    Full,
    /// A single elision line in place of the frame list.
    Doctest,
}

impl Error {
    /// Render the report exactly as it appears in a transcript.
    ///
    /// `source` is the statement text the error came from; syntax errors
    /// quote the offending line from it. `file` names the source in the
    /// report, conventionally `<input>`.
    pub fn report(&self, source: &str, file: &str, style: TracebackStyle) -> String {
        match self {
            Error::Syntax(err) => err.report(source, file),
            Error::Runtime(err) => err.report(file, style),
        }
    }
}

impl SyntaxError {
    fn report(&self, source: &str, file: &str) -> String {
        let text = source.lines().nth(self.line - 1).unwrap_or("");
        let trimmed = text.trim_start();
        // `column` is a byte offset; the caret pads by display position.
        let byte_col = self
            .column
            .saturating_sub(text.len() - trimmed.len())
            .min(trimmed.len());
        let caret = trimmed
            .get(..byte_col)
            .map_or(byte_col, |s| s.chars().count());
        let mut out = String::new();
        let _ = writeln!(out, "  File \"{}\", line {}", file, self.line);
        let _ = writeln!(out, "    {}", trimmed);
        let _ = writeln!(out, "    {}^", " ".repeat(caret));
        let _ = writeln!(out, "SyntaxError: {}", self.message);
        out
    }
}

impl RuntimeError {
    fn report(&self, file: &str, style: TracebackStyle) -> String {
        let mut out = String::from("Traceback (most recent call last):\n");
        match style {
            TracebackStyle::Full => {
                for frame in &self.traceback {
                    let _ = writeln!(
                        out,
                        "  File \"{}\", line {}, in {}",
                        file, frame.line, frame.name
                    );
                }
            }
            TracebackStyle::Doctest => out.push_str("  ...\n"),
        }
        let _ = writeln!(out, "{}: {}", self.kind.label(), self.message);
        out
    }
}
