//! The incremental-evaluation capability the engine drives.

use std::io::{self, Write};

/// An incremental statement evaluator.
///
/// The engine feeds one terminator-stripped line per call. While the
/// accumulated statement is syntactically incomplete, `push` returns
/// `true` and the engine prefixes the next line with the continuation
/// prompt. Once the statement is complete it must be executed before
/// `push` returns, with everything it prints, normal output or a
/// formatted error report, written to `out`.
///
/// Execution failures are transcript content, not control flow: the
/// console formats them into `out` and returns `false`. Only failures of
/// the sink itself propagate.
pub trait Console {
    fn push(&mut self, line: &str, out: &mut dyn Write) -> io::Result<bool>;
}
