//! Error types for the transcript engine.

use thiserror::Error;

/// Errors that abort a whole run.
///
/// Statement-level failures are not represented here: the [`Console`]
/// formats them into the transcript and the run continues.
///
/// [`Console`]: crate::Console
#[derive(Debug, Error)]
pub enum Error {
    /// A line does not share the indentation detected on the first line.
    #[error("line {line}: indentation does not match the first line")]
    IndentMismatch { line: usize },

    /// The input or output stream failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
