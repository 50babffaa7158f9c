//! Line-oriented conversion between plain source and REPL-style transcripts.
//!
//! Synthesis turns plain source into a transcript by feeding each line to
//! an incremental evaluator (the [`Console`] capability) and interleaving
//! the prompts with everything it prints. Extraction strips prompts and
//! captured output back out without evaluating anything. The direction is
//! decided once, from the first line of the input.
//!
//! The engine treats every line as an opaque string; statement grammar,
//! execution, and error formatting all live behind the [`Console`] trait.

mod console;
mod engine;
mod error;
mod indent;

pub use console::Console;
pub use engine::{process, PS1, PS2};
pub use error::Error;
pub use indent::{Indent, IndentWriter};

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
