//! The per-line transcript state machine.

use std::io::{self, BufRead, Write};

use crate::console::Console;
use crate::indent::{trim_terminator, Indent, IndentWriter};
use crate::Result;

/// Primary prompt: marks the first line of a new statement.
pub const PS1: &str = ">>> ";
/// Continuation prompt: marks a line of a not-yet-complete statement.
pub const PS2: &str = "... ";

/// The direction of one run, fixed at the first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Plain source in: echo prompts, execute, interleave output.
    Synthesize,
    /// Transcript in: strip prompts, discard captured output.
    Extract,
}

/// Convert between plain source and transcript form.
///
/// The shared indentation is detected from the first line and every
/// emitted line goes back out through an [`IndentWriter`] carrying it. A
/// first line whose de-indented text starts with [`PS1`] selects
/// extraction; anything else selects synthesis, which drives `console`
/// one line at a time. The decision is permanent for the run.
///
/// Fails fast on an indentation mismatch; output already written is not
/// rolled back.
pub fn process<R: BufRead, W: Write>(
    mut input: R,
    output: W,
    console: &mut dyn Console,
) -> Result<()> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(());
    }

    let indent = Indent::detect(&line);
    let mode = if trim_terminator(&line).trim_start().starts_with(PS1) {
        Mode::Extract
    } else {
        Mode::Synthesize
    };
    let mut out = IndentWriter::new(output, &indent);
    let mut pending = false;
    let mut lineno = 1;

    loop {
        let content = indent.strip(&line, lineno)?;
        match mode {
            Mode::Extract => extract_line(&mut out, content)?,
            Mode::Synthesize => {
                // Echo first, so captured output lands after its own
                // statement's prompt lines.
                out.write_all(if pending { PS2 } else { PS1 }.as_bytes())?;
                out.write_all(content.as_bytes())?;
                pending = console.push(trim_terminator(content), &mut out)?;
            }
        }

        line.clear();
        lineno += 1;
        if input.read_line(&mut line)? == 0 {
            break;
        }
    }

    out.flush()?;
    Ok(())
}

/// Emit the source hiding inside one transcript line, if any.
fn extract_line<W: Write>(out: &mut W, content: &str) -> io::Result<()> {
    if let Some(rest) = content.strip_prefix(PS1) {
        out.write_all(rest.as_bytes())
    } else if let Some(rest) = content.strip_prefix(PS2) {
        out.write_all(rest.as_bytes())
    } else if trim_terminator(content).is_empty() {
        // A blank line is part of the original source, not output.
        out.write_all(content.as_bytes())
    } else {
        // Captured output belonging to a previous statement.
        Ok(())
    }
}
