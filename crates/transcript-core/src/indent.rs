//! Shared-indentation bookkeeping.
//!
//! A run's indentation is the leading whitespace of its first line. The
//! engine works on de-indented content and [`IndentWriter`] restores the
//! prefix at every output line start, so the transcript keeps the column
//! alignment of the snippet it came from.

use std::io::{self, Write};

use crate::error::Error;
use crate::Result;

/// The shared indentation of one run, detected once from the first line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indent(String);

impl Indent {
    /// Detect the indentation from the first physical line of the input.
    pub fn detect(first_line: &str) -> Self {
        let body = trim_terminator(first_line);
        let end = body.len() - body.trim_start().len();
        Indent(body[..end].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Remove the shared prefix from one line, keeping its terminator.
    ///
    /// Empty and all-whitespace lines that do not carry the prefix are
    /// blank separators and reduce to just their terminator. A non-blank
    /// line without the prefix fails the whole run.
    pub fn strip<'a>(&self, line: &'a str, lineno: usize) -> Result<&'a str> {
        let body = trim_terminator(line);
        if body.starts_with(&self.0) {
            Ok(&line[self.0.len()..])
        } else if body.trim().is_empty() {
            Ok(&line[body.len()..])
        } else {
            Err(Error::IndentMismatch { line: lineno })
        }
    }
}

/// The line body without its `\n` / `\r\n` terminator.
pub(crate) fn trim_terminator(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

/// Re-applies the shared indentation at the start of every output line.
///
/// Statement output can arrive in fragments rather than whole lines, so
/// the prefix is applied by output-stream position: the writer remembers
/// whether the last byte it forwarded ended a line and, if so, writes the
/// indent before the next byte. A bare newline still gets the prefix,
/// keeping blank output lines aligned with the rest of the transcript.
pub struct IndentWriter<W: Write> {
    inner: W,
    indent: String,
    at_line_start: bool,
}

impl<W: Write> IndentWriter<W> {
    pub fn new(inner: W, indent: &Indent) -> Self {
        Self {
            inner,
            indent: indent.as_str().to_string(),
            at_line_start: true,
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for IndentWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for chunk in buf.split_inclusive(|&b| b == b'\n') {
            if self.at_line_start {
                self.inner.write_all(self.indent.as_bytes())?;
            }
            self.inner.write_all(chunk)?;
            self.at_line_start = chunk.ends_with(b"\n");
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_empty_and_spaces() {
        assert_eq!(Indent::detect("a\n").as_str(), "");
        assert_eq!(Indent::detect("    a\n").as_str(), "    ");
        assert_eq!(Indent::detect("\t b\r\n").as_str(), "\t ");
        assert_eq!(Indent::detect("    \n").as_str(), "    ");
    }

    #[test]
    fn test_strip_prefix_match() {
        let indent = Indent::detect("    a\n");
        assert_eq!(indent.strip("    a\n", 1).unwrap(), "a\n");
        assert_eq!(indent.strip("    \n", 2).unwrap(), "\n");
        assert_eq!(indent.strip("        b\r\n", 3).unwrap(), "    b\r\n");
    }

    #[test]
    fn test_strip_blank_lines_are_exempt() {
        let indent = Indent::detect("    a\n");
        // Shorter all-whitespace lines reduce to their terminator.
        assert_eq!(indent.strip("\n", 2).unwrap(), "\n");
        assert_eq!(indent.strip("  \n", 2).unwrap(), "\n");
        assert_eq!(indent.strip("  \r\n", 2).unwrap(), "\r\n");
        assert_eq!(indent.strip("", 2).unwrap(), "");
    }

    #[test]
    fn test_strip_mismatch() {
        let indent = Indent::detect("    a\n");
        let err = indent.strip("b\n", 7).unwrap_err();
        assert!(matches!(err, Error::IndentMismatch { line: 7 }));
    }

    #[test]
    fn test_writer_prefixes_each_line() {
        let indent = Indent::detect("  x");
        let mut w = IndentWriter::new(Vec::new(), &indent);
        w.write_all(b"a\nb\n").unwrap();
        assert_eq!(w.into_inner(), b"  a\n  b\n");
    }

    #[test]
    fn test_writer_fragments_share_one_prefix() {
        let indent = Indent::detect("  x");
        let mut w = IndentWriter::new(Vec::new(), &indent);
        w.write_all(b"a").unwrap();
        w.write_all(b"b").unwrap();
        w.write_all(b"\n").unwrap();
        w.write_all(b"c\n").unwrap();
        assert_eq!(w.into_inner(), b"  ab\n  c\n");
    }

    #[test]
    fn test_writer_blank_line_keeps_prefix() {
        let indent = Indent::detect("    x");
        let mut w = IndentWriter::new(Vec::new(), &indent);
        w.write_all(b"\n").unwrap();
        assert_eq!(w.into_inner(), b"    \n");
    }

    #[test]
    fn test_writer_empty_indent_is_transparent() {
        let indent = Indent::detect("x");
        let mut w = IndentWriter::new(Vec::new(), &indent);
        w.write_all(b"a\n\nb").unwrap();
        assert_eq!(w.into_inner(), b"a\n\nb");
    }
}
