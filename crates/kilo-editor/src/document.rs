//! Document — the ordered lines the viewer displays.
//!
//! A `Document` is a plain vector of byte lines. The viewer never edits it;
//! it only asks how many rows there are and what bytes a given row holds.
//!
//! # Design choices
//!
//! - **Lines are bytes**, not `String`s. The renderer slices by byte column
//!   and the file on disk is not required to be UTF-8.
//!
//! - **Line terminators are stripped on load.** Any run of trailing `\r` and
//!   `\n` bytes is removed, so CRLF and LF files look the same.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::debug;

// ---------------------------------------------------------------------------
// Line
// ---------------------------------------------------------------------------

/// One row of the document, without its line terminator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    bytes: Vec<u8>,
}

impl Line {
    /// Wrap `bytes` as a line. Terminators are not stripped here.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the line holds no bytes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The line's bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// An ordered, read-only sequence of lines.
#[derive(Debug, Clone, Default)]
pub struct Document {
    lines: Vec<Line>,
    path: Option<PathBuf>,
}

impl Document {
    /// An empty document (no rows, no path).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            path: None,
        }
    }

    /// Build a document from in-memory lines.
    #[must_use]
    pub fn from_lines<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Vec<u8>>,
    {
        Self {
            lines: lines.into_iter().map(Line::new).collect(),
            path: None,
        }
    }

    /// Load every line of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be opened or read.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let mut doc = Self::read_from(BufReader::new(File::open(path)?))?;
        doc.path = Some(path.to_path_buf());
        debug!(path = %path.display(), rows = doc.num_rows(), "document loaded");
        Ok(doc)
    }

    /// Load every line from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if reading fails.
    pub fn read_from(mut reader: impl BufRead) -> io::Result<Self> {
        let mut doc = Self::new();
        let mut raw = Vec::new();

        loop {
            raw.clear();
            if reader.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            let content = strip_terminator(&raw);
            doc.push_line(content);
        }

        Ok(doc)
    }

    /// Append a line at the end.
    pub fn push_line(&mut self, bytes: impl Into<Vec<u8>>) {
        self.lines.push(Line::new(bytes));
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.lines.len()
    }

    /// Whether the document has no rows at all.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The row at `index`, if it exists.
    #[inline]
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    /// The file this document was loaded from, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Drop any trailing `\r` / `\n` bytes.
fn strip_terminator(raw: &[u8]) -> &[u8] {
    let end = raw
        .iter()
        .rposition(|&b| b != b'\r' && b != b'\n')
        .map_or(0, |i| i + 1);
    &raw[..end]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
