//! View — the bridge from document to terminal bytes.
//!
//! A [`Viewport`] borrows everything one frame needs (the document, the
//! cursor, the scroll offset, the window size) and paints it as a single
//! run of escape sequences and row bytes:
//!
//! ```text
//! ESC[?25l ESC[H                      hide cursor, home
//! row 0 ESC[K \r\n                    document bytes, or `~`
//! row 1 ESC[K \r\n
//! ...
//! row N-1 ESC[K                       no separator after the last row
//! ESC[{y};{x}H ESC[?25h               place cursor, show it
//! ```
//!
//! Rendering is byte-oriented: a row is sliced at `coloff` for at most
//! `cols` bytes, with no tab expansion and no width accounting.
//!
//! There is no diffing. Every frame repaints every row, and the caller
//! sends the whole frame in one write.

use std::io::{self, Write};

use kilo_term::ansi;
use kilo_term::geometry::WindowGeometry;
use kilo_term::output::OutputBuffer;

use crate::cursor::Cursor;
use crate::document::Document;
use crate::scroll::ScrollOffset;

/// Marker painted on rows past the end of the document.
const TILDE: &[u8] = b"~";

/// Separator between screen rows.
const ROW_SEPARATOR: &[u8] = b"\r\n";

/// The banner shown a third of the way down an empty document.
#[must_use]
pub fn welcome_banner() -> String {
    format!("Kilo editor -- Version {}", env!("CARGO_PKG_VERSION"))
}

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// One frame's worth of state, borrowed.
///
/// The scroll offset is expected to be current for the cursor; the cursor
/// escape saturates at the top-left rather than underflowing if it is not.
#[derive(Debug, Clone, Copy)]
pub struct Viewport<'a> {
    pub document: &'a Document,
    pub cursor: &'a Cursor,
    pub scroll: &'a ScrollOffset,
    pub geometry: WindowGeometry,
}

impl<'a> Viewport<'a> {
    #[must_use]
    pub const fn new(
        document: &'a Document,
        cursor: &'a Cursor,
        scroll: &'a ScrollOffset,
        geometry: WindowGeometry,
    ) -> Self {
        Self {
            document,
            cursor,
            scroll,
            geometry,
        }
    }

    /// Paint the complete frame into `frame`.
    ///
    /// # Errors
    ///
    /// Propagates write failures from `frame`.
    pub fn paint(&self, frame: &mut impl Write) -> io::Result<()> {
        ansi::cursor_hide(frame)?;
        ansi::cursor_home(frame)?;

        let rows = self.geometry.rows();
        for screen_row in 0..rows {
            self.paint_row(frame, screen_row)?;
            ansi::erase_line(frame)?;
            if screen_row + 1 < rows {
                frame.write_all(ROW_SEPARATOR)?;
            }
        }

        let (y, x) = self.scroll.screen_position(self.cursor);
        ansi::cursor_to(frame, y, x)?;
        ansi::cursor_show(frame)
    }

    /// Build the frame and send it to `out` in a single write.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from `out`.
    pub fn render(&self, out: &mut impl Write) -> io::Result<usize> {
        let mut frame = OutputBuffer::new();
        self.paint(&mut frame)?;
        frame.flush_to(out)
    }

    fn paint_row(&self, frame: &mut impl Write, screen_row: usize) -> io::Result<()> {
        let file_row = screen_row + self.scroll.rowoff;

        match self.document.row(file_row) {
            Some(line) => {
                let bytes = line.as_bytes();
                let start = self.scroll.coloff.min(bytes.len());
                let end = bytes.len().min(start + self.geometry.cols());
                frame.write_all(&bytes[start..end])
            }
            None if self.document.is_empty() && screen_row == self.geometry.rows() / 3 => {
                paint_banner(frame, self.geometry.cols())
            }
            None => frame.write_all(TILDE),
        }
    }
}

/// Center the welcome banner in `cols` columns, truncating it if needed.
///
/// The left padding starts with a `~` so the banner row still reads as
/// past-the-end.
fn paint_banner(frame: &mut impl Write, cols: usize) -> io::Result<()> {
    let banner = welcome_banner();
    let len = banner.len().min(cols);

    let mut padding = (cols - len) / 2;
    if padding > 0 {
        frame.write_all(TILDE)?;
        padding -= 1;
    }
    for _ in 0..padding {
        frame.write_all(b" ")?;
    }
    frame.write_all(&banner.as_bytes()[..len])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
