//! Scroll offset — which document cell sits at the screen's top-left.
//!
//! Recomputed before every frame so that the cursor is on screen:
//!
//! ```text
//! rowoff <= cy <= rowoff + rows - 1
//! coloff <= cx <= coloff + cols - 1
//! ```
//!
//! The adjustment is minimal: the viewport moves just far enough to bring
//! the cursor to the nearest edge. It never re-centers.

use kilo_term::geometry::WindowGeometry;

use crate::cursor::Cursor;

/// Row and column scroll offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollOffset {
    /// First document row shown on screen.
    pub rowoff: usize,
    /// First byte column shown on screen.
    pub coloff: usize,
}

impl ScrollOffset {
    /// No scrolling.
    #[must_use]
    pub const fn new() -> Self {
        Self { rowoff: 0, coloff: 0 }
    }

    /// Adjust the offsets so `cursor` is inside the viewport.
    ///
    /// Rows first, then columns. Idempotent: a second call with the same
    /// cursor changes nothing.
    pub const fn recompute(&mut self, cursor: &Cursor, geometry: WindowGeometry) {
        let rows = geometry.rows();
        let cols = geometry.cols();

        if cursor.cy < self.rowoff {
            self.rowoff = cursor.cy;
        }
        if cursor.cy >= self.rowoff + rows {
            self.rowoff = cursor.cy + 1 - rows;
        }

        if cursor.cx < self.coloff {
            self.coloff = cursor.cx;
        }
        if cursor.cx >= self.coloff + cols {
            self.coloff = cursor.cx + 1 - cols;
        }
    }

    /// The cursor's position on screen (0-indexed row, column).
    ///
    /// Only meaningful after [`recompute`](Self::recompute).
    #[must_use]
    pub const fn screen_position(&self, cursor: &Cursor) -> (usize, usize) {
        (
            cursor.cy.saturating_sub(self.rowoff),
            cursor.cx.saturating_sub(self.coloff),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
