//! Cursor — logical position in the document.
//!
//! The `Cursor` holds a column (`cx`) and a row (`cy`) in document
//! coordinates, not screen coordinates. Mapping it onto the screen is the
//! scroll offset's job.
//!
//! # Bounds
//!
//! - `cy` ranges over `0..=num_rows`. One past the last line is reachable,
//!   so the cursor can sit on the empty row below the document.
//! - `cx` has a lower bound of 0 and **no upper bound**. Moving right never
//!   stops at the end of a line or at the screen edge; the horizontal
//!   scroll offset follows the cursor instead. `End` is the exception and
//!   jumps to the last screen column.

use kilo_term::geometry::WindowGeometry;

/// One step of cursor motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// A cursor in a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Column (byte offset within the row).
    pub cx: usize,
    /// Row index.
    pub cy: usize,
}

impl Cursor {
    /// Create a cursor at the origin.
    #[must_use]
    pub const fn new() -> Self {
        Self { cx: 0, cy: 0 }
    }

    /// Create a cursor at a specific position.
    #[must_use]
    pub const fn at(cx: usize, cy: usize) -> Self {
        Self { cx, cy }
    }

    // -- Movement -----------------------------------------------------------

    /// Move one step in `direction` within a document of `num_rows` rows.
    pub const fn step(&mut self, direction: Direction, num_rows: usize) {
        match direction {
            Direction::Left => {
                if self.cx != 0 {
                    self.cx -= 1;
                }
            }
            Direction::Right => self.cx += 1,
            Direction::Up => {
                if self.cy != 0 {
                    self.cy -= 1;
                }
            }
            Direction::Down => {
                if self.cy < num_rows {
                    self.cy += 1;
                }
            }
        }
    }

    /// Move one screenful up: `rows` single steps up.
    pub fn page_up(&mut self, geometry: WindowGeometry) {
        for _ in 0..geometry.rows {
            self.step(Direction::Up, 0);
        }
    }

    /// Move one screenful down: `rows` single steps down.
    pub fn page_down(&mut self, geometry: WindowGeometry, num_rows: usize) {
        for _ in 0..geometry.rows {
            self.step(Direction::Down, num_rows);
        }
    }

    /// Jump to column 0.
    pub const fn home(&mut self) {
        self.cx = 0;
    }

    /// Jump to the last screen column.
    pub const fn end(&mut self, geometry: WindowGeometry) {
        self.cx = geometry.cols().saturating_sub(1);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
