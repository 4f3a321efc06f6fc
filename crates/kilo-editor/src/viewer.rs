//! Viewer — the application state the event loop drives.
//!
//! Ties a [`Document`] to a [`Cursor`] and a [`ScrollOffset`] for a fixed
//! window size. Keys move the cursor; every refresh re-clamps the scroll
//! offset and repaints the whole viewport.

use std::io;

use tracing::trace;

use kilo_term::event_loop::{Action, App};
use kilo_term::geometry::WindowGeometry;
use kilo_term::input::Key;
use kilo_term::output::OutputBuffer;

use crate::cursor::{Cursor, Direction};
use crate::document::Document;
use crate::scroll::ScrollOffset;
use crate::view::Viewport;

/// The quit key: Ctrl-Q.
pub const QUIT: Key = Key::ctrl(b'q');

/// A read-only view of one document.
#[derive(Debug, Clone)]
pub struct Viewer {
    document: Document,
    cursor: Cursor,
    scroll: ScrollOffset,
    geometry: WindowGeometry,
}

impl Viewer {
    /// Start at the top-left of `document`.
    #[must_use]
    pub const fn new(document: Document, geometry: WindowGeometry) -> Self {
        Self {
            document,
            cursor: Cursor::new(),
            scroll: ScrollOffset::new(),
            geometry,
        }
    }

    // -- Accessors ----------------------------------------------------------

    #[inline]
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    #[inline]
    #[must_use]
    pub const fn scroll(&self) -> ScrollOffset {
        self.scroll
    }

    #[inline]
    #[must_use]
    pub const fn geometry(&self) -> WindowGeometry {
        self.geometry
    }

    // -- Keys ---------------------------------------------------------------

    /// Apply one key.
    ///
    /// Ctrl-Q quits. Arrows, paging, `Home`, and `End` move the cursor.
    /// Everything else, including plain characters, is ignored.
    pub fn process_key(&mut self, key: Key) -> Action {
        let num_rows = self.document.num_rows();

        match key {
            QUIT => return Action::Quit,
            Key::ArrowLeft => self.cursor.step(Direction::Left, num_rows),
            Key::ArrowRight => self.cursor.step(Direction::Right, num_rows),
            Key::ArrowUp => self.cursor.step(Direction::Up, num_rows),
            Key::ArrowDown => self.cursor.step(Direction::Down, num_rows),
            Key::PageUp => self.cursor.page_up(self.geometry),
            Key::PageDown => self.cursor.page_down(self.geometry, num_rows),
            Key::Home => self.cursor.home(),
            Key::End => self.cursor.end(self.geometry),
            Key::Char(_) | Key::Delete | Key::Escape => {}
        }

        trace!(?key, cx = self.cursor.cx, cy = self.cursor.cy, "key applied");
        Action::Continue
    }

    // -- Rendering ----------------------------------------------------------

    /// Bring the cursor into view and paint the frame into `frame`.
    ///
    /// # Errors
    ///
    /// Propagates write failures from `frame`.
    pub fn refresh(&mut self, frame: &mut OutputBuffer) -> io::Result<()> {
        self.scroll.recompute(&self.cursor, self.geometry);
        Viewport::new(&self.document, &self.cursor, &self.scroll, self.geometry).paint(frame)
    }
}

impl App for Viewer {
    fn on_key(&mut self, key: Key) -> Action {
        self.process_key(key)
    }

    fn paint(&mut self, frame: &mut OutputBuffer) -> io::Result<()> {
        self.refresh(frame)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
