// SPDX-License-Identifier: MIT
//
// Event loop — render, decode, apply, forever.
//
// One thread, one input source, one writer. Each turn of the loop:
//
//   1. The application paints a complete frame into an `OutputBuffer`.
//   2. The frame goes to the terminal in a single write.
//   3. The decoder waits for the next key, polling the terminal in
//      100ms steps until a byte shows up.
//   4. The application applies the key and says whether to keep going.
//
// There is no dirty tracking and no diffing: every turn redraws the whole
// screen, and the single write is what keeps that flicker-free. The only
// suspension point is the poll inside the decoder, and the only way out is
// the application returning `Action::Quit` (or a fatal error).

use std::io::Write;

use tracing::{debug, info};

use crate::ansi;
use crate::error::{Error, Result};
use crate::geometry::{self, WindowGeometry};
use crate::input::{Key, KeyDecoder};
use crate::output::{OutputBuffer, TtyOutput};
use crate::reader::{ByteSource, TtyInput};
use crate::terminal::{RawModeOptions, RawModeSession};

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the application tells the event loop to do after handling a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Continue running.
    Continue,
    /// Exit the event loop cleanly.
    Quit,
}

/// Application interface for the event loop.
pub trait App {
    /// Handle one decoded key.
    ///
    /// Return [`Action::Quit`] to exit the event loop.
    fn on_key(&mut self, key: Key) -> Action;

    /// Paint the complete current frame into `frame`.
    ///
    /// The buffer is empty when this is called. Everything painted is
    /// written to the terminal in one piece afterwards.
    ///
    /// # Errors
    ///
    /// Propagates failures from the escape writers. Painting into an
    /// `OutputBuffer` does not fail in practice.
    fn paint(&mut self, frame: &mut OutputBuffer) -> std::io::Result<()>;
}

// ─── Loop Config ─────────────────────────────────────────────────────────────

/// Configuration for [`EventLoop::with_config`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopConfig {
    /// How the terminal is put into raw mode, including the poll interval.
    pub raw_mode: RawModeOptions,
}

// ─── EventLoop ───────────────────────────────────────────────────────────────

/// The render → decode → apply loop.
///
/// Owns the raw-mode session (when driving a real terminal), the key
/// decoder, the output writer, the frame buffer, and the startup geometry.
///
/// # Example
///
/// ```no_run
/// use kilo_term::event_loop::{Action, App, EventLoop};
/// use kilo_term::input::Key;
/// use kilo_term::output::OutputBuffer;
///
/// struct Blank;
///
/// impl App for Blank {
///     fn on_key(&mut self, key: Key) -> Action {
///         if key == Key::ctrl(b'q') { Action::Quit } else { Action::Continue }
///     }
///
///     fn paint(&mut self, _frame: &mut OutputBuffer) -> std::io::Result<()> {
///         Ok(())
///     }
/// }
///
/// let mut event_loop = EventLoop::new()?;
/// event_loop.run(&mut Blank)?;
/// event_loop.shutdown()?;
/// # Ok::<(), kilo_term::Error>(())
/// ```
pub struct EventLoop<S = TtyInput, W = TtyOutput> {
    session: Option<RawModeSession>,
    decoder: KeyDecoder<S>,
    output: W,
    frame: OutputBuffer,
    geometry: WindowGeometry,
}

impl EventLoop {
    /// Take over the controlling terminal with default configuration.
    ///
    /// # Errors
    ///
    /// See [`with_config`](Self::with_config).
    pub fn new() -> Result<Self> {
        Self::with_config(LoopConfig::default())
    }

    /// Take over the controlling terminal.
    ///
    /// Enables raw mode first (the geometry fallback needs unbuffered,
    /// unechoed input), then probes the window size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TerminalControl`] if raw mode cannot be enabled and
    /// [`Error::GeometryProbe`] if the window size cannot be determined.
    /// Raw mode is already restored when either comes back.
    pub fn with_config(config: LoopConfig) -> Result<Self> {
        let session = RawModeSession::enable(config.raw_mode)?;
        let mut input = TtyInput::stdin();
        let mut output = TtyOutput::stdout();
        let geometry = geometry::probe(&mut input, &mut output)?;
        info!(rows = geometry.rows, cols = geometry.cols, "terminal ready");

        Ok(Self {
            session: Some(session),
            decoder: KeyDecoder::new(input),
            output,
            frame: OutputBuffer::new(),
            geometry,
        })
    }
}

impl<S: ByteSource, W: Write> EventLoop<S, W> {
    /// A loop over arbitrary input and output, without touching the
    /// terminal's attributes. Used for scripted sessions.
    #[must_use]
    pub fn headless(input: S, output: W, geometry: WindowGeometry) -> Self {
        Self {
            session: None,
            decoder: KeyDecoder::new(input),
            output,
            frame: OutputBuffer::new(),
            geometry,
        }
    }

    /// The window size probed at startup.
    #[inline]
    #[must_use]
    pub const fn geometry(&self) -> WindowGeometry {
        self.geometry
    }

    /// The output writer (for inspecting scripted sessions).
    #[must_use]
    pub const fn output(&self) -> &W {
        &self.output
    }

    /// Run until the application returns [`Action::Quit`].
    ///
    /// On quit the screen is cleared and the cursor sent home; the frame
    /// that was on screen is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if writing a frame or reading a key fails.
    pub fn run(&mut self, app: &mut impl App) -> Result<()> {
        loop {
            self.frame.clear();
            app.paint(&mut self.frame)
                .map_err(|e| Error::io("render", e))?;
            self.frame
                .flush_to(&mut self.output)
                .map_err(|e| Error::io("write", e))?;

            let key = self.decoder.next_key()?;
            if app.on_key(key) == Action::Quit {
                debug!("quit requested");
                return self.clear_screen();
            }
        }
    }

    /// Restore the terminal's original attributes.
    ///
    /// Idempotent, and a no-op for headless loops. Dropping the loop does
    /// the same thing; this exists so the caller can observe the error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TerminalControl`] if `tcsetattr` fails.
    pub fn shutdown(&mut self) -> Result<()> {
        match self.session.as_mut() {
            Some(session) => session.disable(),
            None => Ok(()),
        }
    }

    /// Clear the screen and home the cursor, in one write.
    fn clear_screen(&mut self) -> Result<()> {
        self.frame.clear();
        ansi::clear_screen(&mut self.frame)
            .and_then(|()| ansi::cursor_home(&mut self.frame))
            .and_then(|()| self.frame.flush_to(&mut self.output))
            .map(|_| ())
            .map_err(|e| Error::io("write", e))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io;

    const GEOMETRY: WindowGeometry = WindowGeometry { rows: 3, cols: 10 };

    /// Counts keys and paints the count; quits on Ctrl-Q.
    #[derive(Default)]
    struct Counter {
        keys: Vec<Key>,
        paints: usize,
    }

    impl App for Counter {
        fn on_key(&mut self, key: Key) -> Action {
            if key == Key::ctrl(b'q') {
                return Action::Quit;
            }
            self.keys.push(key);
            Action::Continue
        }

        fn paint(&mut self, frame: &mut OutputBuffer) -> io::Result<()> {
            self.paints += 1;
            write!(frame, "[{}]", self.keys.len())
        }
    }

    /// Writer that records each write call separately.
    #[derive(Default)]
    struct Writes(Vec<Vec<u8>>);

    impl Write for Writes {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    // ── Config / Action ──────────────────────────────────────────

    #[test]
    fn default_config_uses_default_raw_mode() {
        assert_eq!(LoopConfig::default().raw_mode, RawModeOptions::default());
    }

    #[test]
    fn action_equality() {
        assert_eq!(Action::Continue, Action::Continue);
        assert_ne!(Action::Continue, Action::Quit);
    }

    // ── Headless sessions ────────────────────────────────────────

    #[test]
    fn quit_immediately() {
        let mut app = Counter::default();
        let mut event_loop = EventLoop::headless(&b"\x11"[..], Vec::new(), GEOMETRY);
        event_loop.run(&mut app).unwrap();

        assert_eq!(app.paints, 1);
        assert_eq!(event_loop.output(), b"[0]\x1b[2J\x1b[H");
    }

    #[test]
    fn paint_before_every_key() {
        let mut app = Counter::default();
        let mut event_loop = EventLoop::headless(&b"ab\x1b[A\x11"[..], Vec::new(), GEOMETRY);
        event_loop.run(&mut app).unwrap();

        assert_eq!(app.keys, vec![Key::Char(b'a'), Key::Char(b'b'), Key::ArrowUp]);
        assert_eq!(app.paints, 4);
        assert_eq!(event_loop.output(), b"[0][1][2][3]\x1b[2J\x1b[H");
    }

    #[test]
    fn one_write_per_frame() {
        let mut app = Counter::default();
        let mut event_loop = EventLoop::headless(&b"xy\x11"[..], Writes::default(), GEOMETRY);
        event_loop.run(&mut app).unwrap();

        let writes = &event_loop.output().0;
        // Three frames plus the final clear.
        assert_eq!(writes.len(), 4);
        assert_eq!(writes[0], b"[0]");
        assert_eq!(writes[3], b"\x1b[2J\x1b[H");
    }

    #[test]
    fn read_failure_ends_loop() {
        struct Broken;
        impl ByteSource for Broken {
            fn read_byte(&mut self) -> io::Result<Option<u8>> {
                Err(io::Error::other("hangup"))
            }
        }

        let mut app = Counter::default();
        let mut event_loop = EventLoop::headless(Broken, Vec::new(), GEOMETRY);
        let err = event_loop.run(&mut app).unwrap_err();
        assert!(matches!(err, Error::Io { op: "read", .. }));
    }

    #[test]
    fn headless_shutdown_is_noop() {
        let mut event_loop = EventLoop::headless(&b""[..], Vec::new(), GEOMETRY);
        event_loop.shutdown().unwrap();
        event_loop.shutdown().unwrap();
        assert_eq!(event_loop.geometry(), GEOMETRY);
    }
}
