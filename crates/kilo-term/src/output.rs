// SPDX-License-Identifier: MIT
//
// Output buffering and the raw terminal writer.
//
// Two components work together so that a frame reaches the terminal in
// one piece:
//
//   OutputBuffer — accumulates every byte of a frame (escapes and text) in
//   memory. Nothing touches the terminal while a frame is being composed,
//   so the terminal never shows a half-drawn screen.
//
//   TtyOutput — writes straight to file descriptor 1 with `write(2)`.
//   `io::Stdout` is line-buffered and would split a frame at every
//   newline; going to the fd directly keeps one frame to one syscall.
#![allow(unsafe_code)]

use std::io::{self, Write};

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// A byte buffer that accumulates one frame for a single write.
///
/// Built fresh each refresh (via [`clear`](Self::clear), which keeps the
/// allocation), handed to the terminal once, then discarded.
///
/// Default capacity: 16 KB, enough for a full 80×24 frame many times over.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 16_384;

impl OutputBuffer {
    /// Create an empty buffer with default capacity (16 KB).
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes (for testing and debugging).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Clear the buffer for reuse (keeps allocated capacity).
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Hand the whole frame to `w` in one `write_all`, then clear.
    ///
    /// Returns the number of bytes written. An empty buffer writes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<usize> {
        let n = self.buf.len();
        if n > 0 {
            w.write_all(&self.buf)?;
            w.flush()?;
            self.buf.clear();
        }
        Ok(n)
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // No-op. The frame leaves through flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── TtyOutput ───────────────────────────────────────────────────────────────

/// Unbuffered writer on stdout's file descriptor.
#[derive(Debug, Default, Clone, Copy)]
pub struct TtyOutput {
    _private: (),
}

impl TtyOutput {
    /// A writer for file descriptor 1.
    #[must_use]
    pub const fn stdout() -> Self {
        Self { _private: () }
    }
}

impl Write for TtyOutput {
    #[cfg(unix)]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        loop {
            let n = unsafe {
                libc::write(
                    libc::STDOUT_FILENO,
                    buf.as_ptr().cast::<libc::c_void>(),
                    buf.len(),
                )
            };
            if n >= 0 {
                #[allow(clippy::cast_sign_loss)] // n >= 0 checked above.
                return Ok(n as usize);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    #[cfg(not(unix))]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
