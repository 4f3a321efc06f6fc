// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Byte sources — where the key decoder gets its input.
//
// The terminal is read one byte at a time. Raw mode configures the tty so
// that `read(2)` returns as soon as a byte is available or after the poll
// interval (100ms by default) with nothing at all. That turns a plain
// blocking read into a synchronous poll with a timeout: no reader thread,
// no event loop machinery, one I/O source and one consumer.
//
// `ByteSource` captures exactly that contract. `TtyInput` is the real
// terminal; `&[u8]` is a scripted stream for tests, where running out of
// bytes looks the same as a poll interval passing with no input.

use std::io;

/// A byte stream read with a bounded wait.
pub trait ByteSource {
    /// Read a single byte.
    ///
    /// Returns `Ok(Some(byte))` when one arrived, `Ok(None)` when the poll
    /// interval elapsed with no data.
    ///
    /// # Errors
    ///
    /// Returns an error for genuine I/O failures only. "No data yet"
    /// conditions (`EAGAIN`, `EINTR`, zero-byte reads) are `Ok(None)`.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

impl ByteSource for &[u8] {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.split_first().map(|(&byte, rest)| {
            *self = rest;
            byte
        }))
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }
}

/// The controlling terminal's input, read from stdin's file descriptor.
///
/// The timeout behavior comes from the termios `VMIN`/`VTIME` settings
/// applied by [`RawModeSession`](crate::terminal::RawModeSession); this
/// type just interprets the results of `read(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TtyInput {
    _private: (),
}

impl TtyInput {
    /// A source reading file descriptor 0.
    #[must_use]
    pub const fn stdin() -> Self {
        Self { _private: () }
    }
}

impl ByteSource for TtyInput {
    #[cfg(unix)]
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = 0u8;
        let n = unsafe {
            libc::read(
                libc::STDIN_FILENO,
                (&raw mut byte).cast::<libc::c_void>(),
                1,
            )
        };

        match n {
            1 => Ok(Some(byte)),
            0 => Ok(None),
            _ => {
                let err = io::Error::last_os_error();
                match err.kind() {
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => Ok(None),
                    _ => Err(err),
                }
            }
        }
    }

    #[cfg(not(unix))]
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        use std::io::Read;

        let mut byte = [0u8; 1];
        match io::stdin().lock().read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
