// SPDX-License-Identifier: MIT
//
// Key decoding.
//
// Turns the raw terminal byte stream into logical keys. Each call to
// `KeyDecoder::next_key` starts fresh: it waits for one byte, and if that
// byte is ESC it tries to read the rest of an escape sequence right there.
// Nothing carries over between calls.
//
// Recognized sequences:
//
//   ESC [ A / B / C / D     arrows
//   ESC [ H / F             Home / End
//   ESC [ 1 ~ / 7 ~         Home
//   ESC [ 4 ~ / 8 ~         End
//   ESC [ 3 ~               Delete
//   ESC [ 5 ~ / 6 ~         PageUp / PageDown
//   ESC O H / F             Home / End (SS3 form)
//
// Anything else starting with ESC decodes to `Key::Escape`, and the bytes
// already read for it are dropped.
//
// # Timing
//
// Each follow-up read waits at most one poll interval (100ms in raw mode).
// A terminal that dribbles a sequence slower than that gets a bare Escape
// followed by the tail as ordinary characters. That is accepted: an
// incomplete sequence is never an error and never blocks.

use tracing::trace;

use crate::error::{Error, Result};
use crate::reader::ByteSource;

/// The escape byte that starts every control sequence.
pub const ESC: u8 = 0x1b;

// ─── Key ────────────────────────────────────────────────────────────────────

/// A logical key produced by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Any byte that is not the start of an escape sequence, including
    /// control bytes like Ctrl-Q (`0x11`).
    Char(u8),
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    PageUp,
    PageDown,
    Home,
    End,
    Delete,
    /// A lone ESC, or an escape sequence we do not recognize.
    Escape,
}

impl Key {
    /// The byte a terminal sends for Ctrl plus `letter`.
    ///
    /// Ctrl clears the upper three bits, so `Key::ctrl(b'q')` is
    /// `Key::Char(0x11)`.
    #[must_use]
    pub const fn ctrl(letter: u8) -> Self {
        Self::Char(letter & 0x1f)
    }
}

// ─── KeyDecoder ─────────────────────────────────────────────────────────────

/// Decoder from raw bytes to [`Key`]s.
///
/// Also an [`Iterator`] over `Result<Key>` that never ends: each `next`
/// blocks (in poll-interval steps) until a key arrives.
///
/// # Example
///
/// ```
/// use kilo_term::input::{Key, KeyDecoder};
///
/// let mut keys = KeyDecoder::new(&b"\x1b[5~x"[..]);
/// assert_eq!(keys.next_key()?, Key::PageUp);
/// assert_eq!(keys.next_key()?, Key::Char(b'x'));
/// # Ok::<(), kilo_term::Error>(())
/// ```
pub struct KeyDecoder<S> {
    source: S,
}

impl<S: ByteSource> KeyDecoder<S> {
    /// Wrap a byte source.
    #[must_use]
    pub const fn new(source: S) -> Self {
        Self { source }
    }

    /// The underlying source.
    #[must_use]
    pub const fn get_ref(&self) -> &S {
        &self.source
    }

    /// Give back the underlying source.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Wait for the next key.
    ///
    /// Retries "no data yet" reads indefinitely, one poll interval at a
    /// time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if reading the first byte fails for any reason
    /// other than "no data yet". Failures while reading the rest of an
    /// escape sequence are not errors; they decode to [`Key::Escape`].
    pub fn next_key(&mut self) -> Result<Key> {
        let first = loop {
            match self.source.read_byte() {
                Ok(Some(byte)) => break byte,
                Ok(None) => {}
                Err(e) => return Err(Error::io("read", e)),
            }
        };

        let key = if first == ESC {
            self.decode_escape()
        } else {
            Key::Char(first)
        };
        trace!(?key, "decoded key");
        Ok(key)
    }

    /// Decode what follows an ESC.
    fn decode_escape(&mut self) -> Key {
        let Some(lead) = self.follow() else {
            return Key::Escape;
        };
        let Some(second) = self.follow() else {
            return Key::Escape;
        };

        match lead {
            b'[' if second.is_ascii_digit() => {
                let Some(third) = self.follow() else {
                    return Key::Escape;
                };
                if third == b'~' {
                    tilde_key(second)
                } else {
                    Key::Escape
                }
            }
            b'[' => csi_key(second),
            b'O' => ss3_key(second),
            _ => Key::Escape,
        }
    }

    /// Read one byte of an escape sequence. A timeout or a read error both
    /// end the sequence.
    fn follow(&mut self) -> Option<u8> {
        match self.source.read_byte() {
            Ok(byte) => byte,
            Err(e) => {
                trace!(error = %e, "read failed inside escape sequence");
                None
            }
        }
    }
}

impl<S: ByteSource> Iterator for KeyDecoder<S> {
    type Item = Result<Key>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_key())
    }
}

// ─── Sequence Tables ────────────────────────────────────────────────────────

/// `ESC [ <digit> ~`
const fn tilde_key(digit: u8) -> Key {
    match digit {
        b'1' | b'7' => Key::Home,
        b'3' => Key::Delete,
        b'4' | b'8' => Key::End,
        b'5' => Key::PageUp,
        b'6' => Key::PageDown,
        _ => Key::Escape,
    }
}

/// `ESC [ <letter>`
const fn csi_key(letter: u8) -> Key {
    match letter {
        b'A' => Key::ArrowUp,
        b'B' => Key::ArrowDown,
        b'C' => Key::ArrowRight,
        b'D' => Key::ArrowLeft,
        b'H' => Key::Home,
        b'F' => Key::End,
        _ => Key::Escape,
    }
}

/// `ESC O <letter>`
const fn ss3_key(letter: u8) -> Key {
    match letter {
        b'H' => Key::Home,
        b'F' => Key::End,
        _ => Key::Escape,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
