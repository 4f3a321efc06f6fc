// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Window geometry — how many rows and columns the terminal has.
//
// The direct path is `ioctl(TIOCGWINSZ)`. Some terminals (and some serial
// lines) answer that with zero columns or not at all, so there is a
// fallback that asks the terminal itself:
//
//   1. `ESC [ 999 C` `ESC [ 999 B`: shove the cursor right and down. The
//      terminal clamps it at the real bottom-right corner.
//   2. `ESC [ 6 n`: ask where the cursor ended up.
//   3. Read the reply `ESC [ rows ; cols R` off the input stream, one byte
//      at a time, up to `R` or 31 bytes.
//   4. Drain one more byte. Some terminals queue a stray byte after the
//      report; left alone it would surface as a ghost keypress.
//
// The probe runs once at startup. There is no SIGWINCH handling: a resized
// window keeps the startup geometry until the viewer is restarted.

use std::io::Write;

use tracing::{debug, warn};

use crate::ansi;
use crate::error::{ProbeError, Result};
use crate::reader::ByteSource;

/// Longest cursor position report we read before giving up on a terminator.
const REPORT_CAP: usize = 31;

// ─── WindowGeometry ─────────────────────────────────────────────────────────

/// Terminal dimensions in character cells. Both are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    /// Number of rows (height in character cells).
    pub rows: u16,
    /// Number of columns (width in character cells).
    pub cols: u16,
}

impl WindowGeometry {
    /// Build a geometry, rejecting zero rows or zero columns.
    #[must_use]
    pub const fn new(rows: u16, cols: u16) -> Option<Self> {
        if rows == 0 || cols == 0 {
            None
        } else {
            Some(Self { rows, cols })
        }
    }

    /// Rows as a `usize`, for index arithmetic.
    #[inline]
    #[must_use]
    pub const fn rows(self) -> usize {
        self.rows as usize
    }

    /// Columns as a `usize`, for index arithmetic.
    #[inline]
    #[must_use]
    pub const fn cols(self) -> usize {
        self.cols as usize
    }
}

// ─── Direct Query ───────────────────────────────────────────────────────────

/// Query the window size via `ioctl(TIOCGWINSZ)` on stdin.
///
/// Returns the raw `(rows, cols)` pair, or `None` if the ioctl fails.
/// Zero values are passed through; [`probe_with`] decides what they mean.
#[cfg(unix)]
#[must_use]
pub fn query_winsize() -> Option<(u16, u16)> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDIN_FILENO, libc::TIOCGWINSZ, &raw mut ws) };
    (result == 0).then_some((ws.ws_row, ws.ws_col))
}

#[cfg(not(unix))]
#[must_use]
pub fn query_winsize() -> Option<(u16, u16)> {
    None
}

// ─── Probe ──────────────────────────────────────────────────────────────────

/// Determine the terminal size, falling back to the cursor-report protocol.
///
/// # Errors
///
/// Returns [`Error::GeometryProbe`](crate::Error::GeometryProbe) if the
/// direct query fails and the fallback cannot write its request, hits a
/// read error, or gets back a malformed report.
pub fn probe(input: &mut impl ByteSource, output: &mut impl Write) -> Result<WindowGeometry> {
    probe_with(query_winsize(), input, output)
}

/// [`probe`] with the direct query's answer supplied by the caller.
///
/// `direct` is what `TIOCGWINSZ` reported, if it succeeded. A report with
/// zero columns (or zero rows) counts as a failure and triggers the
/// fallback.
///
/// # Errors
///
/// See [`probe`].
pub fn probe_with(
    direct: Option<(u16, u16)>,
    input: &mut impl ByteSource,
    output: &mut impl Write,
) -> Result<WindowGeometry> {
    if let Some(geometry) = direct.and_then(|(rows, cols)| WindowGeometry::new(rows, cols)) {
        debug!(rows = geometry.rows, cols = geometry.cols, "window size from ioctl");
        return Ok(geometry);
    }

    warn!(?direct, "TIOCGWINSZ unusable, probing with cursor report");
    let geometry = probe_cursor_report(input, output)?;
    debug!(rows = geometry.rows, cols = geometry.cols, "window size from cursor report");
    Ok(geometry)
}

/// Run the cursor-report fallback protocol.
fn probe_cursor_report(
    input: &mut impl ByteSource,
    output: &mut impl Write,
) -> std::result::Result<WindowGeometry, ProbeError> {
    let mut request = Vec::with_capacity(16);
    // Writing into a Vec cannot fail.
    let _ = ansi::cursor_forward(&mut request, 999);
    let _ = ansi::cursor_down(&mut request, 999);
    let _ = ansi::request_cursor_position(&mut request);

    output.write_all(&request).map_err(ProbeError::Write)?;
    output.flush().map_err(ProbeError::Write)?;

    let mut reply = Vec::with_capacity(REPORT_CAP);
    while reply.len() < REPORT_CAP {
        match input.read_byte().map_err(ProbeError::Read)? {
            Some(b'R') | None => break,
            Some(byte) => reply.push(byte),
        }
    }

    let geometry = parse_cursor_report(&reply)?;

    // Drain whatever single byte the terminal left behind. Bounded by one
    // poll interval; nothing queued is fine.
    if let Some(stray) = input.read_byte().map_err(ProbeError::Read)? {
        debug!(stray, "drained byte after cursor report");
    }

    Ok(geometry)
}

/// Parse a cursor position report body: `ESC [ rows ; cols`.
///
/// The terminating `R` is not part of `reply`.
///
/// # Errors
///
/// Returns [`ProbeError::Malformed`] if the lead-in is missing, either
/// number is absent or not decimal, or either is zero.
pub fn parse_cursor_report(reply: &[u8]) -> std::result::Result<WindowGeometry, ProbeError> {
    let malformed = || ProbeError::Malformed(String::from_utf8_lossy(reply).into_owned());

    let body = reply.strip_prefix(b"\x1b[").ok_or_else(malformed)?;
    let sep = body.iter().position(|&b| b == b';').ok_or_else(malformed)?;
    let rows = parse_decimal(&body[..sep]).ok_or_else(malformed)?;
    let cols = parse_decimal(&body[sep + 1..]).ok_or_else(malformed)?;

    WindowGeometry::new(rows, cols).ok_or_else(malformed)
}

/// Parse a non-empty run of ASCII digits into a `u16`.
fn parse_decimal(digits: &[u8]) -> Option<u16> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    digits.iter().try_fold(0u16, |acc, &d| {
        acc.checked_mul(10)?.checked_add(u16::from(d - b'0'))
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;
    use std::io;

    // ── WindowGeometry ───────────────────────────────────────────────

    #[test]
    fn geometry_rejects_zero() {
        assert_eq!(WindowGeometry::new(0, 80), None);
        assert_eq!(WindowGeometry::new(24, 0), None);
        assert_eq!(
            WindowGeometry::new(24, 80),
            Some(WindowGeometry { rows: 24, cols: 80 })
        );
    }

    #[test]
    fn geometry_usize_accessors() {
        let g = WindowGeometry { rows: 24, cols: 80 };
        assert_eq!(g.rows(), 24);
        assert_eq!(g.cols(), 80);
    }

    #[test]
    fn query_winsize_does_not_panic() {
        let _ = query_winsize();
    }

    // ── Direct path ─────────────────────────────────────────────────

    #[test]
    fn direct_answer_skips_fallback() {
        let mut input: &[u8] = b"";
        let mut output = Vec::new();
        let g = probe_with(Some((50, 132)), &mut input, &mut output).unwrap();
        assert_eq!(g, WindowGeometry { rows: 50, cols: 132 });
        assert!(output.is_empty(), "no escape sequences on the direct path");
    }

    // ── Fallback path ───────────────────────────────────────────────

    #[test]
    fn zero_columns_runs_fallback() {
        let mut input: &[u8] = b"\x1b[40;120R";
        let mut output = Vec::new();
        let g = probe_with(Some((24, 0)), &mut input, &mut output).unwrap();
        assert_eq!(g, WindowGeometry { rows: 40, cols: 120 });
        assert_eq!(output, b"\x1b[999C\x1b[999B\x1b[6n");
    }

    #[test]
    fn failed_ioctl_runs_fallback() {
        let mut input: &[u8] = b"\x1b[24;80R";
        let mut output = Vec::new();
        let g = probe_with(None, &mut input, &mut output).unwrap();
        assert_eq!(g, WindowGeometry { rows: 24, cols: 80 });
    }

    #[test]
    fn fallback_drains_one_stray_byte() {
        let mut input: &[u8] = b"\x1b[24;80R~q";
        let mut output = Vec::new();
        probe_with(None, &mut input, &mut output).unwrap();
        assert_eq!(input, b"q");
    }

    #[test]
    fn read_failure_while_draining_is_probe_error() {
        struct FailAfterReport<'a> {
            bytes: &'a [u8],
        }
        impl ByteSource for FailAfterReport<'_> {
            fn read_byte(&mut self) -> io::Result<Option<u8>> {
                if self.bytes.is_empty() {
                    return Err(io::Error::new(io::ErrorKind::BrokenPipe, "hangup"));
                }
                self.bytes.read_byte()
            }
        }

        let mut input = FailAfterReport {
            bytes: b"\x1b[24;80R",
        };
        let mut output = Vec::new();
        let err = probe_with(None, &mut input, &mut output).unwrap_err();
        assert!(matches!(err, Error::GeometryProbe(ProbeError::Read(_))));
    }

    #[test]
    fn malformed_reply_is_probe_error() {
        let mut input: &[u8] = b"garbage";
        let mut output = Vec::new();
        let err = probe_with(None, &mut input, &mut output).unwrap_err();
        assert!(matches!(err, Error::GeometryProbe(ProbeError::Malformed(_))));
    }

    #[test]
    fn reply_is_capped() {
        let long = [b'9'; 64];
        let mut input: &[u8] = &long;
        let mut output = Vec::new();
        let err = probe_with(None, &mut input, &mut output).unwrap_err();
        assert!(matches!(err, Error::GeometryProbe(ProbeError::Malformed(_))));
        // Reading stops at the cap; no drain after a failed parse.
        assert_eq!(input.len(), 64 - REPORT_CAP);
    }

    #[test]
    fn write_failure_is_probe_error() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut input: &[u8] = b"\x1b[24;80R";
        let err = probe_with(None, &mut input, &mut Broken).unwrap_err();
        assert!(matches!(err, Error::GeometryProbe(ProbeError::Write(_))));
    }

    // ── Report parsing ──────────────────────────────────────────────

    #[test]
    fn parse_report_basic() {
        assert_eq!(
            parse_cursor_report(b"\x1b[40;120").unwrap(),
            WindowGeometry { rows: 40, cols: 120 }
        );
    }

    #[test]
    fn parse_report_rejects_missing_lead_in() {
        assert!(parse_cursor_report(b"[40;120").is_err());
        assert!(parse_cursor_report(b"\x1b40;120").is_err());
    }

    #[test]
    fn parse_report_rejects_bad_numbers() {
        assert!(parse_cursor_report(b"\x1b[40").is_err());
        assert!(parse_cursor_report(b"\x1b[;120").is_err());
        assert!(parse_cursor_report(b"\x1b[40;").is_err());
        assert!(parse_cursor_report(b"\x1b[4a;120").is_err());
        assert!(parse_cursor_report(b"\x1b[0;120").is_err());
        assert!(parse_cursor_report(b"\x1b[99999;120").is_err());
    }

    #[test]
    fn parse_decimal_cases() {
        assert_eq!(parse_decimal(b"0"), Some(0));
        assert_eq!(parse_decimal(b"65535"), Some(65535));
        assert_eq!(parse_decimal(b"65536"), None);
        assert_eq!(parse_decimal(b""), None);
        assert_eq!(parse_decimal(b"-1"), None);
    }
}
