// SPDX-License-Identifier: MIT
//
// Error taxonomy for terminal I/O.
//
// Every variant is fatal at the point it occurs. Nothing in this crate
// retries or degrades: errors travel up with `?` to the binary's single
// top-level handler, which clears the screen, lets the raw-mode session
// restore the terminal, prints the diagnostic, and exits with status 1.
//
// Partial escape sequences are *not* errors. The key decoder resolves
// those locally into `Key::Escape` and never reports them here.

use std::io;

use thiserror::Error;

/// Fatal terminal I/O failure.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing the terminal attributes (`tcgetattr`/`tcsetattr`)
    /// failed.
    #[error("{op}: {source}")]
    TerminalControl {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// Neither the `TIOCGWINSZ` query nor the cursor-report fallback
    /// produced a usable window size.
    #[error("getWindowSize: {0}")]
    GeometryProbe(#[from] ProbeError),

    /// A `read(2)`/`write(2)` on the terminal failed with something other
    /// than "no data yet".
    #[error("{op}: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) const fn control(op: &'static str, source: io::Error) -> Self {
        Self::TerminalControl { op, source }
    }

    pub(crate) const fn io(op: &'static str, source: io::Error) -> Self {
        Self::Io { op, source }
    }
}

/// Why the cursor-position fallback could not determine the window size.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("cursor move/query write failed: {0}")]
    Write(#[source] io::Error),

    #[error("cursor position report read failed: {0}")]
    Read(#[source] io::Error),

    #[error("malformed cursor position report {0:?}")]
    Malformed(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_control_names_operation() {
        let err = Error::control("tcgetattr", io::Error::from_raw_os_error(25));
        let msg = err.to_string();
        assert!(msg.starts_with("tcgetattr: "), "{msg}");
    }

    #[test]
    fn io_names_operation() {
        let err = Error::io("read", io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert_eq!(err.to_string(), "read: gone");
    }

    #[test]
    fn probe_error_converts() {
        let err: Error = ProbeError::Malformed("x".into()).into();
        assert!(matches!(err, Error::GeometryProbe(ProbeError::Malformed(_))));
        assert!(err.to_string().starts_with("getWindowSize: "));
    }

    #[test]
    fn source_is_preserved() {
        use std::error::Error as _;
        let err = Error::io("write", io::Error::other("disk"));
        assert!(err.source().is_some());
    }
}
