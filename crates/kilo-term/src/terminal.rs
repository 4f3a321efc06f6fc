// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode and guaranteed restoration.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr). These are the standard POSIX interfaces for
// terminal control; there is no safe alternative. Each unsafe block is
// minimal.
#![allow(unsafe_code)]
//
// A `RawModeSession` captures the terminal attributes exactly once, applies
// a raw attribute set derived from `RawModeOptions`, and restores the
// captured snapshot exactly once: explicitly through `disable`, on drop, or
// from the panic hook. Whatever path the process takes out, the user gets
// their terminal back.
//
// The panic hook cannot reach the session struct, so the snapshot is also
// parked in a global backup. The hook restores from there, then hands over
// to the original hook so the panic message prints to a working terminal.

#[cfg(unix)]
use std::os::fd::RawFd;
use std::sync::{Mutex, Once};
use std::time::Duration;

use bitflags::bitflags;
use tracing::debug;

use crate::error::{Error, Result};

// ─── RawModeOptions ─────────────────────────────────────────────────────────

bitflags! {
    /// Line-discipline behaviors a raw-mode session can switch off.
    ///
    /// Each flag names what the terminal driver does on our behalf; the
    /// session clears the corresponding termios bit for every flag set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LineDiscipline: u16 {
        /// Local echo of typed bytes (`ECHO`).
        const ECHO              = 1 << 0;
        /// Line-buffered input (`ICANON`).
        const CANONICAL         = 1 << 1;
        /// Ctrl-C / Ctrl-Z / Ctrl-\ generate signals (`ISIG`).
        const SIGNALS           = 1 << 2;
        /// Ctrl-V literal-next and friends (`IEXTEN`).
        const EXTENDED_INPUT    = 1 << 3;
        /// Ctrl-S / Ctrl-Q software flow control (`IXON`).
        const FLOW_CONTROL      = 1 << 4;
        /// Carriage return translated to newline on input (`ICRNL`).
        const CR_TO_NL          = 1 << 5;
        /// Break condition raises SIGINT (`BRKINT`).
        const BREAK_INTERRUPT   = 1 << 6;
        /// Input parity checking (`INPCK`).
        const PARITY_CHECK      = 1 << 7;
        /// Eighth bit of each input byte stripped (`ISTRIP`).
        const STRIP_HIGH_BIT    = 1 << 8;
        /// Output post-processing, e.g. `\n` → `\r\n` (`OPOST`).
        const OUTPUT_PROCESSING = 1 << 9;
    }
}

/// How the terminal should behave while a [`RawModeSession`] is active.
///
/// The default is the viewer's raw mode: every [`LineDiscipline`] behavior
/// off, 8-bit characters, and a read that returns after at most 100ms
/// with zero or more bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawModeOptions {
    /// Behaviors to switch off.
    pub disable: LineDiscipline,
    /// Longest a `read(2)` waits for input (`VTIME`, tenths of a second).
    pub read_timeout: Duration,
    /// Bytes a `read(2)` waits for before returning (`VMIN`).
    pub read_min: u8,
}

impl Default for RawModeOptions {
    fn default() -> Self {
        Self {
            disable: LineDiscipline::all(),
            read_timeout: Duration::from_millis(100),
            read_min: 0,
        }
    }
}

impl RawModeOptions {
    /// The read timeout in deciseconds, as termios `VTIME` wants it.
    ///
    /// Clamped to `0..=255`.
    #[must_use]
    pub fn vtime(&self) -> u8 {
        u8::try_from(self.read_timeout.as_millis() / 100).unwrap_or(u8::MAX)
    }

    /// Derive the raw attribute set from a captured snapshot.
    ///
    /// Only the bits named by `disable` are cleared; everything else in
    /// `original` carries over. Character size is always forced to 8 bits.
    #[cfg(unix)]
    #[must_use]
    pub fn apply(&self, original: &libc::termios) -> libc::termios {
        let mut raw = *original;
        let off = self.disable;

        let mut iflag: libc::tcflag_t = 0;
        if off.contains(LineDiscipline::BREAK_INTERRUPT) {
            iflag |= libc::BRKINT;
        }
        if off.contains(LineDiscipline::PARITY_CHECK) {
            iflag |= libc::INPCK;
        }
        if off.contains(LineDiscipline::STRIP_HIGH_BIT) {
            iflag |= libc::ISTRIP;
        }
        if off.contains(LineDiscipline::CR_TO_NL) {
            iflag |= libc::ICRNL;
        }
        if off.contains(LineDiscipline::FLOW_CONTROL) {
            iflag |= libc::IXON;
        }

        let mut lflag: libc::tcflag_t = 0;
        if off.contains(LineDiscipline::ECHO) {
            lflag |= libc::ECHO;
        }
        if off.contains(LineDiscipline::CANONICAL) {
            lflag |= libc::ICANON;
        }
        if off.contains(LineDiscipline::SIGNALS) {
            lflag |= libc::ISIG;
        }
        if off.contains(LineDiscipline::EXTENDED_INPUT) {
            lflag |= libc::IEXTEN;
        }

        raw.c_iflag &= !iflag;
        raw.c_lflag &= !lflag;
        if off.contains(LineDiscipline::OUTPUT_PROCESSING) {
            raw.c_oflag &= !libc::OPOST;
        }
        raw.c_cflag |= libc::CS8;

        raw.c_cc[libc::VMIN] = self.read_min;
        raw.c_cc[libc::VTIME] = self.vtime();
        raw
    }
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of the captured termios (and the fd it belongs to) for
/// panic recovery.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<(RawFd, libc::termios)>> = Mutex::new(None);

/// Panic hook guard: ensures the hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some((fd, ref original)) = *guard {
            unsafe {
                let _ = libc::tcsetattr(fd, libc::TCSAFLUSH, original);
            }
        }
    }
}

/// Install a panic hook that restores the terminal before printing the error.
///
/// Without this, a panic in raw mode leaves the user's terminal with no
/// echo and no line editing, and the panic message staircases across the
/// screen because output processing is off.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

// ─── RawModeSession ─────────────────────────────────────────────────────────

/// Exclusive raw-mode control of the terminal, restored on every exit path.
///
/// # Example
///
/// ```no_run
/// use kilo_term::terminal::{RawModeOptions, RawModeSession};
///
/// let mut session = RawModeSession::enable(RawModeOptions::default())?;
/// // ... read keys, draw frames ...
/// session.disable()?; // or just let it drop
/// # Ok::<(), kilo_term::Error>(())
/// ```
pub struct RawModeSession {
    /// The terminal whose attributes were captured.
    #[cfg(unix)]
    fd: RawFd,
    /// Attributes captured at session start. `None` once restored.
    #[cfg(unix)]
    original: Option<libc::termios>,
}

impl RawModeSession {
    /// Capture stdin's terminal attributes and switch it to raw mode.
    ///
    /// # Errors
    ///
    /// See [`enable_on`](Self::enable_on).
    #[cfg(unix)]
    pub fn enable(options: RawModeOptions) -> Result<Self> {
        Self::enable_on(libc::STDIN_FILENO, options)
    }

    /// Capture the attributes of the terminal on `fd` and switch it to raw
    /// mode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TerminalControl`] if the attributes cannot be read
    /// (`tcgetattr`, e.g. `fd` is not a terminal) or the raw set cannot be
    /// applied (`tcsetattr`). Nothing is left modified on failure.
    #[cfg(unix)]
    pub fn enable_on(fd: RawFd, options: RawModeOptions) -> Result<Self> {
        let original = unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(Error::control("tcgetattr", std::io::Error::last_os_error()));
            }
            termios
        };

        install_panic_hook();
        if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
            *guard = Some((fd, original));
        }

        let attrs = options.apply(&original);
        if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const attrs) } != 0 {
            let err = std::io::Error::last_os_error();
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }
            return Err(Error::control("tcsetattr", err));
        }

        debug!(fd, vmin = options.read_min, vtime = options.vtime(), "raw mode enabled");
        Ok(Self {
            fd,
            original: Some(original),
        })
    }

    #[cfg(not(unix))]
    pub fn enable(_options: RawModeOptions) -> Result<Self> {
        Err(Error::control(
            "tcgetattr",
            std::io::Error::from(std::io::ErrorKind::Unsupported),
        ))
    }

    /// Whether the captured attributes are still waiting to be restored.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        #[cfg(unix)]
        {
            self.original.is_some()
        }
        #[cfg(not(unix))]
        {
            false
        }
    }

    /// Restore the captured attributes.
    ///
    /// Idempotent: once restored, further calls do nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TerminalControl`] if `tcsetattr` fails. The
    /// snapshot is kept in that case so a later call can retry.
    #[cfg(unix)]
    pub fn disable(&mut self) -> Result<()> {
        let Some(original) = self.original else {
            return Ok(());
        };

        if unsafe { libc::tcsetattr(self.fd, libc::TCSAFLUSH, &raw const original) } != 0 {
            return Err(Error::control("tcsetattr", std::io::Error::last_os_error()));
        }

        if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
            if matches!(*guard, Some((fd, _)) if fd == self.fd) {
                *guard = None;
            }
        }
        self.original = None;
        debug!(fd = self.fd, "raw mode disabled");
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn disable(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Drop for RawModeSession {
    fn drop(&mut self) {
        let _ = self.disable();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(unix)]
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

    // ── RawModeOptions ───────────────────────────────────────────────

    #[test]
    fn default_disables_everything() {
        let opts = RawModeOptions::default();
        assert_eq!(opts.disable, LineDiscipline::all());
        assert_eq!(opts.read_min, 0);
        assert_eq!(opts.read_timeout, Duration::from_millis(100));
    }

    #[test]
    fn vtime_is_deciseconds() {
        assert_eq!(RawModeOptions::default().vtime(), 1);
        let opts = RawModeOptions {
            read_timeout: Duration::from_millis(1500),
            ..RawModeOptions::default()
        };
        assert_eq!(opts.vtime(), 15);
    }

    #[test]
    fn vtime_clamps() {
        let opts = RawModeOptions {
            read_timeout: Duration::from_secs(3600),
            ..RawModeOptions::default()
        };
        assert_eq!(opts.vtime(), 255);
    }

    #[cfg(unix)]
    fn cooked() -> libc::termios {
        let mut t: libc::termios = unsafe { std::mem::zeroed() };
        t.c_iflag = libc::BRKINT | libc::INPCK | libc::ISTRIP | libc::ICRNL | libc::IXON;
        t.c_oflag = libc::OPOST;
        t.c_lflag = libc::ECHO | libc::ICANON | libc::ISIG | libc::IEXTEN;
        t.c_cc[libc::VMIN] = 1;
        t.c_cc[libc::VTIME] = 0;
        t
    }

    #[cfg(unix)]
    #[test]
    fn apply_clears_all_line_discipline() {
        let raw = RawModeOptions::default().apply(&cooked());
        assert_eq!(raw.c_iflag, 0);
        assert_eq!(raw.c_oflag & libc::OPOST, 0);
        assert_eq!(raw.c_lflag, 0);
        assert_eq!(raw.c_cflag & libc::CS8, libc::CS8);
        assert_eq!(raw.c_cc[libc::VMIN], 0);
        assert_eq!(raw.c_cc[libc::VTIME], 1);
    }

    #[cfg(unix)]
    #[test]
    fn apply_keeps_unlisted_behaviors() {
        let opts = RawModeOptions {
            disable: LineDiscipline::all() - LineDiscipline::SIGNALS - LineDiscipline::OUTPUT_PROCESSING,
            ..RawModeOptions::default()
        };
        let raw = opts.apply(&cooked());
        assert_eq!(raw.c_lflag & libc::ISIG, libc::ISIG);
        assert_eq!(raw.c_oflag & libc::OPOST, libc::OPOST);
        assert_eq!(raw.c_lflag & libc::ECHO, 0);
    }

    #[cfg(unix)]
    #[test]
    fn apply_does_not_touch_original() {
        let original = cooked();
        let _ = RawModeOptions::default().apply(&original);
        assert_eq!(original.c_lflag & libc::ECHO, libc::ECHO);
    }

    // ── RawModeSession ───────────────────────────────────────────────

    /// A fresh pseudo-terminal pair in its default (cooked) state.
    #[cfg(unix)]
    fn pty() -> (OwnedFd, OwnedFd) {
        let mut master: RawFd = -1;
        let mut slave: RawFd = -1;
        let rc = unsafe {
            libc::openpty(
                &raw mut master,
                &raw mut slave,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
            )
        };
        assert_eq!(rc, 0, "openpty: {}", std::io::Error::last_os_error());
        unsafe { (OwnedFd::from_raw_fd(master), OwnedFd::from_raw_fd(slave)) }
    }

    #[cfg(unix)]
    fn attrs(fd: &OwnedFd) -> libc::termios {
        let mut t: libc::termios = unsafe { std::mem::zeroed() };
        assert_eq!(unsafe { libc::tcgetattr(fd.as_raw_fd(), &raw mut t) }, 0);
        t
    }

    #[cfg(unix)]
    #[test]
    fn enable_on_non_terminal_is_terminal_control_error() {
        let null = std::fs::File::open("/dev/null").unwrap();
        let err = RawModeSession::enable_on(null.as_raw_fd(), RawModeOptions::default())
            .err()
            .expect("enable must fail off a terminal");
        assert!(matches!(err, Error::TerminalControl { op: "tcgetattr", .. }));
    }

    #[cfg(unix)]
    #[test]
    fn enable_then_disable_round_trips() {
        let (_master, slave) = pty();
        let before = attrs(&slave);
        assert_eq!(before.c_lflag & libc::ECHO, libc::ECHO);

        let mut session =
            RawModeSession::enable_on(slave.as_raw_fd(), RawModeOptions::default()).unwrap();
        assert!(session.is_active());

        let raw = attrs(&slave);
        assert_eq!(raw.c_lflag & (libc::ECHO | libc::ICANON | libc::ISIG | libc::IEXTEN), 0);
        assert_eq!(raw.c_iflag & (libc::ICRNL | libc::IXON), 0);
        assert_eq!(raw.c_oflag & libc::OPOST, 0);
        assert_eq!(raw.c_cc[libc::VMIN], 0);
        assert_eq!(raw.c_cc[libc::VTIME], 1);

        session.disable().unwrap();
        assert!(!session.is_active());
        let after = attrs(&slave);
        assert_eq!(after.c_lflag, before.c_lflag);
        assert_eq!(after.c_iflag, before.c_iflag);
        assert_eq!(after.c_oflag, before.c_oflag);
        assert_eq!(after.c_cc[libc::VMIN], before.c_cc[libc::VMIN]);

        session.disable().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn drop_restores_attributes() {
        let (_master, slave) = pty();
        let before = attrs(&slave);
        {
            let _session =
                RawModeSession::enable_on(slave.as_raw_fd(), RawModeOptions::default()).unwrap();
            assert_eq!(attrs(&slave).c_lflag & libc::ECHO, 0);
        }
        assert_eq!(attrs(&slave).c_lflag, before.c_lflag);
    }

    #[cfg(unix)]
    #[test]
    fn custom_timeout_reaches_the_terminal() {
        let (_master, slave) = pty();
        let options = RawModeOptions {
            read_timeout: Duration::from_millis(500),
            read_min: 1,
            ..RawModeOptions::default()
        };
        let _session = RawModeSession::enable_on(slave.as_raw_fd(), options).unwrap();
        let raw = attrs(&slave);
        assert_eq!(raw.c_cc[libc::VMIN], 1);
        assert_eq!(raw.c_cc[libc::VTIME], 5);
    }

    #[cfg(unix)]
    #[test]
    fn disable_when_never_enabled_is_noop() {
        let mut session = RawModeSession {
            fd: libc::STDIN_FILENO,
            original: None,
        };
        assert!(!session.is_active());
        session.disable().unwrap();
        session.disable().unwrap();
    }
}
