// SPDX-License-Identifier: MIT
//
// kilo-term — Terminal I/O for the kilo viewer.
//
// Raw termios control with guaranteed restoration, window-size probing
// (ioctl first, cursor-report protocol as fallback), a key decoder for the
// VT100 escape sequences a keyboard sends, and a frame buffer that reaches
// the terminal in a single write.
//
// This crate intentionally avoids external TUI frameworks (crossterm,
// termion) in favor of direct terminal control via ANSI escape sequences
// and raw termios. Input is a synchronous poll with a 100ms timeout; output
// is one write per frame.

pub mod ansi;
pub mod error;
pub mod event_loop;
pub mod geometry;
pub mod input;
pub mod output;
pub mod reader;
pub mod terminal;

pub use error::{Error, ProbeError, Result};
