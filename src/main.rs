// SPDX-License-Identifier: MIT
//
// kilo — a minimal terminal text viewer.
//
// This is the main binary that wires the two crates together:
//
//   kilo-term   → raw mode, window size, key decoding, event loop
//   kilo-editor → document, cursor, scrolling, viewport rendering
//
// The Viewer implements kilo-term's App trait. Each keypress flows through:
//
//   stdin → KeyDecoder → Viewer::process_key → cursor motion
//   paint → scroll recompute → Viewport → one write to stdout
//
// Every failure after the terminal is taken over is fatal: the screen is
// cleared, raw mode is restored (the event loop's drop), a one-line
// diagnostic goes to stderr, and the process exits with status 1.

use std::env;
use std::fs::File;
use std::io::Write;
use std::process;
use std::sync::Mutex;

use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use kilo_editor::{Document, Viewer};
use kilo_term::ansi;
use kilo_term::event_loop::EventLoop;
use kilo_term::output::{OutputBuffer, TtyOutput};

/// Environment variable naming the log file.
const LOG_ENV: &str = "KILO_LOG";

// ─── Logging ────────────────────────────────────────────────────────────────

/// Send tracing output to the file named by `KILO_LOG`, if set.
///
/// The terminal belongs to the viewer while it runs, so there is no
/// fallback to stderr.
fn init_logging() {
    let Some(path) = env::var_os(LOG_ENV) else {
        return;
    };
    let file = match File::create(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("kilo: {}: {e}", path.to_string_lossy());
            return;
        }
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();
}

// ─── Session ────────────────────────────────────────────────────────────────

/// Take over the terminal and view `document` until Ctrl-Q.
fn run(document: Document) -> kilo_term::Result<()> {
    let mut event_loop = EventLoop::new()?;
    let mut viewer = Viewer::new(document, event_loop.geometry());
    event_loop.run(&mut viewer)?;
    event_loop.shutdown()
}

/// Best-effort clear + home after a fatal error.
fn clear_screen() {
    let mut frame = OutputBuffer::new();
    if ansi::clear_screen(&mut frame)
        .and_then(|()| ansi::cursor_home(&mut frame))
        .is_ok()
    {
        let mut out = TtyOutput::stdout();
        let _ = frame.flush_to(&mut out).and_then(|_| out.flush());
    }
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn main() {
    init_logging();

    let document = match env::args_os().nth(1) {
        Some(path) => Document::open(&path).unwrap_or_else(|e| {
            eprintln!("kilo: {}: {e}", path.to_string_lossy());
            process::exit(1);
        }),
        None => Document::new(),
    };
    info!(rows = document.num_rows(), "starting");

    if let Err(e) = run(document) {
        error!(error = %e, "fatal");
        clear_screen();
        eprintln!("kilo: {e}");
        process::exit(1);
    }
}
