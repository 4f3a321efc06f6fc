//! # kilo-editor — Viewer core for kilo
//!
//! This crate holds everything between the terminal layer and the binary:
//!
//! - **[`document`]** — `Document` of byte lines, loaded from a file or built in memory
//! - **[`cursor`]** — `Cursor` (cx, cy) with single-step, paging, Home and End motion
//! - **[`scroll`]** — `ScrollOffset` that keeps the cursor on screen
//! - **[`view`]** — `Viewport`, which paints one complete frame
//! - **[`viewer`]** — `Viewer`, the key-handling state the event loop drives
//!
//! Nothing here touches the terminal directly. Frames are painted into a
//! buffer and handed back to kilo-term's event loop to write.

pub mod cursor;
pub mod document;
pub mod scroll;
pub mod view;
pub mod viewer;

pub use cursor::{Cursor, Direction};
pub use document::{Document, Line};
pub use scroll::ScrollOffset;
pub use view::Viewport;
pub use viewer::Viewer;
