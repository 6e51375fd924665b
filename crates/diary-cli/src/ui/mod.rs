//! UI primitives for the diary CLI.
//!
//! - **Context**: environment detection (TTY, width, color)
//! - **Mode**: output mode resolution (json, plain, pretty)
//! - **Theme**: badges and styles
//! - **Render**: tables, receipts, hints, errors
//! - **Progress**: spinner for legacy key derivation
//! - **Format**: string utilities

mod context;
pub mod format;
mod mode;
pub mod progress;
pub mod render;
pub mod theme;

pub use context::UiContext;
pub use mode::OutputMode;
pub use theme::Badge;

pub use render::{badge, header, hint, kv, print, print_error, receipt, simple_table};

pub use progress::Spinner;

pub use format::{format_datetime, short_id, single_line, truncate};
