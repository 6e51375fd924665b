//! Output formatting helpers for the CLI.
//!
//! This module provides formatting utilities for displaying entries
//! as JSON, tables, or plain key=value text.

mod json;
mod text;

// Re-export public API
pub use json::{entry_json, summary_json, views_json};
pub use text::{entry_lines, list_rows, LIST_COLUMNS};
