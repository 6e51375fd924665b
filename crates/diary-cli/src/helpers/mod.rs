//! Input and parsing helper functions for the CLI.
//!
//! This module provides utilities for:
//! - Key and password prompting, entry content reading (`input`)
//! - Datetime, tag, coordinate and attachment parsing (`parsing`)
//! - Turning entry flags into a plaintext entry (`fields`)

mod fields;
mod input;
mod parsing;

// Re-export public API
pub use fields::{apply_field_args, build_entry};
pub use input::{confirm, prompt_entry_password, prompt_secret_key, read_content};
pub use parsing::{parse_coordinates, parse_datetime, parse_image, parse_tags};
