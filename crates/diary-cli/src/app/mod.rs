//! Application-level utilities for the diary CLI.
//!
//! This module provides:
//! - The per-invocation context (config, store, session custody)
//! - Entry ID resolution from full UUIDs or short prefixes

mod context;
mod resolver;

pub use context::AppContext;
pub use resolver::resolve_entry_id;
