//! JSON output formatting for entries.

use uuid::Uuid;

use diary_core::storage::EntrySummary;
use diary_core::{DiaryEntry, EntryView};

/// A decrypted entry with its id.
pub fn entry_json(id: Uuid, entry: &DiaryEntry) -> anyhow::Result<serde_json::Value> {
    let mut value = serde_json::to_value(entry)?;
    if let Some(map) = value.as_object_mut() {
        map.insert("id".to_string(), serde_json::json!(id));
    }
    Ok(value)
}

/// Batch results, one object per entry tagged with `status`.
pub fn views_json(views: &[EntryView]) -> anyhow::Result<serde_json::Value> {
    Ok(serde_json::to_value(views)?)
}

/// The clear-metadata receipt returned after a write.
pub fn summary_json(summary: &EntrySummary) -> anyhow::Result<serde_json::Value> {
    Ok(serde_json::to_value(summary)?)
}
