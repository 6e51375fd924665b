//! Entry row type for database queries.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::crypto::PasswordVerifier;
use crate::entry::{EntryMetadata, SealedEntry};
use crate::error::{DiaryError, Result};
use crate::field::EncryptedField;
use crate::storage::types::{EntryRecord, Listed, UnreadableEntry};

/// Raw row data from the entries table, before parsing into domain types.
#[derive(Debug)]
pub struct EntryRow {
    pub id: String,
    pub owner_id: String,
    pub body_json: String,
    pub password_hash: Option<String>,
    pub entry_date: String,
    pub category: Option<String>,
    pub is_favorite: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl EntryRow {
    pub const COLUMNS: &'static str =
        "id, owner_id, body_json, password_hash, entry_date, category, is_favorite, created_at, updated_at";

    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            body_json: row.get(2)?,
            password_hash: row.get(3)?,
            entry_date: row.get(4)?,
            category: row.get(5)?,
            is_favorite: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    /// Metadata rebuilt from the clear columns alone.
    fn clear_metadata(&self) -> Result<EntryMetadata> {
        Ok(EntryMetadata {
            entry_date: parse_timestamp(&self.entry_date)?,
            category: self.category.as_deref().and_then(|c| c.parse().ok()),
            is_favorite: self.is_favorite,
            ..EntryMetadata::default()
        })
    }

    /// Parse a row for a listing.
    ///
    /// A body or verifier that fails to parse yields `Listed::Unreadable`
    /// with the clear columns. Broken ids or timestamps are still errors.
    pub fn into_listed(self) -> Result<Listed<EntryRecord>> {
        let id = parse_uuid(&self.id, "entry UUID")?;
        parse_uuid(&self.owner_id, "owner UUID")?;
        parse_timestamp(&self.created_at)?;
        parse_timestamp(&self.updated_at)?;
        let metadata = self.clear_metadata()?;

        match EntryRecord::try_from(self) {
            Ok(record) => Ok(Listed::Readable(record)),
            Err(err) => {
                tracing::warn!(entry_id = %id, error = %err, "stored entry body is unreadable");
                Ok(Listed::Unreadable(UnreadableEntry {
                    id,
                    metadata,
                    reason: err.to_string(),
                }))
            }
        }
    }
}

fn parse_uuid(value: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| DiaryError::Storage(format!("Invalid {}: {}", what, e)))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .map_err(|e| DiaryError::Storage(format!("Invalid timestamp: {}", e)))?
        .with_timezone(&Utc))
}

impl TryFrom<EntryRow> for EntryRecord {
    type Error = DiaryError;

    fn try_from(row: EntryRow) -> Result<Self> {
        let id = parse_uuid(&row.id, "entry UUID")?;
        let owner_id = parse_uuid(&row.owner_id, "owner UUID")?;
        let body = parse_sealed_body(&row.body_json)?;
        let password_hash = row
            .password_hash
            .as_deref()
            .map(PasswordVerifier::parse)
            .transpose()?;

        Ok(EntryRecord {
            id,
            owner_id,
            body,
            password_hash,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

/// Parse a stored body, upgrading untagged historic field shapes on the way.
pub fn parse_sealed_body(body_json: &str) -> Result<SealedEntry> {
    let mut value: Value = serde_json::from_str(body_json)
        .map_err(|e| DiaryError::Storage(format!("Invalid entry JSON: {}", e)))?;

    for key in ["title", "content"] {
        normalize_slot(value.get_mut(key), false)?;
    }
    normalize_slot(value.get_mut("mood_note"), true)?;
    if let Some(location) = value.get_mut("location") {
        normalize_slot(location.get_mut("name"), true)?;
    }
    if let Some(Value::Array(tags)) = value.get_mut("tags") {
        for tag in tags.iter_mut() {
            normalize_slot(Some(tag), false)?;
        }
    }
    for (list, key) in [("images", "caption"), ("voice_notes", "transcription")] {
        if let Some(Value::Array(items)) = value.get_mut(list) {
            for item in items.iter_mut() {
                normalize_slot(item.get_mut(key), true)?;
            }
        }
    }

    Ok(serde_json::from_value(value)?)
}

/// Upgrade one field slot in place. Historic rows wrote an absent optional
/// as `""`; it becomes `null`.
fn normalize_slot(slot: Option<&mut Value>, optional: bool) -> Result<()> {
    match slot {
        Some(slot) if optional && slot.as_str() == Some("") => {
            *slot = Value::Null;
            Ok(())
        }
        Some(slot) if !slot.is_null() => {
            let field = EncryptedField::from_stored_json(slot)?;
            *slot = serde_json::to_value(field)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::CipherScheme;

    #[test]
    fn test_parse_untagged_historic_body() {
        let packed = crate::crypto::cbc::encrypt_field("old title", "pw").unwrap();
        let body = serde_json::json!({
            "title": packed,
            "content": {"data": [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17], "iv": [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]},
            "mood_note": null,
            "location": {"name": null, "coordinates": null},
            "tags": [packed],
            "images": [{"url": "u", "caption": null, "uploaded_at": "2024-01-01T00:00:00Z"}],
            "voice_notes": [],
            "metadata": {
                "entry_date": "2024-01-01T00:00:00Z",
                "mood": "happy",
                "weather": null,
                "category": null,
                "is_private": true,
                "is_favorite": false,
                "streak_day": null
            }
        });
        let sealed = parse_sealed_body(&body.to_string()).unwrap();
        assert_eq!(sealed.title.scheme(), CipherScheme::PackedCbc);
        assert_eq!(sealed.content.scheme(), CipherScheme::Gcm);
        assert_eq!(sealed.tags.len(), 1);
        assert!(sealed.images[0].caption.is_none());
    }

    #[test]
    fn test_parse_historic_empty_optionals_as_absent() {
        let packed = crate::crypto::cbc::encrypt_field("old title", "pw").unwrap();
        let body = serde_json::json!({
            "title": packed,
            "content": packed,
            "mood_note": "",
            "location": {"name": "", "coordinates": null},
            "images": [{"url": "u", "caption": "", "uploaded_at": "2024-01-01T00:00:00Z"}],
            "voice_notes": [{"url": "v", "duration_secs": 3.0, "transcription": "", "uploaded_at": "2024-01-01T00:00:00Z"}],
            "metadata": {
                "entry_date": "2024-01-01T00:00:00Z",
                "mood": null,
                "weather": null,
                "category": null,
                "is_private": true,
                "is_favorite": false,
                "streak_day": null
            }
        });
        let sealed = parse_sealed_body(&body.to_string()).unwrap();
        assert!(sealed.mood_note.is_none());
        assert!(sealed.location.as_ref().unwrap().name.is_none());
        assert!(sealed.images[0].caption.is_none());
        assert!(sealed.voice_notes[0].transcription.is_none());

        let opened = crate::entry::open_entry(&sealed, &crate::field::LegacyPassword::new("pw")).unwrap();
        assert_eq!(opened.title, "old title");
        assert_eq!(opened.location.unwrap().name, "");
    }

    #[test]
    fn test_parse_empty_required_field_still_rejected() {
        let body = serde_json::json!({
            "title": "",
            "content": "",
            "metadata": {}
        });
        assert!(parse_sealed_body(&body.to_string()).is_err());
    }

    #[test]
    fn test_parse_rejects_plaintext_field() {
        let body = serde_json::json!({
            "title": "not encrypted at all",
            "content": "neither is this",
            "metadata": {}
        });
        assert!(matches!(
            parse_sealed_body(&body.to_string()),
            Err(DiaryError::MalformedCiphertext(_))
        ));
    }
}
