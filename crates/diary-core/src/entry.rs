//! Diary entries: plaintext form, sealed form, and the conversions between them.
//!
//! Privacy-sensitive text (title, content, mood note, tags, location name,
//! image captions, voice-note transcriptions) is always sealed. Metadata used
//! for filtering (entry date, mood, weather, category, flags, urls, coordinates)
//! stays in the clear on purpose.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DiaryError, Result};
use crate::field::{EncryptedField, FieldCipher};
use crate::storage::{EntryDocument, Listed};

/// Maximum title length in characters (checked before encryption).
pub const MAX_TITLE_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    VeryHappy,
    Happy,
    Neutral,
    Sad,
    VerySad,
    Angry,
    Excited,
    Anxious,
    Grateful,
    Stressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Sunny,
    Cloudy,
    Rainy,
    Snowy,
    Stormy,
    Foggy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Personal,
    Work,
    Travel,
    Health,
    Relationships,
    Goals,
    Gratitude,
    Other,
}

macro_rules! parse_snake_case_enum {
    ($ty:ty, $what:literal) => {
        impl std::str::FromStr for $ty {
            type Err = DiaryError;

            fn from_str(value: &str) -> Result<Self> {
                serde_json::from_value(serde_json::Value::String(value.trim().to_string()))
                    .map_err(|_| DiaryError::Validation(format!("Invalid {} value: {}", $what, value)))
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match serde_json::to_value(self) {
                    Ok(serde_json::Value::String(name)) => f.write_str(&name),
                    _ => Err(std::fmt::Error),
                }
            }
        }
    };
}

parse_snake_case_enum!(Mood, "mood");
parse_snake_case_enum!(WeatherCondition, "weather condition");
parse_snake_case_enum!(Category, "category");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub condition: Option<WeatherCondition>,
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Clear metadata kept unencrypted to support filtering without decryption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub entry_date: DateTime<Utc>,
    pub mood: Option<Mood>,
    pub weather: Option<Weather>,
    pub category: Option<Category>,
    pub is_private: bool,
    pub is_favorite: bool,
    pub streak_day: Option<u32>,
}

impl Default for EntryMetadata {
    fn default() -> Self {
        Self {
            entry_date: Utc::now(),
            mood: None,
            weather: None,
            category: None,
            is_private: true,
            is_favorite: false,
            streak_day: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub caption: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceNote {
    pub url: String,
    pub duration_secs: f64,
    pub transcription: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// A diary entry in plaintext. Only ever held by the party with the secret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub title: String,
    pub content: String,
    /// Free-text mood description (distinct from the clear `Mood` enum).
    pub mood_note: Option<String>,
    pub location: Option<Location>,
    pub tags: Vec<String>,
    pub images: Vec<Image>,
    pub voice_notes: Vec<VoiceNote>,
    pub metadata: EntryMetadata,
}

impl DiaryEntry {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            mood_note: None,
            location: None,
            tags: Vec::new(),
            images: Vec::new(),
            voice_notes: Vec::new(),
            metadata: EntryMetadata::default(),
        }
    }

    pub fn with_mood_note(mut self, note: impl Into<String>) -> Self {
        self.mood_note = Some(note.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_metadata(mut self, metadata: EntryMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_image(mut self, image: Image) -> Self {
        self.images.push(image);
        self
    }

    pub fn with_voice_note(mut self, note: VoiceNote) -> Self {
        self.voice_notes.push(note);
        self
    }

    /// Validate before sealing. Encrypted lengths say nothing about plaintext,
    /// so every length rule has to run here.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() || self.content.is_empty() {
            return Err(DiaryError::Validation(
                "title and content are required fields".to_string(),
            ));
        }
        if self.title.trim().chars().count() > MAX_TITLE_CHARS {
            return Err(DiaryError::Validation(format!(
                "Title must be {} characters or less",
                MAX_TITLE_CHARS
            )));
        }
        if self.images.iter().any(|image| image.url.trim().is_empty()) {
            return Err(DiaryError::Validation(
                "Each image must have a url".to_string(),
            ));
        }
        if self
            .voice_notes
            .iter()
            .any(|note| note.url.trim().is_empty() || note.duration_secs <= 0.0)
        {
            return Err(DiaryError::Validation(
                "Each voice note must have url and duration".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SealedLocation {
    pub name: Option<EncryptedField>,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SealedImage {
    pub url: String,
    pub caption: Option<EncryptedField>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SealedVoiceNote {
    pub url: String,
    pub duration_secs: f64,
    pub transcription: Option<EncryptedField>,
    pub uploaded_at: DateTime<Utc>,
}

/// The encrypted body of an entry as it crosses the storage boundary.
///
/// The GCM client submits this shape directly; the server stores it verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SealedEntry {
    pub title: EncryptedField,
    pub content: EncryptedField,
    pub mood_note: Option<EncryptedField>,
    pub location: Option<SealedLocation>,
    #[serde(default)]
    pub tags: Vec<EncryptedField>,
    #[serde(default)]
    pub images: Vec<SealedImage>,
    #[serde(default)]
    pub voice_notes: Vec<SealedVoiceNote>,
    pub metadata: EntryMetadata,
}

impl SealedEntry {
    /// Every encrypted field in the entry.
    pub fn fields(&self) -> Vec<&EncryptedField> {
        let mut fields = vec![&self.title, &self.content];
        fields.extend(self.mood_note.iter());
        if let Some(location) = &self.location {
            fields.extend(location.name.iter());
        }
        fields.extend(self.tags.iter());
        fields.extend(self.images.iter().filter_map(|i| i.caption.as_ref()));
        fields.extend(
            self.voice_notes
                .iter()
                .filter_map(|n| n.transcription.as_ref()),
        );
        fields
    }

    /// Check that every field was produced by `cipher`'s scheme.
    pub fn ensure_scheme(&self, cipher: &dyn FieldCipher) -> Result<()> {
        let expected = cipher.scheme();
        if let Some(field) = self.fields().into_iter().find(|f| f.scheme() != expected) {
            return Err(DiaryError::Validation(format!(
                "entry mixes cipher schemes: expected {}, found {}",
                expected,
                field.scheme()
            )));
        }
        Ok(())
    }
}

fn seal_optional(cipher: &dyn FieldCipher, value: Option<&str>) -> Result<Option<EncryptedField>> {
    match value {
        Some(text) if !text.is_empty() => cipher.seal(text).map(Some),
        _ => Ok(None),
    }
}

fn open_optional(cipher: &dyn FieldCipher, field: Option<&EncryptedField>) -> Result<Option<String>> {
    field.map(|f| cipher.open(f)).transpose()
}

/// Validate and encrypt every sensitive field of an entry.
///
/// Empty optional texts (a missing caption, a blank location name) are stored
/// as absent rather than encrypted.
pub fn seal_entry(entry: &DiaryEntry, cipher: &dyn FieldCipher) -> Result<SealedEntry> {
    entry.validate()?;

    let location = match &entry.location {
        Some(location) => Some(SealedLocation {
            name: seal_optional(cipher, Some(&location.name))?,
            coordinates: location.coordinates,
        }),
        None => None,
    };

    let sealed = SealedEntry {
        title: cipher.seal(entry.title.trim())?,
        content: cipher.seal(&entry.content)?,
        mood_note: seal_optional(cipher, entry.mood_note.as_deref())?,
        location,
        tags: entry
            .tags
            .iter()
            .map(|tag| cipher.seal(tag))
            .collect::<Result<Vec<_>>>()?,
        images: entry
            .images
            .iter()
            .map(|image| {
                Ok(SealedImage {
                    url: image.url.clone(),
                    caption: seal_optional(cipher, image.caption.as_deref())?,
                    uploaded_at: image.uploaded_at,
                })
            })
            .collect::<Result<Vec<_>>>()?,
        voice_notes: entry
            .voice_notes
            .iter()
            .map(|note| {
                Ok(SealedVoiceNote {
                    url: note.url.clone(),
                    duration_secs: note.duration_secs,
                    transcription: seal_optional(cipher, note.transcription.as_deref())?,
                    uploaded_at: note.uploaded_at,
                })
            })
            .collect::<Result<Vec<_>>>()?,
        metadata: entry.metadata.clone(),
    };

    tracing::debug!(
        scheme = %cipher.scheme(),
        fields = sealed.fields().len(),
        "sealed entry"
    );
    Ok(sealed)
}

/// Decrypt every field of a sealed entry. Fails on the first bad field.
pub fn open_entry(sealed: &SealedEntry, cipher: &dyn FieldCipher) -> Result<DiaryEntry> {
    let location = match &sealed.location {
        Some(location) => Some(Location {
            name: open_optional(cipher, location.name.as_ref())?.unwrap_or_default(),
            coordinates: location.coordinates,
        }),
        None => None,
    };

    Ok(DiaryEntry {
        title: cipher.open(&sealed.title)?,
        content: cipher.open(&sealed.content)?,
        mood_note: open_optional(cipher, sealed.mood_note.as_ref())?,
        location,
        tags: sealed
            .tags
            .iter()
            .map(|tag| cipher.open(tag))
            .collect::<Result<Vec<_>>>()?,
        images: sealed
            .images
            .iter()
            .map(|image| {
                Ok(Image {
                    url: image.url.clone(),
                    caption: open_optional(cipher, image.caption.as_ref())?,
                    uploaded_at: image.uploaded_at,
                })
            })
            .collect::<Result<Vec<_>>>()?,
        voice_notes: sealed
            .voice_notes
            .iter()
            .map(|note| {
                Ok(VoiceNote {
                    url: note.url.clone(),
                    duration_secs: note.duration_secs,
                    transcription: open_optional(cipher, note.transcription.as_ref())?,
                    uploaded_at: note.uploaded_at,
                })
            })
            .collect::<Result<Vec<_>>>()?,
        metadata: sealed.metadata.clone(),
    })
}

/// Per-entry result of a batch decrypt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryView {
    Decrypted { id: Uuid, entry: DiaryEntry },
    /// The entry could not be opened with the secret supplied. Clear metadata
    /// is still available.
    Undecryptable {
        id: Uuid,
        metadata: EntryMetadata,
        reason: String,
    },
}

impl EntryView {
    pub fn id(&self) -> Uuid {
        match self {
            EntryView::Decrypted { id, .. } | EntryView::Undecryptable { id, .. } => *id,
        }
    }

    pub fn is_decrypted(&self) -> bool {
        matches!(self, EntryView::Decrypted { .. })
    }
}

/// Decrypt a batch of entries, isolating failures per entry.
///
/// One entry's authentication failure never aborts its siblings; it is
/// reported as `EntryView::Undecryptable`. `KeyUnavailable` is the exception:
/// with no key bound nothing can be opened, so it is returned as an error.
pub fn open_batch<'a, I>(entries: I, cipher: &dyn FieldCipher) -> Result<Vec<EntryView>>
where
    I: IntoIterator<Item = (Uuid, &'a SealedEntry)>,
{
    entries
        .into_iter()
        .map(|(id, sealed)| open_view(id, sealed, cipher))
        .collect()
}

/// Decrypt a listing from the store.
///
/// Rows whose body could not be parsed are reported as
/// `EntryView::Undecryptable` with their clear metadata, like any other
/// entry that fails to open.
pub fn open_listed<'a, I>(entries: I, cipher: &dyn FieldCipher) -> Result<Vec<EntryView>>
where
    I: IntoIterator<Item = &'a Listed<EntryDocument>>,
{
    entries
        .into_iter()
        .map(|listed| match listed {
            Listed::Readable(doc) => open_view(doc.id, &doc.body, cipher),
            Listed::Unreadable(entry) => Ok(EntryView::Undecryptable {
                id: entry.id,
                metadata: entry.metadata.clone(),
                reason: entry.reason.clone(),
            }),
        })
        .collect()
}

fn open_view(id: Uuid, sealed: &SealedEntry, cipher: &dyn FieldCipher) -> Result<EntryView> {
    match open_entry(sealed, cipher) {
        Ok(entry) => Ok(EntryView::Decrypted { id, entry }),
        Err(DiaryError::KeyUnavailable) => Err(DiaryError::KeyUnavailable),
        Err(err) => {
            tracing::warn!(entry_id = %id, error = %err, "entry could not be decrypted");
            Ok(EntryView::Undecryptable {
                id,
                metadata: sealed.metadata.clone(),
                reason: err.to_string(),
            })
        }
    }
}
