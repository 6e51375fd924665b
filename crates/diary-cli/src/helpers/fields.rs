//! Build plaintext entries from command-line flags.

use chrono::Utc;

use diary_core::entry::{Category, Image, Location, Mood, Weather, WeatherCondition};
use diary_core::{DiaryEntry, EntryMetadata};

use super::parsing::{parse_coordinates, parse_datetime, parse_image, parse_tags};
use crate::cli::EntryFieldArgs;

/// A new entry from `add` flags.
pub fn build_entry(
    title: &str,
    content: String,
    args: &EntryFieldArgs,
) -> anyhow::Result<DiaryEntry> {
    let entry = DiaryEntry::new(title, content).with_metadata(EntryMetadata::default());
    apply_field_args(entry, args)
}

/// Overlay the flags that were given onto an entry. Absent flags leave the
/// existing value alone.
pub fn apply_field_args(mut entry: DiaryEntry, args: &EntryFieldArgs) -> anyhow::Result<DiaryEntry> {
    if let Some(mood) = &args.mood {
        entry.metadata.mood = Some(mood.parse::<Mood>()?);
    }
    if let Some(note) = &args.mood_note {
        entry.mood_note = Some(note.clone());
    }
    if args.weather.is_some() || args.temperature.is_some() {
        let mut weather = entry.metadata.weather.take().unwrap_or(Weather {
            condition: None,
            temperature: None,
        });
        if let Some(condition) = &args.weather {
            weather.condition = Some(condition.parse::<WeatherCondition>()?);
        }
        if let Some(temperature) = args.temperature {
            weather.temperature = Some(temperature);
        }
        entry.metadata.weather = Some(weather);
    }
    if let Some(category) = &args.category {
        entry.metadata.category = Some(category.parse::<Category>()?);
    }
    if !args.tag.is_empty() {
        entry.tags = parse_tags(&args.tag);
    }
    if let Some(date) = &args.date {
        entry.metadata.entry_date = parse_datetime(date)?;
    }
    if args.favorite {
        entry.metadata.is_favorite = true;
    }
    if args.public {
        entry.metadata.is_private = false;
    }
    if args.location.is_some() || args.coordinates.is_some() {
        let mut location = entry.location.take().unwrap_or(Location {
            name: String::new(),
            coordinates: None,
        });
        if let Some(name) = &args.location {
            location.name = name.clone();
        }
        if let Some(coords) = &args.coordinates {
            location.coordinates = Some(parse_coordinates(coords)?);
        }
        entry.location = Some(location);
    }
    for raw in &args.image {
        let (url, caption) = parse_image(raw);
        entry.images.push(Image {
            url,
            caption,
            uploaded_at: Utc::now(),
        });
    }
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_entry_applies_flags() {
        let args = EntryFieldArgs {
            mood: Some("grateful".to_string()),
            weather: Some("rainy".to_string()),
            temperature: Some(12.5),
            category: Some("travel".to_string()),
            tag: vec!["lake,family".to_string()],
            date: Some("2024-05-01".to_string()),
            favorite: true,
            location: Some("Bled".to_string()),
            coordinates: Some("46.36,14.09".to_string()),
            image: vec!["https://img/1.jpg|boat".to_string()],
            ..Default::default()
        };
        let entry = build_entry("Trip", "We rowed.".to_string(), &args).unwrap();
        assert_eq!(entry.metadata.mood, Some(Mood::Grateful));
        assert_eq!(entry.metadata.category, Some(Category::Travel));
        assert_eq!(
            entry.metadata.weather.as_ref().unwrap().condition,
            Some(WeatherCondition::Rainy)
        );
        assert_eq!(entry.tags, vec!["lake", "family"]);
        assert!(entry.metadata.is_favorite);
        assert!(entry.metadata.is_private);
        assert_eq!(entry.location.as_ref().unwrap().name, "Bled");
        assert_eq!(entry.images[0].caption.as_deref(), Some("boat"));
    }

    #[test]
    fn test_apply_keeps_unspecified_values() {
        let args = EntryFieldArgs {
            mood: Some("happy".to_string()),
            tag: vec!["x".to_string()],
            ..Default::default()
        };
        let entry = build_entry("T", "C".to_string(), &args).unwrap();

        let edit = EntryFieldArgs {
            public: true,
            ..Default::default()
        };
        let edited = apply_field_args(entry, &edit).unwrap();
        assert_eq!(edited.metadata.mood, Some(Mood::Happy));
        assert_eq!(edited.tags, vec!["x"]);
        assert!(!edited.metadata.is_private);
    }

    #[test]
    fn test_invalid_enum_is_error() {
        let args = EntryFieldArgs {
            mood: Some("ecstatic".to_string()),
            ..Default::default()
        };
        assert!(build_entry("T", "C".to_string(), &args).is_err());
    }
}
