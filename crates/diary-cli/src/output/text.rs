//! Text output for entries.

use uuid::Uuid;

use diary_core::entry::EntryMetadata;
use diary_core::{DiaryEntry, EntryView};

use crate::ui::{self, format_datetime, kv, short_id, single_line, truncate, Badge, UiContext};

/// Placeholder title for entries that could not be opened.
pub const UNDECRYPTABLE_TITLE: &str = "Decryption Error";

pub const LIST_COLUMNS: [&str; 5] = ["ID", "DATE", "TITLE", "MOOD", "TAGS"];

const TITLE_MAX: usize = 48;

fn metadata_lines(ctx: &UiContext, metadata: &EntryMetadata) -> Vec<String> {
    let pretty = ctx.mode.is_pretty();
    let mut lines = vec![kv(ctx, "Date", &format_datetime(&metadata.entry_date, pretty))];
    if let Some(mood) = metadata.mood {
        lines.push(kv(ctx, "Mood", &mood.to_string()));
    }
    if let Some(weather) = &metadata.weather {
        let mut parts = Vec::new();
        if let Some(condition) = weather.condition {
            parts.push(condition.to_string());
        }
        if let Some(temperature) = weather.temperature {
            parts.push(format!("{}\u{00B0}", temperature));
        }
        if !parts.is_empty() {
            lines.push(kv(ctx, "Weather", &parts.join(" ")));
        }
    }
    if let Some(category) = metadata.category {
        lines.push(kv(ctx, "Category", &category.to_string()));
    }
    lines.push(kv(ctx, "Private", &metadata.is_private.to_string()));
    if metadata.is_favorite {
        lines.push(kv(ctx, "Favorite", "true"));
    }
    lines
}

/// Detail view of one decrypted entry.
pub fn entry_lines(ctx: &UiContext, id: Uuid, entry: &DiaryEntry) -> Vec<String> {
    let mut lines = Vec::new();
    if ctx.mode.is_pretty() {
        lines.push(ui::theme::styled(
            &entry.title,
            ui::theme::styles::bold(),
            ctx.color,
        ));
        lines.push(kv(ctx, "ID", &id.to_string()));
    } else {
        lines.push(kv(ctx, "ID", &id.to_string()));
        lines.push(kv(ctx, "Title", &single_line(&entry.title)));
    }
    lines.extend(metadata_lines(ctx, &entry.metadata));

    if !entry.tags.is_empty() {
        lines.push(kv(ctx, "Tags", &entry.tags.join(", ")));
    }
    if let Some(note) = &entry.mood_note {
        lines.push(kv(ctx, "Mood note", &single_line(note)));
    }
    if let Some(location) = &entry.location {
        let value = match &location.coordinates {
            Some(c) => format!("{} ({}, {})", location.name, c.latitude, c.longitude),
            None => location.name.clone(),
        };
        lines.push(kv(ctx, "Location", value.trim()));
    }
    for image in &entry.images {
        let value = match &image.caption {
            Some(caption) => format!("{} ({})", image.url, single_line(caption)),
            None => image.url.clone(),
        };
        lines.push(kv(ctx, "Image", &value));
    }
    for note in &entry.voice_notes {
        lines.push(kv(
            ctx,
            "Voice note",
            &format!("{} ({}s)", note.url, note.duration_secs),
        ));
    }

    lines.push(String::new());
    lines.push(entry.content.clone());
    lines
}

/// Table rows for a batch of views. Undecryptable entries keep their clear
/// metadata and show a placeholder title.
pub fn list_rows(ctx: &UiContext, views: &[EntryView]) -> Vec<Vec<String>> {
    let pretty = ctx.mode.is_pretty();
    views
        .iter()
        .map(|view| match view {
            EntryView::Decrypted { id, entry } => vec![
                short_id(id),
                format_datetime(&entry.metadata.entry_date, pretty),
                truncate(&single_line(&entry.title), TITLE_MAX),
                entry
                    .metadata
                    .mood
                    .map(|m| m.to_string())
                    .unwrap_or_default(),
                entry.tags.join(","),
            ],
            EntryView::Undecryptable { id, metadata, .. } => vec![
                short_id(id),
                format_datetime(&metadata.entry_date, pretty),
                if pretty {
                    ui::badge(ctx, Badge::Err, UNDECRYPTABLE_TITLE)
                } else {
                    UNDECRYPTABLE_TITLE.to_string()
                },
                metadata.mood.map(|m| m.to_string()).unwrap_or_default(),
                String::new(),
            ],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::OutputMode;

    fn plain_ctx() -> UiContext {
        UiContext {
            is_tty: false,
            color: false,
            unicode: false,
            width: 80,
            mode: OutputMode::Plain,
        }
    }

    #[test]
    fn test_undecryptable_row_shows_placeholder() {
        let views = vec![EntryView::Undecryptable {
            id: Uuid::new_v4(),
            metadata: EntryMetadata::default(),
            reason: "tag mismatch".to_string(),
        }];
        let rows = list_rows(&plain_ctx(), &views);
        assert_eq!(rows[0][2], UNDECRYPTABLE_TITLE);
        assert_eq!(rows[0].len(), LIST_COLUMNS.len());
    }

    #[test]
    fn test_entry_lines_plain() {
        let id = Uuid::new_v4();
        let entry = DiaryEntry::new("Line\nbreak", "Body text").with_tags(vec!["a".into()]);
        let lines = entry_lines(&plain_ctx(), id, &entry);
        assert!(lines.contains(&"title=Line break".to_string()));
        assert!(lines.contains(&"tags=a".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("Body text"));
    }
}
