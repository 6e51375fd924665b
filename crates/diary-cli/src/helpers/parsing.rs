//! Parsing helpers for dates, tags, coordinates and attachments.

use chrono::{DateTime, NaiveDate, Utc};

use diary_core::entry::Coordinates;

use crate::errors::CliError;

fn invalid(message: String) -> anyhow::Error {
    CliError::invalid_input(message).into()
}

/// Parse a datetime string (ISO-8601 or YYYY-MM-DD).
pub fn parse_datetime(value: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let naive = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| invalid(format!("Invalid date value: {}", value)))?;
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
    }

    Err(invalid(format!(
        "Invalid date/time (expected ISO-8601 or YYYY-MM-DD): {}",
        value
    )))
}

/// Normalize tags: split on commas, trim, drop empties and duplicates.
pub fn parse_tags(raw: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.iter().flat_map(|t| t.split(',')) {
        let tag = tag.trim();
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Parse `LAT,LON`.
pub fn parse_coordinates(value: &str) -> anyhow::Result<Coordinates> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| invalid(format!("Invalid coordinates (expected LAT,LON): {}", value)))?;
    let latitude: f64 = lat
        .trim()
        .parse()
        .map_err(|_| invalid(format!("Invalid latitude: {}", lat)))?;
    let longitude: f64 = lon
        .trim()
        .parse()
        .map_err(|_| invalid(format!("Invalid longitude: {}", lon)))?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(invalid(format!("Coordinates out of range: {}", value)));
    }
    Ok(Coordinates {
        latitude,
        longitude,
    })
}

/// Parse `URL` or `URL|CAPTION`.
pub fn parse_image(value: &str) -> (String, Option<String>) {
    match value.split_once('|') {
        Some((url, caption)) => {
            let caption = caption.trim();
            (
                url.trim().to_string(),
                (!caption.is_empty()).then(|| caption.to_string()),
            )
        }
        None => (value.trim().to_string(), None),
    }
}
