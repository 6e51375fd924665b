//! Entry ID resolution.

use uuid::Uuid;

use diary_core::storage::{EntryFilter, EntryStore};
use diary_core::DiaryService;

use crate::errors::CliError;

/// Shortest prefix accepted in place of a full ID.
const MIN_PREFIX_LEN: usize = 4;

/// Resolve a full UUID or a unique ID prefix (as printed by `diary list`).
pub fn resolve_entry_id<S: EntryStore>(
    service: &DiaryService<S>,
    owner_id: Uuid,
    input: &str,
) -> anyhow::Result<Uuid> {
    let input = input.trim();
    if let Ok(id) = Uuid::parse_str(input) {
        return Ok(id);
    }

    let prefix = input.to_ascii_lowercase();
    if prefix.len() < MIN_PREFIX_LEN || !prefix.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
    {
        return Err(CliError::invalid_input(format!(
            "Invalid entry ID: {} (use a UUID or at least {} hex characters)",
            input, MIN_PREFIX_LEN
        ))
        .into());
    }

    let matches: Vec<Uuid> = service
        .list_sealed(owner_id, &EntryFilter::default())?
        .into_iter()
        .map(|listed| listed.id())
        .filter(|id| id.to_string().starts_with(&prefix))
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(CliError::not_found(
            format!("No entry matches {}", input),
            "Hint: Run `diary list` to find entry IDs.",
        )
        .into()),
        _ => Err(CliError::invalid_input(format!(
            "Entry ID prefix {} is ambiguous ({} matches); use more characters",
            input,
            matches.len()
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diary_core::crypto::{bind_for_use, SecretKey};
    use diary_core::{seal_entry, DerivationPool, DiaryEntry, SqliteEntryStore};

    fn service_with_entry() -> (DiaryService<SqliteEntryStore>, Uuid, Uuid) {
        let service = DiaryService::new(
            SqliteEntryStore::open_in_memory().unwrap(),
            DerivationPool::new(1),
        );
        let owner = Uuid::new_v4();
        let handle = bind_for_use(&SecretKey::from_bytes([1u8; 32]));
        let sealed = seal_entry(&DiaryEntry::new("t", "c"), &handle).unwrap();
        let summary = service.add_sealed(owner, sealed).unwrap();
        (service, owner, summary.id)
    }

    #[test]
    fn test_full_uuid_passes_through() {
        let (service, owner, _) = service_with_entry();
        let other = Uuid::new_v4();
        assert_eq!(
            resolve_entry_id(&service, owner, &other.to_string()).unwrap(),
            other
        );
    }

    #[test]
    fn test_prefix_resolves() {
        let (service, owner, id) = service_with_entry();
        let prefix = &id.to_string()[..8];
        assert_eq!(resolve_entry_id(&service, owner, prefix).unwrap(), id);
    }

    #[test]
    fn test_prefix_is_owner_scoped() {
        let (service, _, id) = service_with_entry();
        let prefix = &id.to_string()[..8];
        assert!(resolve_entry_id(&service, Uuid::new_v4(), prefix).is_err());
    }

    #[test]
    fn test_short_or_non_hex_prefix_rejected() {
        let (service, owner, _) = service_with_entry();
        assert!(resolve_entry_id(&service, owner, "ab").is_err());
        assert!(resolve_entry_id(&service, owner, "zzzzzzzz").is_err());
    }
}
