//! SQLite-backed entry store.
//!
//! One row per entry. The sealed body is a single JSON document; a few clear
//! metadata columns are duplicated out of it so listing can filter and sort
//! without touching ciphertext.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::row::EntryRow;
use super::traits::EntryStore;
use super::types::{EntryFilter, EntryRecord, Listed};
use crate::error::{DiaryError, Result};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS entries (
        id TEXT PRIMARY KEY,
        owner_id TEXT NOT NULL,
        body_json TEXT NOT NULL,
        password_hash TEXT,
        entry_date TEXT NOT NULL,
        category TEXT,
        is_favorite INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS entries_owner_date ON entries (owner_id, entry_date DESC);
"#;

/// SQLite entry store.
pub struct SqliteEntryStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl SqliteEntryStore {
    /// Open (or create) a store at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(path = %path.display(), "opened entry store");
        Ok(Self {
            path: Some(path.to_path_buf()),
            conn: Mutex::new(conn),
        })
    }

    /// A throwaway store for tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            path: None,
            conn: Mutex::new(conn),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DiaryError::Storage("SQLite connection poisoned".to_string()))
    }

    fn category_column(record: &EntryRecord) -> Option<String> {
        record.body.metadata.category.map(|c| c.to_string())
    }
}

impl EntryStore for SqliteEntryStore {
    fn insert(&self, record: &EntryRecord) -> Result<()> {
        let body_json = serde_json::to_string(&record.body)?;
        let conn = self.lock_conn()?;
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM entries WHERE id = ?",
                [record.id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(DiaryError::Storage(format!(
                "Entry {} already exists",
                record.id
            )));
        }

        conn.execute(
            r#"
            INSERT INTO entries (id, owner_id, body_json, password_hash, entry_date, category,
                                 is_favorite, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.id.to_string(),
                record.owner_id.to_string(),
                body_json,
                record.password_hash.as_ref().map(|v| v.as_str().to_string()),
                record.body.metadata.entry_date.to_rfc3339(),
                Self::category_column(record),
                record.body.metadata.is_favorite,
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
            ],
        )?;
        tracing::debug!(entry_id = %record.id, "inserted entry");
        Ok(())
    }

    fn replace(&self, record: &EntryRecord) -> Result<bool> {
        let body_json = serde_json::to_string(&record.body)?;
        let conn = self.lock_conn()?;
        let changed = conn.execute(
            r#"
            UPDATE entries
            SET body_json = ?1, password_hash = ?2, entry_date = ?3, category = ?4,
                is_favorite = ?5, updated_at = ?6
            WHERE id = ?7 AND owner_id = ?8
            "#,
            params![
                body_json,
                record.password_hash.as_ref().map(|v| v.as_str().to_string()),
                record.body.metadata.entry_date.to_rfc3339(),
                Self::category_column(record),
                record.body.metadata.is_favorite,
                record.updated_at.to_rfc3339(),
                record.id.to_string(),
                record.owner_id.to_string(),
            ],
        )?;
        Ok(changed > 0)
    }

    fn get(&self, owner_id: &Uuid, id: &Uuid) -> Result<Option<EntryRecord>> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM entries WHERE id = ? AND owner_id = ?",
                    EntryRow::COLUMNS
                ),
                [id.to_string(), owner_id.to_string()],
                EntryRow::from_row,
            )
            .optional()?;
        row.map(EntryRecord::try_from).transpose()
    }

    fn list(&self, owner_id: &Uuid, filter: &EntryFilter) -> Result<Vec<Listed<EntryRecord>>> {
        let conn = self.lock_conn()?;

        let mut conditions: Vec<&str> = vec!["owner_id = ?"];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner_id.to_string())];

        if let Some(category) = filter.category {
            conditions.push("category = ?");
            params.push(Box::new(category.to_string()));
        }
        if filter.favorites_only {
            conditions.push("is_favorite = 1");
        }
        if let Some(since) = filter.since {
            conditions.push("entry_date >= ?");
            params.push(Box::new(since.to_rfc3339()));
        }
        if let Some(until) = filter.until {
            conditions.push("entry_date <= ?");
            params.push(Box::new(until.to_rfc3339()));
        }

        let mut query = format!(
            "SELECT {} FROM entries WHERE {} ORDER BY entry_date DESC, created_at DESC",
            EntryRow::COLUMNS,
            conditions.join(" AND ")
        );
        if let Some(limit) = filter.limit {
            query.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(params.iter()),
            EntryRow::from_row,
        )?;

        let mut listed = Vec::new();
        for row in rows {
            listed.push(row?.into_listed()?);
        }
        Ok(listed)
    }

    fn delete(&self, owner_id: &Uuid, id: &Uuid) -> Result<bool> {
        let conn = self.lock_conn()?;
        let removed = conn.execute(
            "DELETE FROM entries WHERE id = ? AND owner_id = ?",
            [id.to_string(), owner_id.to_string()],
        )?;
        if removed > 0 {
            tracing::debug!(entry_id = %id, "deleted entry");
        }
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{bind_for_use, compute_verifier, SecretKey};
    use crate::entry::{seal_entry, Category, DiaryEntry, EntryMetadata};

    fn record(owner: Uuid, title: &str) -> EntryRecord {
        let cipher = bind_for_use(&SecretKey::from_bytes([7u8; 32]));
        let body = seal_entry(&DiaryEntry::new(title, "body"), &cipher).unwrap();
        EntryRecord::new(owner, body)
    }

    #[test]
    fn test_insert_get_round_trip() {
        let store = SqliteEntryStore::open_in_memory().unwrap();
        let owner = Uuid::new_v4();
        let rec = record(owner, "first").with_password_hash(compute_verifier("pw"));
        store.insert(&rec).unwrap();

        let loaded = store.get(&owner, &rec.id).unwrap().unwrap();
        assert_eq!(loaded.body, rec.body);
        assert_eq!(loaded.password_hash, rec.password_hash);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let store = SqliteEntryStore::open_in_memory().unwrap();
        let rec = record(Uuid::new_v4(), "dup");
        store.insert(&rec).unwrap();
        assert!(matches!(store.insert(&rec), Err(DiaryError::Storage(_))));
    }

    #[test]
    fn test_lookups_are_owner_scoped() {
        let store = SqliteEntryStore::open_in_memory().unwrap();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let rec = record(owner, "mine");
        store.insert(&rec).unwrap();

        assert!(store.get(&stranger, &rec.id).unwrap().is_none());
        assert!(!store.delete(&stranger, &rec.id).unwrap());
        let mut hijack = rec.clone();
        hijack.owner_id = stranger;
        assert!(!store.replace(&hijack).unwrap());
        assert!(store.list(&stranger, &EntryFilter::default()).unwrap().is_empty());
        assert!(store.get(&owner, &rec.id).unwrap().is_some());
    }

    #[test]
    fn test_list_filters_and_limits() {
        let store = SqliteEntryStore::open_in_memory().unwrap();
        let owner = Uuid::new_v4();
        for (i, category) in [Category::Work, Category::Travel, Category::Work]
            .into_iter()
            .enumerate()
        {
            let mut rec = record(owner, &format!("entry {}", i));
            rec.body.metadata = EntryMetadata {
                category: Some(category),
                is_favorite: i == 2,
                entry_date: chrono::Utc::now() - chrono::Duration::days(i as i64),
                ..EntryMetadata::default()
            };
            store.insert(&rec).unwrap();
        }

        let all = store.list(&owner, &EntryFilter::default()).unwrap();
        assert_eq!(all.len(), 3);
        let first = all[0].readable().unwrap();
        let second = all[1].readable().unwrap();
        assert!(first.body.metadata.entry_date >= second.body.metadata.entry_date);

        let work = EntryFilter {
            category: Some(Category::Work),
            ..EntryFilter::default()
        };
        assert_eq!(store.list(&owner, &work).unwrap().len(), 2);

        let favorites = EntryFilter {
            favorites_only: true,
            ..EntryFilter::default()
        };
        assert_eq!(store.list(&owner, &favorites).unwrap().len(), 1);

        let limited = EntryFilter::default().with_limit(1);
        assert_eq!(store.list(&owner, &limited).unwrap().len(), 1);
    }

    #[test]
    fn test_replace_and_delete() {
        let store = SqliteEntryStore::open_in_memory().unwrap();
        let owner = Uuid::new_v4();
        let mut rec = record(owner, "before");
        store.insert(&rec).unwrap();

        rec.body = record(owner, "after").body;
        rec.updated_at = chrono::Utc::now();
        assert!(store.replace(&rec).unwrap());
        assert_eq!(store.get(&owner, &rec.id).unwrap().unwrap().body, rec.body);

        assert!(store.delete(&owner, &rec.id).unwrap());
        assert!(store.get(&owner, &rec.id).unwrap().is_none());
        assert!(!store.delete(&owner, &rec.id).unwrap());
    }
}
