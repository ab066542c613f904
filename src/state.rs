//! State Management - SQLite-backed persistence for freshness tokens
//!
//! This module provides:
//! - A small key-value capability ([`KeyValueStore`]) with SQLite and in-memory backings
//! - The freshness store that maps (scope, file) pairs onto that capability
//!
//! The database is stored in XDG_DATA_HOME/sciter-typings/state.db

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use crate::config::Config;
use crate::scope::Scope;
use crate::typings::TrackedFile;

/// Prefix shared by every freshness token key
pub const ETAG_KEY_PREFIX: &str = "sciter_typings_etag:";

/// A stored value along with when it was last written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Durable string key-value capability
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<StoredValue>>;

    /// Insert or replace the value under `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key` entirely. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// All entries whose key starts with `prefix`, ordered by key
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, StoredValue)>>;
}

/// SQLite-backed key-value store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the state database at the default location
    pub fn open() -> Result<Self> {
        let db_path = Self::default_db_path()?;
        Self::open_at(db_path)
    }

    /// Open or create the state database at a specific path
    pub fn open_at(path: PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.initialize()?;

        info!("State database opened at {}", path.display());
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.initialize()?;
        Ok(db)
    }

    /// Get the default database path
    pub fn default_db_path() -> Result<PathBuf> {
        Ok(Config::data_dir()?.join("state.db"))
    }

    fn initialize(&self) -> Result<()> {
        self.lock()?
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS kv_store (
                    key TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                "#,
            )
            .context("Failed to initialize database schema")?;

        debug!("Database schema initialized");
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("State database lock poisoned"))
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>> {
        let result = self
            .lock()?
            .query_row(
                "SELECT value, updated_at FROM kv_store WHERE key = ?1",
                params![key],
                |row| {
                    Ok(StoredValue {
                        value: row.get(0)?,
                        updated_at: parse_timestamp(&row.get::<_, String>(1)?),
                    })
                },
            )
            .optional()
            .context("Failed to query state entry")?;

        Ok(result)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.lock()?
            .execute(
                r#"
                INSERT INTO kv_store (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = ?2,
                    updated_at = ?3
                "#,
                params![key, value, now],
            )
            .context("Failed to upsert state entry")?;

        debug!("Stored state entry: {}", key);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.lock()?
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])
            .context("Failed to delete state entry")?;
        Ok(())
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, StoredValue)>> {
        let conn = self.lock()?;
        // substr avoids LIKE wildcards inside scope identities
        let mut stmt = conn.prepare(
            r#"
            SELECT key, value, updated_at
            FROM kv_store
            WHERE substr(key, 1, length(?1)) = ?1
            ORDER BY key
            "#,
        )?;

        let entries = stmt
            .query_map(params![prefix], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    StoredValue {
                        value: row.get(1)?,
                        updated_at: parse_timestamp(&row.get::<_, String>(2)?),
                    },
                ))
            })
            .context("Failed to query state entries")?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to collect state entries")?;

        Ok(entries)
    }
}

/// Volatile key-value store
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, StoredValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, StoredValue>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("Memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, StoredValue)>> {
        Ok(self
            .lock()?
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}

/// Per-(scope, file) freshness tokens on top of a [`KeyValueStore`]
#[derive(Clone)]
pub struct FreshnessStore {
    store: Arc<dyn KeyValueStore>,
}

impl FreshnessStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Key for one (scope, file) pair. File names never contain ':', so the
    /// last segment always identifies the file and scopes cannot collide.
    pub fn key(scope: &Scope, file: TrackedFile) -> String {
        format!("{}:{}", Self::scope_prefix(scope), file.file_name())
    }

    fn scope_prefix(scope: &Scope) -> String {
        format!("{}{}", ETAG_KEY_PREFIX, scope.identity())
    }

    pub fn get(&self, scope: &Scope, file: TrackedFile) -> Result<Option<String>> {
        Ok(self
            .store
            .get(&Self::key(scope, file))?
            .map(|stored| stored.value))
    }

    pub fn set(&self, scope: &Scope, file: TrackedFile, etag: &str) -> Result<()> {
        self.store.set(&Self::key(scope, file), etag)
    }

    pub fn clear(&self, scope: &Scope, file: TrackedFile) -> Result<()> {
        self.store.delete(&Self::key(scope, file))
    }

    /// Tokens currently held for `scope`, in declaration order
    pub fn tokens_for(&self, scope: &Scope) -> Result<Vec<(TrackedFile, StoredValue)>> {
        let prefix = format!("{}:", Self::scope_prefix(scope));
        let mut tokens: Vec<_> = self
            .store
            .scan_prefix(&prefix)?
            .into_iter()
            .filter_map(|(key, value)| {
                let name = key.strip_prefix(&prefix)?;
                TrackedFile::from_file_name(name).map(|file| (file, value))
            })
            .collect();

        tokens.sort_by_key(|(file, _)| *file);
        Ok(tokens)
    }
}
