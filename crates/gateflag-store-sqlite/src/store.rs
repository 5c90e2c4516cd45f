// crates/gateflag-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Adapter
// Description: Durable Adapter backed by SQLite WAL.
// Purpose: Persist gate values as canonical JSON in an append-only-friendly
//          schema, surviving process restarts.
// Dependencies: gateflag_core::{Adapter, AdapterError, GateKind, GateValues},
//               rusqlite, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Each feature is one row: its name, and the JSON-serialized
//! [`gateflag_core::GateValues`] blob. Reads deserialize the blob; writes
//! read-modify-write within a single connection guarded by a `Mutex`, since
//! `rusqlite::Connection` is not `Sync`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::PoisonError;

use gateflag_core::Adapter;
use gateflag_core::AdapterError;
use gateflag_core::GateKind;
use gateflag_core::GateValue;
use gateflag_core::GateValues;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for [`SqliteAdapter`].
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised opening or operating a [`SqliteAdapter`].
#[derive(Debug, thiserror::Error)]
pub enum SqliteStoreError {
    /// The configured path failed validation before `SQLite` was touched.
    #[error("sqlite store path invalid: {0}")]
    InvalidPath(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(#[from] rusqlite::Error),
    /// A stored gate values blob failed to deserialize.
    #[error("sqlite store corrupt row for feature {0:?}: {1}")]
    Corrupt(String, String),
}

fn validate_path(path: &Path) -> Result<(), SqliteStoreError> {
    let as_str = path.to_string_lossy();
    if as_str.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::InvalidPath(format!(
            "path exceeds {MAX_TOTAL_PATH_LENGTH} bytes"
        )));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::InvalidPath(format!(
                "path component exceeds {MAX_PATH_COMPONENT_LENGTH} bytes"
            )));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: SqliteAdapter
// ============================================================================

/// A durable [`Adapter`] backed by `SQLite` in WAL mode.
#[derive(Debug)]
pub struct SqliteAdapter {
    connection: Mutex<Connection>,
}

impl SqliteAdapter {
    /// Opens (creating if needed) a `SQLite`-backed adapter at the configured
    /// path.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] if the path fails validation or `SQLite`
    /// fails to open or migrate the database.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_path(&config.path)?;
        let connection = Connection::open(&config.path)?;
        connection.busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))?;
        connection.pragma_update(None, "journal_mode", "wal")?;
        connection.pragma_update(None, "synchronous", config.sync_mode.pragma_value())?;
        Self::migrate(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Opens an in-memory database, useful for tests.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] if `SQLite` fails to open or migrate.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let connection = Connection::open_in_memory()?;
        Self::migrate(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn migrate(connection: &Connection) -> Result<(), SqliteStoreError> {
        connection.execute_batch(
            "CREATE TABLE IF NOT EXISTS gateflag_schema (version INTEGER NOT NULL);
             CREATE TABLE IF NOT EXISTS gateflag_features (
                 name TEXT PRIMARY KEY,
                 gate_values_json TEXT NOT NULL
             );",
        )?;
        let existing: Option<i64> = connection
            .query_row("SELECT version FROM gateflag_schema LIMIT 1", [], |row| row.get(0))
            .optional()?;
        if existing.is_none() {
            connection.execute("INSERT INTO gateflag_schema (version) VALUES (?1)", params![SCHEMA_VERSION])?;
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.connection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_values(connection: &Connection, name: &str) -> Result<Option<GateValues>, AdapterError> {
        let json: Option<String> = connection
            .query_row(
                "SELECT gate_values_json FROM gateflag_features WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| AdapterError::Backend(err.to_string()))?;
        json.map(|text| {
            serde_json::from_str(&text).map_err(|err| AdapterError::Backend(format!("corrupt row for {name:?}: {err}")))
        })
        .transpose()
    }

    fn write_values(connection: &Connection, name: &str, values: &GateValues) -> Result<(), AdapterError> {
        let json = serde_json::to_string(values).map_err(|err| AdapterError::Backend(err.to_string()))?;
        connection
            .execute(
                "INSERT INTO gateflag_features (name, gate_values_json) VALUES (?1, ?2)
                 ON CONFLICT(name) DO UPDATE SET gate_values_json = excluded.gate_values_json",
                params![name, json],
            )
            .map_err(|err| AdapterError::Backend(err.to_string()))?;
        Ok(())
    }
}

impl Adapter for SqliteAdapter {
    fn features(&self) -> Result<BTreeSet<String>, AdapterError> {
        let connection = self.lock();
        let mut statement = connection
            .prepare("SELECT name FROM gateflag_features")
            .map_err(|err| AdapterError::Backend(err.to_string()))?;
        let names = statement
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|err| AdapterError::Backend(err.to_string()))?
            .collect::<Result<BTreeSet<String>, _>>()
            .map_err(|err| AdapterError::Backend(err.to_string()))?;
        Ok(names)
    }

    fn add(&self, name: &str) -> Result<(), AdapterError> {
        let connection = self.lock();
        if Self::read_values(&connection, name)?.is_none() {
            Self::write_values(&connection, name, &GateValues::empty())?;
        }
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), AdapterError> {
        let connection = self.lock();
        connection
            .execute("DELETE FROM gateflag_features WHERE name = ?1", params![name])
            .map_err(|err| AdapterError::Backend(err.to_string()))?;
        Ok(())
    }

    fn clear(&self, name: &str) -> Result<(), AdapterError> {
        let connection = self.lock();
        if Self::read_values(&connection, name)?.is_some() {
            Self::write_values(&connection, name, &GateValues::empty())?;
        }
        Ok(())
    }

    fn get(&self, name: &str) -> Result<GateValues, AdapterError> {
        let connection = self.lock();
        Ok(Self::read_values(&connection, name)?.unwrap_or_default())
    }

    fn enable(&self, name: &str, value: GateValue) -> Result<(), AdapterError> {
        let connection = self.lock();
        let mut values = Self::read_values(&connection, name)?.unwrap_or_default();
        values.merge(value);
        Self::write_values(&connection, name, &values)
    }

    fn disable(&self, name: &str, kind: GateKind, member: Option<&str>) -> Result<(), AdapterError> {
        let connection = self.lock();
        let Some(mut values) = Self::read_values(&connection, name)? else {
            return Ok(());
        };
        match (kind, member) {
            (GateKind::Actor, Some(id)) => {
                values.actors.remove(id);
            }
            (GateKind::Group, Some(group_name)) => {
                values.groups.remove(group_name);
            }
            _ => values.clear(kind),
        }
        Self::write_values(&connection, name, &values)
    }

    fn get_all(&self) -> Result<BTreeMap<String, GateValues>, AdapterError> {
        let connection = self.lock();
        let mut statement = connection
            .prepare("SELECT name, gate_values_json FROM gateflag_features")
            .map_err(|err| AdapterError::Backend(err.to_string()))?;
        let rows = statement
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|err| AdapterError::Backend(err.to_string()))?;
        let mut result = BTreeMap::new();
        for row in rows {
            let (name, json) = row.map_err(|err| AdapterError::Backend(err.to_string()))?;
            let values: GateValues =
                serde_json::from_str(&json).map_err(|err| AdapterError::Backend(format!("corrupt row for {name:?}: {err}")))?;
            result.insert(name, values);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateflag_core::EnableInput;
    use gateflag_core::Feature;
    use gateflag_core::NoopInstrumenter;
    use std::sync::Arc;

    fn adapter() -> Arc<SqliteAdapter> {
        Arc::new(SqliteAdapter::open_in_memory().expect("open"))
    }

    #[test]
    fn get_on_unknown_feature_returns_empty() {
        let adapter = adapter();
        assert_eq!(adapter.get("unknown").expect("get"), GateValues::empty());
    }

    #[test]
    fn round_trips_boolean_gate_through_feature() {
        let adapter = adapter();
        let feature = Feature::new("search_v2", adapter.clone(), Arc::new(NoopInstrumenter));
        feature.enable(EnableInput::Everyone).expect("enable");
        assert_eq!(feature.enabled(None), Ok(true));
    }

    #[test]
    fn remove_drops_feature_from_listing() {
        let adapter = adapter();
        adapter.add("search_v2").expect("add");
        adapter.remove("search_v2").expect("remove");
        assert!(!adapter.features().expect("features").contains("search_v2"));
    }

    #[test]
    fn clear_resets_but_keeps_feature_registered() {
        let adapter = adapter();
        adapter.enable("search_v2", GateValue::Boolean(true)).expect("enable");
        adapter.clear("search_v2").expect("clear");
        assert!(adapter.features().expect("features").contains("search_v2"));
        assert!(adapter.get("search_v2").expect("get").is_empty());
    }

    #[test]
    fn open_on_disk_path_persists_across_connections() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = SqliteStoreConfig {
            path: dir.path().join("gateflag.sqlite3"),
            busy_timeout_ms: 1_000,
            sync_mode: SqliteSyncMode::Normal,
        };
        {
            let adapter = SqliteAdapter::open(&config).expect("open");
            adapter.enable("search_v2", GateValue::Boolean(true)).expect("enable");
        }
        let reopened = SqliteAdapter::open(&config).expect("reopen");
        assert_eq!(reopened.get("search_v2").expect("get").boolean, Some(true));
    }

    #[test]
    fn rejects_oversized_path() {
        let config = SqliteStoreConfig {
            path: PathBuf::from("a".repeat(MAX_TOTAL_PATH_LENGTH + 1)),
            busy_timeout_ms: 1_000,
            sync_mode: SqliteSyncMode::Full,
        };
        assert!(matches!(SqliteAdapter::open(&config), Err(SqliteStoreError::InvalidPath(_))));
    }
}
