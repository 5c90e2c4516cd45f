// crates/gateflag-adapters-net/src/kv.rs
// ============================================================================
// Module: Key-Value Adapter
// Description: Adapter over a generic flat key-value backend.
// Purpose: Let any key-value store (Redis, etcd, a cloud KV service) back
//          Gateflag by implementing one small trait, rather than the full
//          Adapter contract.
// Dependencies: gateflag_core::{Adapter, AdapterError, GateKind, GateValues}
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Mutex;
use std::sync::PoisonError;

use gateflag_core::Adapter;
use gateflag_core::AdapterError;
use gateflag_core::GateKind;
use gateflag_core::GateValue;
use gateflag_core::GateValues;

/// Prefix every feature's value key carries, so a backend shared with other
/// data can be scanned for just Gateflag's keys.
const KEY_PREFIX: &str = "gateflag:feature:";

/// Errors raised by a [`KeyValueBackend`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("key-value backend failed: {0}")]
pub struct KeyValueBackendError(pub String);

/// A minimal flat key-value store: get, set, delete, and prefix scan.
/// Implement this for a concrete backend to get a full [`Adapter`] for free
/// via [`KeyValueAdapter`].
pub trait KeyValueBackend: fmt::Debug + Send + Sync {
    /// Reads a value by key.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueBackendError`] on backend failure.
    fn get(&self, key: &str) -> Result<Option<String>, KeyValueBackendError>;

    /// Writes a value by key, replacing any existing value.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueBackendError`] on backend failure.
    fn set(&self, key: &str, value: String) -> Result<(), KeyValueBackendError>;

    /// Deletes a key, if present.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueBackendError`] on backend failure.
    fn delete(&self, key: &str) -> Result<(), KeyValueBackendError>;

    /// Lists every key starting with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueBackendError`] on backend failure.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, KeyValueBackendError>;
}

/// An in-memory [`KeyValueBackend`], for tests and demos.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueBackend {
    entries: Mutex<BTreeMap<String, String>>,
}

impl InMemoryKeyValueBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueBackend for InMemoryKeyValueBackend {
    fn get(&self, key: &str) -> Result<Option<String>, KeyValueBackendError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), KeyValueBackendError> {
        self.lock().insert(key.to_owned(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), KeyValueBackendError> {
        self.lock().remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, KeyValueBackendError> {
        Ok(self.lock().keys().filter(|k| k.starts_with(prefix)).cloned().collect())
    }
}

/// An [`Adapter`] over any [`KeyValueBackend`]. Each feature's values are
/// stored as one JSON blob under `gateflag:feature:{name}`.
#[derive(Debug)]
pub struct KeyValueAdapter<B: KeyValueBackend> {
    backend: B,
}

impl<B: KeyValueBackend> KeyValueAdapter<B> {
    /// Wraps a backend.
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    fn key(name: &str) -> String {
        format!("{KEY_PREFIX}{name}")
    }

    fn read(&self, name: &str) -> Result<Option<GateValues>, AdapterError> {
        let Some(json) = self.backend.get(&Self::key(name)).map_err(|err| AdapterError::Backend(err.0))? else {
            return Ok(None);
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|err| AdapterError::Backend(format!("corrupt value for {name:?}: {err}")))
    }

    fn write(&self, name: &str, values: &GateValues) -> Result<(), AdapterError> {
        let json = serde_json::to_string(values).map_err(|err| AdapterError::Backend(err.to_string()))?;
        self.backend.set(&Self::key(name), json).map_err(|err| AdapterError::Backend(err.0))
    }
}

impl<B: KeyValueBackend> Adapter for KeyValueAdapter<B> {
    fn features(&self) -> Result<BTreeSet<String>, AdapterError> {
        let keys = self.backend.keys_with_prefix(KEY_PREFIX).map_err(|err| AdapterError::Backend(err.0))?;
        Ok(keys.into_iter().map(|key| key.trim_start_matches(KEY_PREFIX).to_owned()).collect())
    }

    fn add(&self, name: &str) -> Result<(), AdapterError> {
        if self.read(name)?.is_none() {
            self.write(name, &GateValues::empty())?;
        }
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), AdapterError> {
        self.backend.delete(&Self::key(name)).map_err(|err| AdapterError::Backend(err.0))
    }

    fn clear(&self, name: &str) -> Result<(), AdapterError> {
        if self.read(name)?.is_some() {
            self.write(name, &GateValues::empty())?;
        }
        Ok(())
    }

    fn get(&self, name: &str) -> Result<GateValues, AdapterError> {
        Ok(self.read(name)?.unwrap_or_default())
    }

    fn enable(&self, name: &str, value: GateValue) -> Result<(), AdapterError> {
        let mut values = self.read(name)?.unwrap_or_default();
        values.merge(value);
        self.write(name, &values)
    }

    fn disable(&self, name: &str, kind: GateKind, member: Option<&str>) -> Result<(), AdapterError> {
        let Some(mut values) = self.read(name)? else {
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
        self.write(name, &values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> KeyValueAdapter<InMemoryKeyValueBackend> {
        KeyValueAdapter::new(InMemoryKeyValueBackend::new())
    }

    #[test]
    fn get_on_unknown_feature_returns_empty() {
        let adapter = adapter();
        assert_eq!(adapter.get("unknown").expect("get"), GateValues::empty());
    }

    #[test]
    fn enable_then_get_round_trips() {
        let adapter = adapter();
        adapter.enable("search_v2", GateValue::Boolean(true)).expect("enable");
        assert_eq!(adapter.get("search_v2").expect("get").boolean, Some(true));
    }

    #[test]
    fn features_lists_only_gateflag_keys() {
        let backend = InMemoryKeyValueBackend::new();
        backend.set("unrelated:key", "x".to_owned()).expect("set");
        let adapter = KeyValueAdapter::new(backend);
        adapter.add("search_v2").expect("add");
        assert_eq!(adapter.features().expect("features"), BTreeSet::from(["search_v2".to_owned()]));
    }

    #[test]
    fn remove_deletes_key() {
        let adapter = adapter();
        adapter.add("search_v2").expect("add");
        adapter.remove("search_v2").expect("remove");
        assert!(!adapter.features().expect("features").contains("search_v2"));
    }
}
