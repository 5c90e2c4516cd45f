// crates/gateflag-core/src/adapter.rs
// ============================================================================
// Module: Gateflag Adapter Contract
// Description: The storage seam `Feature` reads and writes through, plus an
//              in-memory reference implementation and a read-through
//              composite over two adapters.
// Purpose: Let Gateflag run against any backend (memory, SQLite, HTTP, a
//          key-value store) without `Feature` knowing which one is in use.
// Dependencies: crate::gate::GateKind, crate::gate_values::{GateValue,
//               GateValues}
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::gate::GateKind;
use crate::gate_values::GateValue;
use crate::gate_values::GateValues;

// ============================================================================
// SECTION: Adapter
// ============================================================================

/// The storage contract `Feature` uses to read and mutate gate values.
///
/// Implementors decide what "a feature is registered" means for their
/// backend, but must honor these shared contracts:
/// - `get` never fails because a feature is unknown; it returns
///   [`GateValues::empty`] for any name that was never added or enabled.
/// - `remove`, `clear`, and `disable` are idempotent: calling them on a name
///   that isn't registered, or a gate that isn't set, is a no-op success.
/// - `add` is idempotent: adding an already-registered name is a no-op
///   success.
pub trait Adapter: fmt::Debug + Send + Sync {
    /// Returns the names of every registered feature.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] on backend failure.
    fn features(&self) -> Result<BTreeSet<String>, AdapterError>;

    /// Registers a feature with no gate values set, if not already present.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] on backend failure.
    fn add(&self, name: &str) -> Result<(), AdapterError>;

    /// Deletes a feature and all of its gate values.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] on backend failure.
    fn remove(&self, name: &str) -> Result<(), AdapterError>;

    /// Resets a feature's gate values to empty, without deregistering it.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] on backend failure.
    fn clear(&self, name: &str) -> Result<(), AdapterError>;

    /// Returns a feature's stored gate values.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] on backend failure.
    fn get(&self, name: &str) -> Result<GateValues, AdapterError>;

    /// Returns stored gate values for several features at once.
    ///
    /// The default implementation calls [`Adapter::get`] once per name;
    /// backends with a real batch path should override it.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] on backend failure.
    fn get_multi(&self, names: &[&str]) -> Result<BTreeMap<String, GateValues>, AdapterError> {
        names.iter().map(|name| Ok(((*name).to_owned(), self.get(name)?))).collect()
    }

    /// Returns stored gate values for every registered feature.
    ///
    /// The default implementation composes [`Adapter::features`] and
    /// [`Adapter::get_multi`]; backends with a real batch path should
    /// override it.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] on backend failure.
    fn get_all(&self) -> Result<BTreeMap<String, GateValues>, AdapterError> {
        let names = self.features()?;
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        self.get_multi(&refs)
    }

    /// Merges a gate value into a feature, registering the feature first if
    /// needed. Actor and group values union into the existing set; every
    /// other kind replaces its slot outright.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] on backend failure.
    fn enable(&self, name: &str, value: GateValue) -> Result<(), AdapterError>;

    /// Removes part or all of a gate's value.
    ///
    /// `member` names a single actor id or group name to remove from the
    /// actor or group gate's set; for every other [`GateKind`], or when
    /// `member` is `None` for actor/group, the whole slot is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] on backend failure.
    fn disable(&self, name: &str, kind: GateKind, member: Option<&str>) -> Result<(), AdapterError>;
}

/// Errors raised by an [`Adapter`] implementation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdapterError {
    /// The backend rejected or failed the operation; the message is
    /// backend-specific (a SQLite error string, an HTTP status, …).
    #[error("adapter backend failed: {0}")]
    Backend(String),
}

// ============================================================================
// SECTION: MemoryAdapter
// ============================================================================

/// An in-process [`Adapter`] backed by a `Mutex`-guarded map. The only
/// adapter the core ships; every other backend lives in a satellite crate.
#[derive(Debug, Clone, Default)]
pub struct MemoryAdapter {
    features: Arc<Mutex<BTreeMap<String, GateValues>>>,
}

impl MemoryAdapter {
    /// Creates an empty in-memory adapter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the underlying map, recovering the data if a prior holder
    /// panicked while holding the lock.
    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, GateValues>> {
        self.features.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Adapter for MemoryAdapter {
    fn features(&self) -> Result<BTreeSet<String>, AdapterError> {
        Ok(self.lock().keys().cloned().collect())
    }

    fn add(&self, name: &str) -> Result<(), AdapterError> {
        self.lock().entry(name.to_owned()).or_default();
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), AdapterError> {
        self.lock().remove(name);
        Ok(())
    }

    fn clear(&self, name: &str) -> Result<(), AdapterError> {
        if let Some(values) = self.lock().get_mut(name) {
            values.clear_all();
        }
        Ok(())
    }

    fn get(&self, name: &str) -> Result<GateValues, AdapterError> {
        Ok(self.lock().get(name).cloned().unwrap_or_default())
    }

    fn enable(&self, name: &str, value: GateValue) -> Result<(), AdapterError> {
        self.lock().entry(name.to_owned()).or_default().merge(value);
        Ok(())
    }

    fn disable(&self, name: &str, kind: GateKind, member: Option<&str>) -> Result<(), AdapterError> {
        let mut guard = self.lock();
        let Some(values) = guard.get_mut(name) else {
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
        Ok(())
    }
}

// ============================================================================
// SECTION: CascadingAdapter
// ============================================================================

/// A read-through composite over an ordered chain of adapters.
///
/// Reads consult the chain in order and return the first adapter's result
/// whose features set contains the requested name (falling back to the last
/// adapter's answer if none do); writes are broadcast to every adapter in
/// the chain so they stay in sync.
#[derive(Debug, Clone)]
pub struct CascadingAdapter {
    chain: Vec<Arc<dyn Adapter>>,
}

impl CascadingAdapter {
    /// Builds a cascading adapter from an ordered, non-empty chain.
    #[must_use]
    pub fn new(chain: Vec<Arc<dyn Adapter>>) -> Self {
        Self { chain }
    }

    /// Returns the first adapter that reports `name` as registered, falling
    /// back to the chain's last adapter when none do.
    fn owner(&self, name: &str) -> Result<&Arc<dyn Adapter>, AdapterError> {
        for adapter in &self.chain {
            if adapter.features()?.contains(name) {
                return Ok(adapter);
            }
        }
        self.chain
            .last()
            .ok_or_else(|| AdapterError::Backend("cascading adapter has no members".to_owned()))
    }
}

impl Adapter for CascadingAdapter {
    fn features(&self) -> Result<BTreeSet<String>, AdapterError> {
        let mut names = BTreeSet::new();
        for adapter in &self.chain {
            names.extend(adapter.features()?);
        }
        Ok(names)
    }

    fn add(&self, name: &str) -> Result<(), AdapterError> {
        for adapter in &self.chain {
            adapter.add(name)?;
        }
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), AdapterError> {
        for adapter in &self.chain {
            adapter.remove(name)?;
        }
        Ok(())
    }

    fn clear(&self, name: &str) -> Result<(), AdapterError> {
        for adapter in &self.chain {
            adapter.clear(name)?;
        }
        Ok(())
    }

    fn get(&self, name: &str) -> Result<GateValues, AdapterError> {
        self.owner(name)?.get(name)
    }

    fn enable(&self, name: &str, value: GateValue) -> Result<(), AdapterError> {
        for adapter in &self.chain {
            adapter.enable(name, value.clone())?;
        }
        Ok(())
    }

    fn disable(&self, name: &str, kind: GateKind, member: Option<&str>) -> Result<(), AdapterError> {
        for adapter in &self.chain {
            adapter.disable(name, kind, member)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_on_unknown_feature_returns_empty() {
        let adapter = MemoryAdapter::new();
        assert_eq!(adapter.get("unknown").expect("get"), GateValues::empty());
    }

    #[test]
    fn add_registers_with_empty_values() {
        let adapter = MemoryAdapter::new();
        adapter.add("search_v2").expect("add");
        assert!(adapter.features().expect("features").contains("search_v2"));
    }

    #[test]
    fn add_is_idempotent() {
        let adapter = MemoryAdapter::new();
        adapter.enable("search_v2", GateValue::Boolean(true)).expect("enable");
        adapter.add("search_v2").expect("add should not clobber");
        assert_eq!(adapter.get("search_v2").expect("get").boolean, Some(true));
    }

    #[test]
    fn enable_unions_actor_ids() {
        let adapter = MemoryAdapter::new();
        adapter
            .enable("search_v2", GateValue::Actors(BTreeSet::from(["1".to_owned()])))
            .expect("enable");
        adapter
            .enable("search_v2", GateValue::Actors(BTreeSet::from(["2".to_owned()])))
            .expect("enable");
        let values = adapter.get("search_v2").expect("get");
        assert_eq!(values.actors, BTreeSet::from(["1".to_owned(), "2".to_owned()]));
    }

    #[test]
    fn disable_actor_removes_single_id() {
        let adapter = MemoryAdapter::new();
        adapter
            .enable(
                "search_v2",
                GateValue::Actors(BTreeSet::from(["1".to_owned(), "2".to_owned()])),
            )
            .expect("enable");
        adapter.disable("search_v2", GateKind::Actor, Some("1")).expect("disable");
        let values = adapter.get("search_v2").expect("get");
        assert_eq!(values.actors, BTreeSet::from(["2".to_owned()]));
    }

    #[test]
    fn disable_boolean_clears_slot_regardless_of_member() {
        let adapter = MemoryAdapter::new();
        adapter.enable("search_v2", GateValue::Boolean(true)).expect("enable");
        adapter.disable("search_v2", GateKind::Boolean, None).expect("disable");
        assert_eq!(adapter.get("search_v2").expect("get").boolean, None);
    }

    #[test]
    fn disable_on_unregistered_feature_is_noop() {
        let adapter = MemoryAdapter::new();
        adapter.disable("ghost", GateKind::Boolean, None).expect("disable");
    }

    #[test]
    fn clear_keeps_feature_registered_but_empty() {
        let adapter = MemoryAdapter::new();
        adapter.enable("search_v2", GateValue::Boolean(true)).expect("enable");
        adapter.clear("search_v2").expect("clear");
        assert!(adapter.features().expect("features").contains("search_v2"));
        assert!(adapter.get("search_v2").expect("get").is_empty());
    }

    #[test]
    fn remove_deregisters_feature() {
        let adapter = MemoryAdapter::new();
        adapter.add("search_v2").expect("add");
        adapter.remove("search_v2").expect("remove");
        assert!(!adapter.features().expect("features").contains("search_v2"));
    }

    #[test]
    fn cascading_adapter_reads_through_to_fallback() {
        let primary = Arc::new(MemoryAdapter::new());
        let fallback = Arc::new(MemoryAdapter::new());
        fallback
            .enable("legacy_feature", GateValue::Boolean(true))
            .expect("enable on fallback");
        let cascading = CascadingAdapter::new(vec![primary.clone(), fallback]);
        assert_eq!(cascading.get("legacy_feature").expect("get").boolean, Some(true));
    }

    #[test]
    fn cascading_adapter_broadcasts_writes() {
        let first = Arc::new(MemoryAdapter::new());
        let second = Arc::new(MemoryAdapter::new());
        let cascading = CascadingAdapter::new(vec![first.clone(), second.clone()]);
        cascading.enable("search_v2", GateValue::Boolean(true)).expect("enable");
        assert_eq!(first.get("search_v2").expect("get").boolean, Some(true));
        assert_eq!(second.get("search_v2").expect("get").boolean, Some(true));
    }

    #[test]
    fn get_multi_default_impl_covers_every_name() {
        let adapter = MemoryAdapter::new();
        adapter.enable("a", GateValue::Boolean(true)).expect("enable");
        let result = adapter.get_multi(&["a", "b"]).expect("get_multi");
        assert_eq!(result.len(), 2);
        assert_eq!(result["a"].boolean, Some(true));
        assert_eq!(result["b"], GateValues::empty());
    }

    #[test]
    fn get_all_default_impl_covers_every_registered_feature() {
        let adapter = MemoryAdapter::new();
        adapter.enable("a", GateValue::Boolean(true)).expect("enable");
        adapter.add("b").expect("add");
        let result = adapter.get_all().expect("get_all");
        assert_eq!(result.len(), 2);
    }
}
