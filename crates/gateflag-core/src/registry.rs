// crates/gateflag-core/src/registry.rs
// ============================================================================
// Module: Gateflag Group Registry
// Description: Process-global name-to-predicate map consulted by the group
//              gate.
// Purpose: Let application startup code register named actor classifications
//          ("staff", "beta_testers") once, by reference, so the group gate
//          can test membership without the core knowing what a "group" means.
// Dependencies: crate::actor::ActorLike
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::OnceLock;

use crate::actor::ActorLike;

// ============================================================================
// SECTION: Group
// ============================================================================

/// A named actor predicate: returns whether a given actor belongs to the
/// group.
type Predicate = Arc<dyn Fn(&dyn ActorLike) -> bool + Send + Sync>;

/// A registered group: a name paired with the predicate that tests
/// membership in it.
#[derive(Clone)]
pub struct Group {
    name: String,
    predicate: Predicate,
}

impl Group {
    /// Creates a group from a name and membership predicate.
    pub fn new(name: impl Into<String>, predicate: impl Fn(&dyn ActorLike) -> bool + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Returns the group's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tests whether `actor` belongs to this group.
    #[must_use]
    pub fn matches(&self, actor: &dyn ActorLike) -> bool {
        (self.predicate)(actor)
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group").field("name", &self.name).finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: GroupRegistry
// ============================================================================

/// A name-to-[`Group`] map. Registration is idempotent-replace: registering
/// an already-known name swaps its predicate without needing a prior
/// deregistration.
pub struct GroupRegistry {
    groups: Mutex<BTreeMap<String, Group>>,
}

impl Default for GroupRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            groups: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns the process-wide registry instance the group gate consults
    /// when no explicit registry is supplied.
    #[must_use]
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<GroupRegistry> = OnceLock::new();
        GLOBAL.get_or_init(Self::new)
    }

    /// Registers a group, replacing any existing group of the same name.
    pub fn register(&self, name: impl Into<String>, predicate: impl Fn(&dyn ActorLike) -> bool + Send + Sync + 'static) {
        let name = name.into();
        let group = Group::new(name.clone(), predicate);
        let mut groups = self.groups.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        groups.insert(name, group);
    }

    /// Removes a group, if present.
    pub fn deregister(&self, name: &str) {
        let mut groups = self.groups.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        groups.remove(name);
    }

    /// Returns a clone of a registered group.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Group> {
        let groups = self.groups.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        groups.get(name).cloned()
    }

    /// Returns `true` when a group of this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        let groups = self.groups.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        groups.contains_key(name)
    }

    /// Tests whether `actor` belongs to the named group.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownGroup`] when no group of that name is
    /// registered.
    pub fn matches(&self, name: &str, actor: &dyn ActorLike) -> Result<bool, RegistryError> {
        self.get(name)
            .map(|group| group.matches(actor))
            .ok_or_else(|| RegistryError::UnknownGroup(name.to_owned()))
    }

    /// Returns the names of every registered group, in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let groups = self.groups.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        groups.keys().cloned().collect()
    }
}

/// Errors raised by [`GroupRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The named group was never registered.
    #[error("group {0:?} is not registered")]
    UnknownGroup(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Actor;

    #[test]
    fn register_then_matches() {
        let registry = GroupRegistry::new();
        registry.register("staff", |actor| actor.flipper_id() == "1");
        let staff = Actor::try_new("1").expect("id");
        let not_staff = Actor::try_new("2").expect("id");
        assert_eq!(registry.matches("staff", &staff), Ok(true));
        assert_eq!(registry.matches("staff", &not_staff), Ok(false));
    }

    #[test]
    fn unknown_group_errors() {
        let registry = GroupRegistry::new();
        let actor = Actor::try_new("1").expect("id");
        assert_eq!(
            registry.matches("ghost", &actor),
            Err(RegistryError::UnknownGroup("ghost".to_owned()))
        );
    }

    #[test]
    fn register_is_idempotent_replace() {
        let registry = GroupRegistry::new();
        registry.register("staff", |_| false);
        registry.register("staff", |_| true);
        let actor = Actor::try_new("1").expect("id");
        assert_eq!(registry.matches("staff", &actor), Ok(true));
    }

    #[test]
    fn deregister_removes_group() {
        let registry = GroupRegistry::new();
        registry.register("staff", |_| true);
        registry.deregister("staff");
        assert!(!registry.contains("staff"));
    }

    #[test]
    fn names_lists_registered_groups_sorted() {
        let registry = GroupRegistry::new();
        registry.register("zeta", |_| true);
        registry.register("alpha", |_| true);
        assert_eq!(registry.names(), vec!["alpha".to_owned(), "zeta".to_owned()]);
    }
}
