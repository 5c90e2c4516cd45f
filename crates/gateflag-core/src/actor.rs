// crates/gateflag-core/src/actor.rs
// ============================================================================
// Module: Gateflag Actor
// Description: Stable actor identity and property access for gate evaluation.
// Purpose: Let application entities participate in gate decisions without the
//          core depending on any application type.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! An actor is any application value with a stable string identifier. Gates
//! that need more than identity (the expression gate) additionally read a
//! `properties` map harvested from the actor.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;

// ============================================================================
// SECTION: ActorLike
// ============================================================================

/// Implemented by any application value that can participate in gate
/// evaluation. The blanket `Actor` type below is the canonical value-object
/// form; implement this trait directly on domain types to avoid an
/// allocation-per-call wrapper.
pub trait ActorLike {
    /// Returns the actor's stable identifier.
    ///
    /// # Invariants
    /// - Never returns an empty string; an empty id is treated as no actor
    ///   by [`crate::feature::Feature::enabled`].
    fn flipper_id(&self) -> String;

    /// Returns properties read by the expression gate. Defaults to empty.
    fn flipper_properties(&self) -> BTreeMap<String, Value> {
        BTreeMap::new()
    }
}

// ============================================================================
// SECTION: Actor
// ============================================================================

/// Value-object actor: `{ id, properties }`.
///
/// # Invariants
/// - `id` is never the empty string for a constructed `Actor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    id: String,
    properties: BTreeMap<String, Value>,
}

impl Actor {
    /// Creates an actor, returning `None` if `id` is empty.
    ///
    /// There is no infallible constructor: an empty id would violate the
    /// struct's invariant, so callers working with trusted literals should
    /// still route through this and handle the (unreachable in practice)
    /// `None` case explicitly.
    #[must_use]
    pub fn try_new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() {
            return None;
        }
        Some(Self {
            id,
            properties: BTreeMap::new(),
        })
    }

    /// Attaches a property to the actor, replacing any existing value.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Returns the actor id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the actor's properties.
    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }
}

impl ActorLike for Actor {
    fn flipper_id(&self) -> String {
        self.id.clone()
    }

    fn flipper_properties(&self) -> BTreeMap<String, Value> {
        self.properties.clone()
    }
}

impl<T: ActorLike + ?Sized> ActorLike for &T {
    fn flipper_id(&self) -> String {
        (**self).flipper_id()
    }

    fn flipper_properties(&self) -> BTreeMap<String, Value> {
        (**self).flipper_properties()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_new_rejects_empty_id() {
        assert!(Actor::try_new("").is_none());
    }

    #[test]
    fn try_new_accepts_non_empty_id() {
        let actor = Actor::try_new("42").expect("actor");
        assert_eq!(actor.id(), "42");
    }

    #[test]
    fn with_property_overwrites_existing_key() {
        let actor = Actor::try_new("1")
            .expect("non-empty id")
            .with_property("plan", "basic")
            .with_property("plan", "pro");
        assert_eq!(actor.properties().get("plan"), Some(&Value::from("pro")));
    }

    #[test]
    fn actor_like_blanket_impl_for_reference() {
        let actor = Actor::try_new("7").expect("non-empty id");
        fn id_of(a: &impl ActorLike) -> String {
            a.flipper_id()
        }
        assert_eq!(id_of(&actor), "7");
    }
}
