// crates/gateflag-core/src/gate_values.rs
// ============================================================================
// Module: Gateflag Gate Values
// Description: Per-feature storage slots, one per gate kind.
// Purpose: Hold whatever each gate needs to evaluate (a flag, a set of ids, a
//          threshold, an expression tree) independently of the gates
//          themselves, so an `Adapter` can persist and round-trip them.
// Dependencies: crate::{gate::GateKind, values::{PercentageOfActors,
//               PercentageOfTime}, expression::Expression}
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::expression::Expression;
use crate::gate::GateKind;
use crate::values::PercentageOfActors;
use crate::values::PercentageOfTime;

// ============================================================================
// SECTION: GateValue
// ============================================================================

/// A single gate's stored value, tagged by [`GateKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GateValue {
    /// The boolean gate's on/off switch.
    Boolean(bool),
    /// The actor gate's set of enabled actor ids.
    Actors(BTreeSet<String>),
    /// The group gate's set of enabled group names.
    Groups(BTreeSet<String>),
    /// The percentage-of-actors gate's threshold.
    PercentageOfActors(PercentageOfActors),
    /// The percentage-of-time gate's threshold.
    PercentageOfTime(PercentageOfTime),
    /// The expression gate's rule tree.
    Expression(Box<Expression>),
}

impl GateValue {
    /// Returns the [`GateKind`] this value belongs to.
    #[must_use]
    pub fn kind(&self) -> GateKind {
        match self {
            Self::Boolean(_) => GateKind::Boolean,
            Self::Actors(_) => GateKind::Actor,
            Self::Groups(_) => GateKind::Group,
            Self::PercentageOfActors(_) => GateKind::PercentageOfActors,
            Self::PercentageOfTime(_) => GateKind::PercentageOfTime,
            Self::Expression(_) => GateKind::Expression,
        }
    }
}

// ============================================================================
// SECTION: GateValues
// ============================================================================

/// The full set of a feature's per-gate storage, one optional slot per
/// [`GateKind`].
///
/// # Invariants
/// - Each slot's presence is independent; a feature can have an actor set and
///   an expression populated simultaneously. [`crate::feature::Feature`]
///   resolves short-circuit OR across whichever slots are non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateValues {
    /// Slot for [`GateKind::Boolean`].
    pub boolean: Option<bool>,
    /// Slot for [`GateKind::Actor`].
    #[serde(default)]
    pub actors: BTreeSet<String>,
    /// Slot for [`GateKind::Group`].
    #[serde(default)]
    pub groups: BTreeSet<String>,
    /// Slot for [`GateKind::PercentageOfActors`].
    pub percentage_of_actors: Option<PercentageOfActors>,
    /// Slot for [`GateKind::PercentageOfTime`].
    pub percentage_of_time: Option<PercentageOfTime>,
    /// Slot for [`GateKind::Expression`].
    pub expression: Option<Expression>,
}

impl GateValues {
    /// Returns a value with every slot empty.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns `true` when no gate has any value set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boolean.is_none()
            && self.actors.is_empty()
            && self.groups.is_empty()
            && self.percentage_of_actors.is_none()
            && self.percentage_of_time.is_none()
            && self.expression.is_none()
    }

    /// Applies a single gate value to its corresponding slot, replacing
    /// whatever was there (actor/group slots are unioned in by `enable`;
    /// this setter always overwrites).
    pub fn set(&mut self, value: GateValue) {
        match value {
            GateValue::Boolean(b) => self.boolean = Some(b),
            GateValue::Actors(ids) => self.actors = ids,
            GateValue::Groups(names) => self.groups = names,
            GateValue::PercentageOfActors(p) => self.percentage_of_actors = Some(p),
            GateValue::PercentageOfTime(p) => self.percentage_of_time = Some(p),
            GateValue::Expression(expr) => self.expression = Some(*expr),
        }
    }

    /// Applies a gate value, unioning into the actor/group sets instead of
    /// replacing them. Used by `Adapter::enable` so that enabling one more
    /// actor id doesn't clobber the ones already enabled.
    pub fn merge(&mut self, value: GateValue) {
        match value {
            GateValue::Actors(ids) => self.actors.extend(ids),
            GateValue::Groups(names) => self.groups.extend(names),
            other => self.set(other),
        }
    }

    /// Clears a single gate's slot.
    pub fn clear(&mut self, kind: GateKind) {
        match kind {
            GateKind::Boolean => self.boolean = None,
            GateKind::Actor => self.actors.clear(),
            GateKind::Group => self.groups.clear(),
            GateKind::PercentageOfActors => self.percentage_of_actors = None,
            GateKind::PercentageOfTime => self.percentage_of_time = None,
            GateKind::Expression => self.expression = None,
        }
    }

    /// Clears every slot.
    pub fn clear_all(&mut self) {
        *self = Self::empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_has_no_values() {
        assert!(GateValues::empty().is_empty());
    }

    #[test]
    fn set_boolean_overwrites() {
        let mut values = GateValues::empty();
        values.set(GateValue::Boolean(true));
        values.set(GateValue::Boolean(false));
        assert_eq!(values.boolean, Some(false));
    }

    #[test]
    fn independent_slots_coexist() {
        let mut values = GateValues::empty();
        values.set(GateValue::Actors(BTreeSet::from(["1".to_owned()])));
        values.set(GateValue::Expression(Box::new(crate::expression::Expression::Value(
            crate::expression::Scalar::Boolean(true),
        ))));
        assert!(!values.actors.is_empty());
        assert!(values.expression.is_some());
        assert!(!values.is_empty());
    }

    #[test]
    fn clear_targets_only_named_kind() {
        let mut values = GateValues::empty();
        values.set(GateValue::Boolean(true));
        values.set(GateValue::Actors(BTreeSet::from(["1".to_owned()])));
        values.clear(GateKind::Boolean);
        assert_eq!(values.boolean, None);
        assert!(!values.actors.is_empty());
    }

    #[test]
    fn clear_all_resets_every_slot() {
        let mut values = GateValues::empty();
        values.set(GateValue::Boolean(true));
        values.set(GateValue::Groups(BTreeSet::from(["staff".to_owned()])));
        values.clear_all();
        assert!(values.is_empty());
    }
}
