// crates/gateflag-core/src/feature.rs
// ============================================================================
// Module: Gateflag Feature
// Description: The orchestrator: ties a name, an adapter, an instrumenter,
//              and the fixed gate chain together into `enabled?`-style
//              evaluation and the handful of mutating operations.
// Purpose: Be the one type application code touches; everything else in the
//          crate exists to make this type's behavior well-defined.
// Dependencies: crate::{adapter::{Adapter, AdapterError}, actor::ActorLike,
//               expression::Expression, gate, gate_values::GateValue,
//               instrumentation::{Instrumenter, Operation, OperationEvent},
//               registry::GroupRegistry, values::{PercentageOfActors,
//               PercentageOfTime}}
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::actor::ActorLike;
use crate::adapter::Adapter;
use crate::adapter::AdapterError;
use crate::expression::Expression;
use crate::gate;
use crate::gate::GateContext;
use crate::gate::GateError;
use crate::gate::GateKind;
use crate::gate_values::GateValue;
use crate::instrumentation::Instrumenter;
use crate::instrumentation::Operation;
use crate::instrumentation::OperationEvent;
use crate::registry::GroupRegistry;
use crate::registry::RegistryError;
use crate::values::PercentageOfActors;
use crate::values::PercentageOfTime;

// ============================================================================
// SECTION: FeatureState
// ============================================================================

/// A coarse classification of a feature's gate values, useful for admin
/// listings that want an at-a-glance status without walking every gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureState {
    /// The boolean gate is set, so the feature is open for every actor.
    FullyEnabled,
    /// No gate has any value set.
    Disabled,
    /// At least one non-boolean gate has a value set.
    Conditional,
}

impl fmt::Display for FeatureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FullyEnabled => "fully_enabled",
            Self::Disabled => "disabled",
            Self::Conditional => "conditional",
        };
        f.write_str(name)
    }
}

// ============================================================================
// SECTION: EnableInput
// ============================================================================

/// The value supplied to [`Feature::enable`], one variant per gate kind.
#[derive(Debug, Clone, PartialEq)]
pub enum EnableInput {
    /// Opens the boolean gate for everyone.
    Everyone,
    /// Adds one actor id to the actor gate's set.
    Actor(String),
    /// Adds several actor ids to the actor gate's set.
    Actors(BTreeSet<String>),
    /// Adds one group name to the group gate's set.
    Group(String),
    /// Replaces the percentage-of-actors gate's threshold.
    PercentageOfActors(PercentageOfActors),
    /// Replaces the percentage-of-time gate's threshold.
    PercentageOfTime(PercentageOfTime),
    /// Replaces the expression gate's rule tree.
    Expression(Expression),
}

impl EnableInput {
    /// Returns the [`GateKind`] this input targets, without mutating
    /// anything. Lets admin tooling show which gate a value would route to
    /// before committing the change.
    #[must_use]
    pub fn gate_kind(&self) -> GateKind {
        match self {
            Self::Everyone => GateKind::Boolean,
            Self::Actor(_) | Self::Actors(_) => GateKind::Actor,
            Self::Group(_) => GateKind::Group,
            Self::PercentageOfActors(_) => GateKind::PercentageOfActors,
            Self::PercentageOfTime(_) => GateKind::PercentageOfTime,
            Self::Expression(_) => GateKind::Expression,
        }
    }

    /// Converts into the [`GateValue`] an [`Adapter`] stores.
    fn into_gate_value(self) -> GateValue {
        match self {
            Self::Everyone => GateValue::Boolean(true),
            Self::Actor(id) => GateValue::Actors(BTreeSet::from([id])),
            Self::Actors(ids) => GateValue::Actors(ids),
            Self::Group(name) => GateValue::Groups(BTreeSet::from([name])),
            Self::PercentageOfActors(p) => GateValue::PercentageOfActors(p),
            Self::PercentageOfTime(p) => GateValue::PercentageOfTime(p),
            Self::Expression(expr) => GateValue::Expression(Box::new(expr)),
        }
    }
}

// ============================================================================
// SECTION: Feature
// ============================================================================

/// A named feature bound to a storage adapter and an instrumentation sink.
///
/// `Feature` is cheap to construct and holds no state of its own beyond its
/// name; all gate values live in the adapter, so two `Feature` handles
/// constructed with the same name and adapter always see the same data.
#[derive(Clone)]
pub struct Feature {
    name: String,
    adapter: Arc<dyn Adapter>,
    instrumenter: Arc<dyn Instrumenter>,
}

impl fmt::Debug for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feature").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Errors raised by [`Feature`] operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureError {
    /// The storage adapter failed.
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    /// A gate failed to evaluate. Reserved for future gates; no current gate
    /// produces this.
    #[error(transparent)]
    Gate(#[from] GateError),
    /// `enable` targeted a group name [`GroupRegistry`] doesn't know about.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl Feature {
    /// Binds a feature name to an adapter and instrumenter.
    #[must_use]
    pub fn new(name: impl Into<String>, adapter: Arc<dyn Adapter>, instrumenter: Arc<dyn Instrumenter>) -> Self {
        Self {
            name: name.into(),
            adapter,
            instrumenter,
        }
    }

    /// Returns the feature's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decides whether the feature is open for `actor` (or for nobody, when
    /// `actor` is `None`), consulting each gate in [`GateKind::ORDER`] and
    /// short-circuiting on the first open gate.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Adapter`] if the adapter fails. A gate whose
    /// value can't be evaluated (e.g. a malformed expression) reports closed
    /// rather than erroring.
    pub fn enabled(&self, actor: Option<&dyn ActorLike>) -> Result<bool, FeatureError> {
        let values = self.adapter.get(&self.name)?;
        let groups = GroupRegistry::global();
        let context = GateContext {
            feature_name: &self.name,
            actor,
            values: &values,
            groups,
        };

        let mut result = false;
        for candidate in gate::all_gates() {
            if candidate.is_open(&context)? {
                result = true;
                break;
            }
        }

        let mut event = OperationEvent::new(Operation::Enabled, self.name.clone()).with_result(result);
        if let Some(actor) = actor {
            event = event.with_actor_id(actor.flipper_id());
        }
        self.instrumenter.instrument(event);

        Ok(result)
    }

    /// Returns a coarse classification of the feature's current gate values.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError`] if the adapter fails.
    pub fn state(&self) -> Result<FeatureState, FeatureError> {
        let values = self.adapter.get(&self.name)?;
        if values.boolean == Some(true) || values.percentage_of_time.is_some_and(|p| p.get() >= 100.0) {
            Ok(FeatureState::FullyEnabled)
        } else if values.is_empty() {
            Ok(FeatureState::Disabled)
        } else {
            Ok(FeatureState::Conditional)
        }
    }

    /// Registers the feature with the adapter, if not already registered.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError`] if the adapter fails.
    pub fn add(&self) -> Result<(), FeatureError> {
        self.adapter.add(&self.name)?;
        self.instrumenter
            .instrument(OperationEvent::new(Operation::Add, self.name.clone()));
        Ok(())
    }

    /// Deregisters the feature and all of its gate values.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError`] if the adapter fails.
    pub fn remove(&self) -> Result<(), FeatureError> {
        self.adapter.remove(&self.name)?;
        self.instrumenter
            .instrument(OperationEvent::new(Operation::Remove, self.name.clone()));
        Ok(())
    }

    /// Resets every gate value to empty, without deregistering the feature.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError`] if the adapter fails.
    pub fn clear(&self) -> Result<(), FeatureError> {
        self.adapter.clear(&self.name)?;
        self.instrumenter
            .instrument(OperationEvent::new(Operation::Clear, self.name.clone()));
        Ok(())
    }

    /// Merges an [`EnableInput`] into the feature's corresponding gate.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Registry`] when `input` is
    /// [`EnableInput::Group`] naming a group [`GroupRegistry`] doesn't know
    /// about, or [`FeatureError::Adapter`] if the adapter fails.
    pub fn enable(&self, input: EnableInput) -> Result<(), FeatureError> {
        if let EnableInput::Group(name) = &input {
            if !GroupRegistry::global().contains(name) {
                return Err(FeatureError::Registry(RegistryError::UnknownGroup(name.clone())));
            }
        }
        let gate = input.gate_kind();
        self.adapter.enable(&self.name, input.into_gate_value())?;
        self.instrumenter
            .instrument(OperationEvent::new(Operation::GateEnabled, self.name.clone()).with_gate(gate));
        Ok(())
    }

    /// Removes part or all of a gate's value; see
    /// [`Adapter::disable`] for `member`'s meaning.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError`] if the adapter fails.
    pub fn disable(&self, kind: GateKind, member: Option<&str>) -> Result<(), FeatureError> {
        self.adapter.disable(&self.name, kind, member)?;
        self.instrumenter
            .instrument(OperationEvent::new(Operation::GateDisabled, self.name.clone()).with_gate(kind));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Actor;
    use crate::adapter::MemoryAdapter;
    use crate::instrumentation::CapturingInstrumenter;

    fn feature(name: &str) -> (Feature, Arc<CapturingInstrumenter>) {
        let adapter = Arc::new(MemoryAdapter::new());
        let instrumenter = Arc::new(CapturingInstrumenter::new());
        (Feature::new(name, adapter, instrumenter.clone()), instrumenter)
    }

    #[test]
    fn disabled_feature_is_closed_for_everyone() {
        let (feature, _) = feature("search_v2");
        assert_eq!(feature.enabled(None), Ok(false));
    }

    #[test]
    fn boolean_enable_opens_for_every_actor() {
        let (feature, _) = feature("search_v2");
        feature.enable(EnableInput::Everyone).expect("enable");
        let actor = Actor::try_new("1").expect("id");
        assert_eq!(feature.enabled(Some(&actor)), Ok(true));
        assert_eq!(feature.enabled(None), Ok(true));
    }

    #[test]
    fn actor_enable_opens_only_for_listed_actor() {
        let (feature, _) = feature("search_v2");
        feature.enable(EnableInput::Actor("1".to_owned())).expect("enable");
        let listed = Actor::try_new("1").expect("id");
        let other = Actor::try_new("2").expect("id");
        assert_eq!(feature.enabled(Some(&listed)), Ok(true));
        assert_eq!(feature.enabled(Some(&other)), Ok(false));
    }

    #[test]
    fn disable_actor_closes_gate_for_that_actor_only() {
        let (feature, _) = feature("search_v2");
        feature.enable(EnableInput::Actors(BTreeSet::from(["1".to_owned(), "2".to_owned()]))).expect("enable");
        feature.disable(GateKind::Actor, Some("1")).expect("disable");
        let removed = Actor::try_new("1").expect("id");
        let remaining = Actor::try_new("2").expect("id");
        assert_eq!(feature.enabled(Some(&removed)), Ok(false));
        assert_eq!(feature.enabled(Some(&remaining)), Ok(true));
    }

    #[test]
    fn state_classifies_fully_enabled_disabled_and_conditional() {
        let (feature, _) = feature("search_v2");
        assert_eq!(feature.state(), Ok(FeatureState::Disabled));
        feature.enable(EnableInput::Actor("1".to_owned())).expect("enable");
        assert_eq!(feature.state(), Ok(FeatureState::Conditional));
        feature.enable(EnableInput::Everyone).expect("enable");
        assert_eq!(feature.state(), Ok(FeatureState::FullyEnabled));
    }

    #[test]
    fn state_classifies_full_percentage_of_time_as_fully_enabled() {
        let (feature, _) = feature("search_v2");
        feature
            .enable(EnableInput::PercentageOfTime(PercentageOfTime::try_new(100.0).expect("valid")))
            .expect("enable");
        assert_eq!(feature.state(), Ok(FeatureState::FullyEnabled));
    }

    #[test]
    fn expression_gate_error_does_not_abort_other_gates() {
        let (feature, _) = feature("search_v2");
        feature.enable(EnableInput::Everyone).expect("enable");
        feature
            .enable(EnableInput::Expression(Expression::Property("missing".to_owned())))
            .expect("enable");
        let actor = Actor::try_new("1").expect("id");
        assert_eq!(feature.enabled(Some(&actor)), Ok(true));
    }

    #[test]
    fn expression_gate_error_closes_feature_with_no_other_gate_open() {
        let (feature, _) = feature("search_v2");
        feature
            .enable(EnableInput::Expression(Expression::Property("missing".to_owned())))
            .expect("enable");
        let actor = Actor::try_new("1").expect("id");
        assert_eq!(feature.enabled(Some(&actor)), Ok(false));
    }

    #[test]
    fn enable_group_rejects_unregistered_name() {
        let (feature, _) = feature("search_v2");
        let result = feature.enable(EnableInput::Group("gateflag_test_unregistered_group".to_owned()));
        assert_eq!(
            result,
            Err(FeatureError::Registry(RegistryError::UnknownGroup(
                "gateflag_test_unregistered_group".to_owned()
            )))
        );
    }

    #[test]
    fn enable_group_succeeds_for_registered_name() {
        let (feature, _) = feature("search_v2");
        GroupRegistry::global().register("gateflag_test_registered_group", |_| true);
        feature
            .enable(EnableInput::Group("gateflag_test_registered_group".to_owned()))
            .expect("enable");
        assert_eq!(feature.state(), Ok(FeatureState::Conditional));
    }

    #[test]
    fn enabled_evaluation_is_instrumented() {
        let (feature, instrumenter) = feature("search_v2");
        feature.enabled(None).expect("enabled");
        let events = instrumenter.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].operation, Operation::Enabled);
        assert_eq!(events[0].result, Some(false));
    }

    #[test]
    fn gate_kind_resolves_without_mutating() {
        let (feature, _) = feature("search_v2");
        assert_eq!(EnableInput::Group("staff".to_owned()).gate_kind(), GateKind::Group);
        assert_eq!(feature.state(), Ok(FeatureState::Disabled));
    }

    #[test]
    fn remove_then_add_starts_clean() {
        let (feature, _) = feature("search_v2");
        feature.enable(EnableInput::Everyone).expect("enable");
        feature.remove().expect("remove");
        feature.add().expect("add");
        assert_eq!(feature.state(), Ok(FeatureState::Disabled));
    }
}
