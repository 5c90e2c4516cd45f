// crates/gateflag-core/src/gate.rs
// ============================================================================
// Module: Gateflag Gates
// Description: The six gate kinds consulted, in fixed order, to decide
//              whether a feature is open for an actor.
// Purpose: Isolate each condition (flat on/off, named actor, named group,
//          percentage of actors, percentage of time, rule expression) behind
//          one trait so `Feature::enabled` can short-circuit across them
//          uniformly.
// Dependencies: crate::{actor::ActorLike, gate_values::GateValues,
//               registry::GroupRegistry, hashing, expression::ExpressionError}
// ============================================================================

use std::fmt;

use rand::Rng;
use serde::Deserialize;
use serde::Serialize;

use crate::actor::ActorLike;
use crate::expression::ExpressionError;
use crate::gate_values::GateValues;
use crate::hashing;
use crate::registry::GroupRegistry;

// ============================================================================
// SECTION: GateKind
// ============================================================================

/// Discriminant identifying one of the six gate kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    /// The flat on/off switch; open for everyone when set.
    Boolean,
    /// Open for actors whose id is in an explicit set.
    Actor,
    /// Open for actors matching a registered group predicate.
    Group,
    /// Open for a deterministic percentage of actor ids.
    PercentageOfActors,
    /// Open for a random percentage of evaluations.
    PercentageOfTime,
    /// Open when a rule expression evaluates to `true`.
    Expression,
}

impl GateKind {
    /// The fixed evaluation order `Feature::enabled` consults: the flat
    /// switch first (so a fully-enabled feature never pays for the other
    /// gates), then group, actor, and finally the two probabilistic gates.
    pub const ORDER: [Self; 6] = [
        Self::Boolean,
        Self::Group,
        Self::Actor,
        Self::PercentageOfActors,
        Self::PercentageOfTime,
        Self::Expression,
    ];
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "boolean",
            Self::Actor => "actor",
            Self::Group => "group",
            Self::PercentageOfActors => "percentage_of_actors",
            Self::PercentageOfTime => "percentage_of_time",
            Self::Expression => "expression",
        };
        f.write_str(name)
    }
}

// ============================================================================
// SECTION: GateContext
// ============================================================================

/// Everything a gate needs to decide whether it is open.
pub struct GateContext<'a> {
    /// Name of the feature being evaluated, fed to the percentage-of-actors
    /// hash so the same actor scores differently per feature.
    pub feature_name: &'a str,
    /// The actor under evaluation, if any. Gates that require an actor are
    /// closed when this is `None`.
    pub actor: Option<&'a dyn ActorLike>,
    /// The feature's stored gate values.
    pub values: &'a GateValues,
    /// The group registry the group gate consults.
    pub groups: &'a GroupRegistry,
}

/// Errors raised evaluating a gate.
///
/// No gate currently returns one: the expression gate absorbs evaluation
/// failures as closed (see [`ExpressionGate::is_open`]) rather than
/// propagating them, so one malformed gate can never abort evaluation of the
/// others for the same feature. The error channel stays part of the trait
/// for a future gate that needs to fail loudly.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GateError {
    /// An expression failed to evaluate. Reserved; not currently produced.
    #[error(transparent)]
    Expression(#[from] ExpressionError),
}

/// A single condition contributing to `Feature::enabled`.
pub trait Gate: fmt::Debug + Send + Sync {
    /// Returns this gate's [`GateKind`].
    fn kind(&self) -> GateKind;

    /// Decides whether this gate is open for the given context.
    ///
    /// # Errors
    ///
    /// Returns [`GateError`] if a gate cannot be evaluated at all; a gate
    /// whose *value* is malformed (e.g. an expression gate that can't
    /// evaluate against the actor's properties) reports closed instead.
    fn is_open(&self, context: &GateContext<'_>) -> Result<bool, GateError>;
}

// ============================================================================
// SECTION: Gate implementations
// ============================================================================

/// The flat on/off gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanGate;

impl Gate for BooleanGate {
    fn kind(&self) -> GateKind {
        GateKind::Boolean
    }

    fn is_open(&self, context: &GateContext<'_>) -> Result<bool, GateError> {
        Ok(context.values.boolean.unwrap_or(false))
    }
}

/// Open for actors whose id appears in the feature's actor set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActorGate;

impl Gate for ActorGate {
    fn kind(&self) -> GateKind {
        GateKind::Actor
    }

    fn is_open(&self, context: &GateContext<'_>) -> Result<bool, GateError> {
        let Some(actor) = context.actor else {
            return Ok(false);
        };
        Ok(context.values.actors.contains(&actor.flipper_id()))
    }
}

/// Open for actors matching any of the feature's registered group names.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupGate;

impl Gate for GroupGate {
    fn kind(&self) -> GateKind {
        GateKind::Group
    }

    fn is_open(&self, context: &GateContext<'_>) -> Result<bool, GateError> {
        let Some(actor) = context.actor else {
            return Ok(false);
        };
        for name in &context.values.groups {
            if let Some(group) = context.groups.get(name) {
                if group.matches(actor) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

/// Open for a deterministic percentage of actor ids, hashed per feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct PercentageOfActorsGate;

impl Gate for PercentageOfActorsGate {
    fn kind(&self) -> GateKind {
        GateKind::PercentageOfActors
    }

    fn is_open(&self, context: &GateContext<'_>) -> Result<bool, GateError> {
        let (Some(actor), Some(threshold)) = (context.actor, context.values.percentage_of_actors) else {
            return Ok(false);
        };
        Ok(hashing::within_percentage(
            context.feature_name,
            &actor.flipper_id(),
            f64::from(threshold.get()),
        ))
    }
}

/// Open for a random percentage of evaluations, independent of actor.
#[derive(Debug, Clone, Copy, Default)]
pub struct PercentageOfTimeGate;

impl Gate for PercentageOfTimeGate {
    fn kind(&self) -> GateKind {
        GateKind::PercentageOfTime
    }

    fn is_open(&self, context: &GateContext<'_>) -> Result<bool, GateError> {
        let Some(threshold) = context.values.percentage_of_time else {
            return Ok(false);
        };
        let roll = rand::thread_rng().gen_range(0.0..100.0);
        Ok(roll < threshold.get())
    }
}

/// Open when the feature's rule expression evaluates to `true` against the
/// actor's properties.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionGate;

impl Gate for ExpressionGate {
    fn kind(&self) -> GateKind {
        GateKind::Expression
    }

    fn is_open(&self, context: &GateContext<'_>) -> Result<bool, GateError> {
        let (Some(actor), Some(expression)) = (context.actor, context.values.expression.as_ref()) else {
            return Ok(false);
        };
        let properties = actor.flipper_properties();
        // A malformed or unevaluable expression closes this gate only; it
        // must never abort evaluation of the other gates for this feature.
        Ok(expression.evaluate(&properties).unwrap_or(false))
    }
}

/// Returns one instance of every gate kind, in [`GateKind::ORDER`].
#[must_use]
pub fn all_gates() -> [Box<dyn Gate>; 6] {
    [
        Box::new(BooleanGate),
        Box::new(GroupGate),
        Box::new(ActorGate),
        Box::new(PercentageOfActorsGate),
        Box::new(PercentageOfTimeGate),
        Box::new(ExpressionGate),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Actor;
    use crate::expression::Expression;
    use crate::expression::Scalar;
    use crate::gate_values::GateValue;

    fn context<'a>(actor: Option<&'a Actor>, values: &'a GateValues, groups: &'a GroupRegistry) -> GateContext<'a> {
        GateContext {
            feature_name: "search_v2",
            actor: actor.map(|a| a as &dyn ActorLike),
            values,
            groups,
        }
    }

    #[test]
    fn boolean_gate_defaults_closed() {
        let values = GateValues::empty();
        let groups = GroupRegistry::new();
        assert_eq!(BooleanGate.is_open(&context(None, &values, &groups)), Ok(false));
    }

    #[test]
    fn boolean_gate_open_when_set_true() {
        let mut values = GateValues::empty();
        values.set(GateValue::Boolean(true));
        let groups = GroupRegistry::new();
        assert_eq!(BooleanGate.is_open(&context(None, &values, &groups)), Ok(true));
    }

    #[test]
    fn actor_gate_requires_actor() {
        let mut values = GateValues::empty();
        values.set(GateValue::Actors(std::collections::BTreeSet::from(["1".to_owned()])));
        let groups = GroupRegistry::new();
        assert_eq!(ActorGate.is_open(&context(None, &values, &groups)), Ok(false));
    }

    #[test]
    fn actor_gate_open_for_listed_id() {
        let mut values = GateValues::empty();
        values.set(GateValue::Actors(std::collections::BTreeSet::from(["1".to_owned()])));
        let groups = GroupRegistry::new();
        let actor = Actor::try_new("1").expect("id");
        assert_eq!(ActorGate.is_open(&context(Some(&actor), &values, &groups)), Ok(true));
    }

    #[test]
    fn group_gate_consults_registry() {
        let mut values = GateValues::empty();
        values.set(GateValue::Groups(std::collections::BTreeSet::from(["staff".to_owned()])));
        let groups = GroupRegistry::new();
        groups.register("staff", |actor| actor.flipper_id() == "1");
        let actor = Actor::try_new("1").expect("id");
        assert_eq!(GroupGate.is_open(&context(Some(&actor), &values, &groups)), Ok(true));
    }

    #[test]
    fn group_gate_skips_unregistered_group_names() {
        let mut values = GateValues::empty();
        values.set(GateValue::Groups(std::collections::BTreeSet::from(["ghost".to_owned()])));
        let groups = GroupRegistry::new();
        let actor = Actor::try_new("1").expect("id");
        assert_eq!(GroupGate.is_open(&context(Some(&actor), &values, &groups)), Ok(false));
    }

    #[test]
    fn expression_gate_requires_actor() {
        let mut values = GateValues::empty();
        values.set(GateValue::Expression(Box::new(Expression::Value(Scalar::Boolean(true)))));
        let groups = GroupRegistry::new();
        assert_eq!(ExpressionGate.is_open(&context(None, &values, &groups)), Ok(false));
    }

    #[test]
    fn expression_gate_evaluates_against_actor_properties() {
        let mut values = GateValues::empty();
        values.set(GateValue::Expression(Box::new(Expression::Equal(
            Box::new(Expression::Property("plan".to_owned())),
            Box::new(Expression::Value(Scalar::from("pro"))),
        ))));
        let groups = GroupRegistry::new();
        let actor = Actor::try_new("1").expect("id").with_property("plan", "pro");
        assert_eq!(ExpressionGate.is_open(&context(Some(&actor), &values, &groups)), Ok(true));
    }

    #[test]
    fn expression_gate_reports_closed_on_evaluation_error() {
        let mut values = GateValues::empty();
        values.set(GateValue::Expression(Box::new(Expression::Property("missing".to_owned()))));
        let groups = GroupRegistry::new();
        let actor = Actor::try_new("1").expect("id");
        assert_eq!(ExpressionGate.is_open(&context(Some(&actor), &values, &groups)), Ok(false));
    }

    #[test]
    fn percentage_of_actors_gate_zero_threshold_closed() {
        let mut values = GateValues::empty();
        values.set(GateValue::PercentageOfActors(
            crate::values::PercentageOfActors::try_new(0).expect("valid"),
        ));
        let groups = GroupRegistry::new();
        let actor = Actor::try_new("1").expect("id");
        assert_eq!(
            PercentageOfActorsGate.is_open(&context(Some(&actor), &values, &groups)),
            Ok(false)
        );
    }

    #[test]
    fn all_gates_returns_one_of_each_kind_in_order() {
        let gates = all_gates();
        let kinds: Vec<GateKind> = gates.iter().map(|g| g.kind()).collect();
        assert_eq!(kinds, GateKind::ORDER.to_vec());
    }
}
