// crates/gateflag-core/src/lib.rs
// ============================================================================
// Module: Gateflag Core Library
// Description: Public API surface for the Gateflag feature-flag engine.
// Purpose: Expose actors, gates, expressions, the feature orchestrator, and
//          the adapter/instrumenter contracts.
// Dependencies: crate::{actor, values, expression, gate, feature, adapter,
//               instrumentation, registry}
// ============================================================================

//! ## Overview
//! Gateflag decides whether a named feature is enabled for an actor by
//! consulting a fixed-order list of gates, each of which reads its own slice
//! of the feature's stored value. Storage and telemetry are seams: the core
//! depends only on the [`Adapter`] and [`Instrumenter`] contracts, never on a
//! concrete backend.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod actor;
pub mod adapter;
pub mod expression;
pub mod feature;
pub mod gate;
pub mod gate_values;
pub mod hashing;
pub mod instrumentation;
pub mod registry;
pub mod values;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use actor::Actor;
pub use actor::ActorLike;
pub use adapter::Adapter;
pub use adapter::AdapterError;
pub use adapter::CascadingAdapter;
pub use adapter::MemoryAdapter;
pub use expression::Expression;
pub use expression::Scalar;
pub use feature::EnableInput;
pub use feature::Feature;
pub use feature::FeatureError;
pub use feature::FeatureState;
pub use gate::ActorGate;
pub use gate::BooleanGate;
pub use gate::ExpressionGate;
pub use gate::Gate;
pub use gate::GateKind;
pub use gate::GroupGate;
pub use gate::PercentageOfActorsGate;
pub use gate::PercentageOfTimeGate;
pub use gate_values::GateValue;
pub use gate_values::GateValues;
pub use instrumentation::CapturingInstrumenter;
pub use instrumentation::EVENT_NAME;
pub use instrumentation::Instrumenter;
pub use instrumentation::NoopInstrumenter;
pub use instrumentation::Operation;
pub use instrumentation::OperationEvent;
pub use registry::Group;
pub use registry::GroupRegistry;
pub use values::PercentageOfActors;
pub use values::PercentageOfTime;
pub use values::Type;
