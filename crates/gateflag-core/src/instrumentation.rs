// crates/gateflag-core/src/instrumentation.rs
// ============================================================================
// Module: Gateflag Instrumentation
// Description: The fire-and-forget event sink `Feature` reports every
//              operation through, plus a no-op default and an in-order
//              capturing test double.
// Purpose: Give applications a structured-logging seam without the core
//          depending on any particular logging or metrics crate.
// Dependencies: crate::gate::GateKind
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::SystemTime;

use crate::gate::GateKind;

/// The event name every [`OperationEvent`] is reported under, matching the
/// upstream Flipper convention of naming instrumentation events after the
/// library.
pub const EVENT_NAME: &str = "feature_operation.flipper";

// ============================================================================
// SECTION: Operation
// ============================================================================

/// What kind of operation an [`OperationEvent`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `Feature::enabled` was evaluated.
    Enabled,
    /// A gate value was merged in via `Adapter::enable`.
    GateEnabled,
    /// A gate value was removed via `Adapter::disable`.
    GateDisabled,
    /// A feature was registered via `Adapter::add`.
    Add,
    /// A feature was deregistered via `Adapter::remove`.
    Remove,
    /// A feature's gate values were reset via `Adapter::clear`.
    Clear,
}

// ============================================================================
// SECTION: OperationEvent
// ============================================================================

/// A single instrumented operation, fired after the operation completes.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationEvent {
    /// Which operation occurred.
    pub operation: Operation,
    /// The feature the operation concerned.
    pub feature_name: String,
    /// The gate involved, if the operation was gate-scoped.
    pub gate: Option<GateKind>,
    /// The actor id involved, if any.
    pub actor_id: Option<String>,
    /// The operation's boolean result, if it has one (e.g. the outcome of an
    /// `Enabled` evaluation).
    pub result: Option<bool>,
    /// Wall-clock time the event was reported.
    pub at: SystemTime,
}

impl OperationEvent {
    /// Builds an event for the current instant.
    #[must_use]
    pub fn new(operation: Operation, feature_name: impl Into<String>) -> Self {
        Self {
            operation,
            feature_name: feature_name.into(),
            gate: None,
            actor_id: None,
            result: None,
            at: SystemTime::now(),
        }
    }

    /// Attaches the gate this event concerns.
    #[must_use]
    pub fn with_gate(mut self, gate: GateKind) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Attaches the actor id this event concerns.
    #[must_use]
    pub fn with_actor_id(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    /// Attaches the event's boolean result.
    #[must_use]
    pub fn with_result(mut self, result: bool) -> Self {
        self.result = Some(result);
        self
    }
}

// ============================================================================
// SECTION: Instrumenter
// ============================================================================

/// A fire-and-forget sink for [`OperationEvent`]s.
///
/// Implementations must not block the caller meaningfully or propagate
/// errors; a failing instrumenter should swallow its own failures rather than
/// affect feature evaluation.
pub trait Instrumenter: fmt::Debug + Send + Sync {
    /// Reports one event.
    fn instrument(&self, event: OperationEvent);
}

/// Discards every event. The default instrumenter.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInstrumenter;

impl Instrumenter for NoopInstrumenter {
    fn instrument(&self, _event: OperationEvent) {}
}

/// Captures every event, in the order reported. A test double, not meant for
/// production use (the captured list grows without bound).
#[derive(Debug, Clone, Default)]
pub struct CapturingInstrumenter {
    events: Arc<Mutex<Vec<OperationEvent>>>,
}

impl CapturingInstrumenter {
    /// Creates an instrumenter with no captured events.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every event captured so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<OperationEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Instrumenter for CapturingInstrumenter {
    fn instrument(&self, event: OperationEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event);
    }
}
