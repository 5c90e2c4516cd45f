// crates/gateflag-telemetry/src/lib.rs
// ============================================================================
// Module: Gateflag Telemetry
// Description: Public API surface for concrete Instrumenter implementations.
// Purpose: Give applications somewhere to route OperationEvents beyond the
//          core's no-op default and test-only capturing double.
// Dependencies: crate::{log, channel}
// ============================================================================

//! ## Overview
//! Two [`gateflag_core::Instrumenter`] implementations meant for real use: a
//! [`log::LogInstrumenter`] that writes one JSON record per event to any
//! `Write`, and a [`channel::ChannelInstrumenter`] that forwards events over a
//! bounded `mpsc` channel for out-of-process consumption. Neither propagates
//! delivery failures to the caller, per the `Instrumenter` contract; both
//! count failures instead so callers can monitor for a dead sink.

pub mod channel;
pub mod log;

pub use channel::ChannelInstrumenter;
pub use log::LogInstrumenter;
