// crates/gateflag-telemetry/src/channel.rs
// ============================================================================
// Module: Gateflag Channel Instrumenter
// Description: Channel-based instrumenter for out-of-process event delivery.
// Purpose: Forward OperationEvents to a consumer running on another thread
//          (or bridged out of the process entirely) without the core
//          depending on any particular async runtime.
// Dependencies: gateflag_core::{Instrumenter, OperationEvent}, std::sync::mpsc
// ============================================================================

//! ## Overview
//! [`ChannelInstrumenter`] forwards every event into a bounded
//! `std::sync::mpsc::SyncSender`. A full or disconnected channel drops the
//! event rather than blocking or panicking; dropped events are counted and
//! can be polled via [`ChannelInstrumenter::dropped_events`].

use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::mpsc::SyncSender;
use std::sync::mpsc::TrySendError;

use gateflag_core::Instrumenter;
use gateflag_core::OperationEvent;

/// Forwards events over a bounded channel for out-of-process consumption.
pub struct ChannelInstrumenter {
    sender: SyncSender<OperationEvent>,
    dropped: AtomicU64,
}

impl ChannelInstrumenter {
    /// Creates an instrumenter that forwards events to `sender`.
    #[must_use]
    pub const fn new(sender: SyncSender<OperationEvent>) -> Self {
        Self { sender, dropped: AtomicU64::new(0) }
    }

    /// Returns how many events have been dropped so far, either because the
    /// channel was full or because the receiving end was disconnected.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for ChannelInstrumenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelInstrumenter")
            .field("dropped", &self.dropped.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Instrumenter for ChannelInstrumenter {
    fn instrument(&self, event: OperationEvent) {
        if let Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) = self.sender.try_send(event) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}
