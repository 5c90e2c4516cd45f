// crates/gateflag-telemetry/src/log.rs
// ============================================================================
// Module: Gateflag Log Instrumenter
// Description: Log-only instrumenter for audit-grade event records.
// Purpose: Persist one JSON record per OperationEvent without depending on a
//          particular logging framework.
// Dependencies: gateflag_core::{Instrumenter, OperationEvent}, serde_json, std
// ============================================================================

//! ## Overview
//! `LogInstrumenter` writes a JSON object per line for each reported event.
//! It never propagates a write failure to the caller: `Instrumenter::instrument`
//! has no error channel, so failures are counted instead and can be polled via
//! [`LogInstrumenter::failed_writes`].

use std::io::Write;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::UNIX_EPOCH;

use gateflag_core::Instrumenter;
use gateflag_core::OperationEvent;
use serde_json::json;

fn operation_name(operation: gateflag_core::Operation) -> &'static str {
    use gateflag_core::Operation;
    match operation {
        Operation::Enabled => "enabled",
        Operation::GateEnabled => "gate_enabled",
        Operation::GateDisabled => "gate_disabled",
        Operation::Add => "add",
        Operation::Remove => "remove",
        Operation::Clear => "clear",
    }
}

/// Log-only [`Instrumenter`]. Writes never dispatch anywhere; they just
/// persist a record of what happened.
#[derive(Debug)]
pub struct LogInstrumenter<W: Write + Send> {
    /// Output writer for event records.
    writer: Mutex<W>,
    /// Count of writes that failed and were swallowed.
    failed_writes: AtomicU64,
}

impl<W: Write + Send> LogInstrumenter<W> {
    /// Creates a log instrumenter writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer: Mutex::new(writer), failed_writes: AtomicU64::new(0) }
    }

    /// Returns how many event writes have failed and been swallowed so far.
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }

    fn try_write(&self, event: &OperationEvent) -> std::io::Result<()> {
        let millis = event.at.duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or_default();
        let record = json!({
            "event": gateflag_core::EVENT_NAME,
            "operation": operation_name(event.operation),
            "feature_name": event.feature_name,
            "gate": event.gate.map(|g| g.to_string()),
            "actor_id": event.actor_id,
            "result": event.result,
            "at_millis": millis,
        });
        let mut guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        serde_json::to_writer(&mut *guard, &record)?;
        guard.write_all(b"\n")
    }
}

impl<W: Write + Send + std::fmt::Debug> Instrumenter for LogInstrumenter<W> {
    fn instrument(&self, event: OperationEvent) {
        if self.try_write(&event).is_err() {
            self.failed_writes.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex as StdMutex;

    use gateflag_core::Operation;

    use super::*;

    #[derive(Debug, Clone, Default)]
    struct SharedBuf(Arc<StdMutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap_or_else(PoisonError::into_inner).extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_one_json_line_per_event() {
        let buf = SharedBuf::default();
        let instrumenter = LogInstrumenter::new(buf.clone());
        instrumenter.instrument(OperationEvent::new(Operation::Add, "search_v2"));
        instrumenter.instrument(OperationEvent::new(Operation::Enabled, "search_v2").with_result(true));
        let contents = buf.0.lock().unwrap_or_else(PoisonError::into_inner).clone();
        let text = String::from_utf8(contents).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).expect("valid json");
        assert_eq!(first["operation"], "add");
        assert_eq!(first["feature_name"], "search_v2");
        let second: serde_json::Value = serde_json::from_str(lines[1]).expect("valid json");
        assert_eq!(second["result"], true);
    }

    #[test]
    fn no_failed_writes_on_success() {
        let instrumenter = LogInstrumenter::new(SharedBuf::default());
        instrumenter.instrument(OperationEvent::new(Operation::Clear, "x"));
        assert_eq!(instrumenter.failed_writes(), 0);
    }

    #[derive(Debug)]
    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("always fails"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn counts_failed_writes_without_panicking() {
        let instrumenter = LogInstrumenter::new(FailingWriter);
        instrumenter.instrument(OperationEvent::new(Operation::Remove, "x"));
        assert_eq!(instrumenter.failed_writes(), 1);
    }
}
