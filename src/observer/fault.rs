//! Fault channel for observer errors
//!
//! A failing child observer must never break the instrumented application's
//! call, so the composite observer absorbs the error and hands it to a
//! pluggable [`FaultSink`] instead of propagating it.

use std::sync::Mutex;

use tracing::warn;

use super::{CallHandle, ObserverFault};

/// Destination for observer faults absorbed by the composite.
pub trait FaultSink: Send + Sync {
    /// Called once per absorbed fault. `child_index` is the position of the
    /// failing child in factory-registration order.
    fn child_failed(
        &self,
        child_index: usize,
        event: &'static str,
        call: &CallHandle,
        fault: ObserverFault,
    );
}

/// Default sink: reports faults as structured log warnings.
#[derive(Debug, Default)]
pub struct LogFaultSink;

impl FaultSink for LogFaultSink {
    fn child_failed(
        &self,
        child_index: usize,
        event: &'static str,
        call: &CallHandle,
        fault: ObserverFault,
    ) {
        warn!(
            child_index,
            event,
            call_id = %call.id(),
            error = %fault,
            "Telemetry observer failed while handling event; call unaffected"
        );
    }
}

/// A recorded fault, as captured by [`CollectingFaultSink`].
#[derive(Debug)]
pub struct RecordedFault {
    pub child_index: usize,
    pub event: &'static str,
    pub message: String,
}

/// Sink that records faults for later inspection. Useful in tests and for
/// applications that surface instrumentation health elsewhere.
#[derive(Debug, Default)]
pub struct CollectingFaultSink {
    faults: Mutex<Vec<RecordedFault>>,
}

impl CollectingFaultSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<RecordedFault> {
        std::mem::take(&mut *self.faults.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.faults.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FaultSink for CollectingFaultSink {
    fn child_failed(
        &self,
        child_index: usize,
        event: &'static str,
        call: &CallHandle,
        fault: ObserverFault,
    ) {
        let _ = call;
        self.faults.lock().unwrap().push(RecordedFault {
            child_index,
            event,
            message: fault.to_string(),
        });
    }
}
