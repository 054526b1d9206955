//! Single-flight enforcement per named operation
//!
//! At most one execution of a given operation name may be in flight at a
//! time. A second caller is rejected outright; nothing is queued and
//! nothing retries. Release happens on every exit path via an RAII guard,
//! so a failing operation can never leave its name stuck in flight.

use dashmap::DashMap;

use bz_core::Operation;

/// Per-operation in-flight bookkeeping
#[derive(Debug, Default)]
struct PendingOperation {
    in_flight: bool,
    /// Token for the most recently submitted input, if the operation
    /// carries one
    last_input: Option<String>,
}

/// Gate enforcing at-most-one-in-flight per operation name
#[derive(Default)]
pub struct OperationGate {
    pending: DashMap<Operation, PendingOperation>,
}

impl OperationGate {
    /// Create a new gate with all operations idle
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to begin `op`. Returns a guard that releases the operation when
    /// dropped, or `None` if `op` is already in flight.
    pub fn begin(&self, op: Operation) -> Option<OperationGuard<'_>> {
        let mut entry = self.pending.entry(op).or_default();
        if entry.in_flight {
            return None;
        }
        entry.in_flight = true;
        drop(entry);
        Some(OperationGuard { gate: self, op })
    }

    /// Whether `op` is currently in flight
    pub fn is_in_flight(&self, op: Operation) -> bool {
        self.pending
            .get(&op)
            .map(|p| p.in_flight)
            .unwrap_or(false)
    }

    /// Record the input token most recently submitted for `op`
    pub fn record_input(&self, op: Operation, input: impl Into<String>) {
        let mut entry = self.pending.entry(op).or_default();
        entry.last_input = Some(input.into());
    }

    /// The input token most recently submitted for `op`, if any
    pub fn last_input(&self, op: Operation) -> Option<String> {
        self.pending.get(&op).and_then(|p| p.last_input.clone())
    }

    fn end(&self, op: Operation) {
        if let Some(mut entry) = self.pending.get_mut(&op) {
            entry.in_flight = false;
        }
    }
}

/// Scoped hold on an operation name. Dropping the guard marks the
/// operation idle again.
pub struct OperationGuard<'a> {
    gate: &'a OperationGate,
    op: Operation,
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.gate.end(self.op);
    }
}
