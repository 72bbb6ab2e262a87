//! Dispatch audit log (test-only observability).
//!
//! Every syscall dispatch records an Invoked event followed by a
//! Completed or Rejected event, so tests can assert on the exact
//! sequence of kernel entry points an operation exercised.

use core_types::ErrorCode;

/// One audit event emitted by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchEvent {
    /// A syscall entered the dispatcher.
    Invoked { opcode: &'static str },
    /// The syscall took effect (including terminal and switching outcomes).
    Completed { opcode: &'static str },
    /// The syscall was rejected without side effects.
    Rejected {
        opcode: &'static str,
        error: ErrorCode,
    },
}

/// Append-only log of dispatch events.
#[derive(Debug, Clone, Default)]
pub struct DispatchAuditLog {
    events: Vec<DispatchEvent>,
}

impl DispatchAuditLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn record(&mut self, event: DispatchEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[DispatchEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn has_event<F>(&self, predicate: F) -> bool
    where
        F: Fn(&DispatchEvent) -> bool,
    {
        self.events.iter().any(predicate)
    }

    pub fn count_events<F>(&self, predicate: F) -> usize
    where
        F: Fn(&DispatchEvent) -> bool,
    {
        self.events.iter().filter(|event| predicate(event)).count()
    }
}
