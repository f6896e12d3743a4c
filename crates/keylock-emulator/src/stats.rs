//! Attempt and emergency counters.
//!
//! Both the foreground and the emergency handler record into one shared
//! [`Statistics`]; readers take a [`StatsSnapshot`].

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Countable events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatEvent {
    /// Correct code, motor committed on.
    Granted,
    /// Wrong code, buzzer sounded.
    Denied,
    /// Attempt aborted by a non-digit key.
    Invalid,
    /// Emergency confirmed and served.
    EmergencyHandled,
    /// Emergency edge rejected after the re-check.
    EmergencySpurious,
    /// Emergency edge that arrived while the handler was masked.
    EmergencyDeferred,
}

/// Lock-free event counters.
#[derive(Debug, Default)]
pub struct Statistics {
    granted: AtomicU64,
    denied: AtomicU64,
    invalid: AtomicU64,
    emergencies_handled: AtomicU64,
    emergencies_spurious: AtomicU64,
    emergencies_deferred: AtomicU64,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one event.
    pub fn record(&self, event: StatEvent) {
        let counter = match event {
            StatEvent::Granted => &self.granted,
            StatEvent::Denied => &self.denied,
            StatEvent::Invalid => &self.invalid,
            StatEvent::EmergencyHandled => &self.emergencies_handled,
            StatEvent::EmergencySpurious => &self.emergencies_spurious,
            StatEvent::EmergencyDeferred => &self.emergencies_deferred,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            granted: self.granted.load(Ordering::Relaxed),
            denied: self.denied.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            emergencies_handled: self.emergencies_handled.load(Ordering::Relaxed),
            emergencies_spurious: self.emergencies_spurious.load(Ordering::Relaxed),
            emergencies_deferred: self.emergencies_deferred.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`Statistics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub granted: u64,
    pub denied: u64,
    pub invalid: u64,
    pub emergencies_handled: u64,
    pub emergencies_spurious: u64,
    pub emergencies_deferred: u64,
}

impl StatsSnapshot {
    /// Completed attempts of any outcome.
    pub fn attempts(&self) -> u64 {
        self.granted + self.denied + self.invalid
    }
}
