//! Actuator bus: the shared, owned output state.
//!
//! The foreground and the emergency handler both write the
//! [`OutputController`]. On the target the handler simply preempts the
//! foreground; on the host both are Tokio tasks, so preemption is modelled
//! with one FIFO async mutex and a priority rule:
//!
//! - Holding the bus is owning the CPU. The handler holds it for its whole
//!   run, debounce and hold included.
//! - A foreground acquisition first waits until the interrupt flag is clear,
//!   and backs off if the flag was raised while it queued. A pending handler
//!   therefore always runs before the foreground's next output step.
//! - Masking is a foreground acquisition held across the motor-on commit
//!   window. A flag raised meanwhile stays pending and the handler runs as
//!   soon as the [`MaskGuard`] is dropped.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};

use keylock_hardware::{InterruptFlag, OutputController};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::stats::{StatEvent, Statistics, StatsSnapshot};

/// Output controller shared between the foreground and the emergency handler.
#[derive(Debug)]
pub struct ActuatorBus {
    outputs: Mutex<OutputController>,
    flag: InterruptFlag,
    masked: AtomicBool,
    stats: Statistics,
}

impl ActuatorBus {
    /// Put `outputs` on the bus, arbitrated by `flag`.
    pub fn new(outputs: OutputController, flag: InterruptFlag) -> Self {
        Self {
            outputs: Mutex::new(outputs),
            flag,
            masked: AtomicBool::new(false),
            stats: Statistics::new(),
        }
    }

    /// Foreground access to the outputs.
    ///
    /// Waits for any pending or running emergency to finish first.
    pub async fn acquire(&self) -> MutexGuard<'_, OutputController> {
        loop {
            self.flag.cleared().await;
            let outputs = self.outputs.lock().await;
            if !self.flag.is_raised() {
                return outputs;
            }
            // Raised while queued: let the handler go first.
            drop(outputs);
        }
    }

    /// Yield to a pending emergency without touching the outputs.
    pub async fn checkpoint(&self) {
        drop(self.acquire().await);
    }

    /// Mask the emergency handler and take the outputs for a critical
    /// section. Dropping the guard unmasks.
    pub async fn mask(&self) -> MaskGuard<'_> {
        let outputs = self.acquire().await;
        self.masked.store(true, Ordering::SeqCst);
        debug!("emergency masked");
        MaskGuard { bus: self, outputs }
    }

    /// Handler access to the outputs. Ignores the flag; waits only for a
    /// foreground step or masked section in progress.
    pub(crate) async fn preempt(&self) -> MutexGuard<'_, OutputController> {
        self.outputs.lock().await
    }

    /// The interrupt flag arbitrating this bus.
    pub fn flag(&self) -> &InterruptFlag {
        &self.flag
    }

    /// Returns `true` while a masked section is open.
    pub fn is_masked(&self) -> bool {
        self.masked.load(Ordering::SeqCst)
    }

    pub(crate) fn record(&self, event: StatEvent) {
        self.stats.record(event);
    }

    /// Attempt and emergency counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

/// Outputs held with the emergency handler masked.
///
/// Dereferences to the [`OutputController`].
#[derive(Debug)]
pub struct MaskGuard<'a> {
    bus: &'a ActuatorBus,
    outputs: MutexGuard<'a, OutputController>,
}

impl Deref for MaskGuard<'_> {
    type Target = OutputController;

    fn deref(&self) -> &Self::Target {
        &self.outputs
    }
}

impl DerefMut for MaskGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.outputs
    }
}

impl Drop for MaskGuard<'_> {
    fn drop(&mut self) {
        self.bus.masked.store(false, Ordering::SeqCst);
        debug!("emergency unmasked");
        if self.bus.flag.is_raised() {
            warn!("emergency edge arrived while masked, handling now");
            self.bus.record(StatEvent::EmergencyDeferred);
        }
        // The bus lock is released when `outputs` drops, after this body.
    }
}
