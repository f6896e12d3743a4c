//! Emergency-stop handler.
//!
//! Runs on its own task and serves the latched [`InterruptFlag`]. Each run
//! takes the actuator bus, waits out the debounce window and re-reads the
//! emergency line. A line that has already dropped is a glitch and is
//! ignored. Otherwise the motor is forced off, the buzzer sounds for the hold
//! duration and then stops. The flag is cleared before the bus is released,
//! so edges arriving during a run coalesce into it.

use std::sync::Arc;
use std::time::Duration;

use keylock_core::TimingConfig;
use keylock_hardware::{Delay, InputLine};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::bus::ActuatorBus;
use crate::stats::StatEvent;

/// Result of one handler run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyOutcome {
    /// Line still asserted after debounce; stop sequence executed.
    Handled,
    /// Line dropped during debounce; nothing changed.
    Spurious,
}

/// Emergency-stop handler.
#[derive(Debug)]
pub struct EmergencyHandler<L, D> {
    line: L,
    bus: Arc<ActuatorBus>,
    delay: D,
    debounce: Duration,
    hold: Duration,
}

impl<L, D> EmergencyHandler<L, D>
where
    L: InputLine,
    D: Delay,
{
    /// Create a handler reading `line` and writing through `bus`.
    pub fn new(line: L, bus: Arc<ActuatorBus>, delay: D, timing: &TimingConfig) -> Self {
        Self {
            line,
            bus,
            delay,
            debounce: timing.emergency_debounce,
            hold: timing.emergency_hold,
        }
    }

    /// Serve one raised flag.
    ///
    /// The bus is held from the start of the debounce to the end of the hold.
    pub async fn handle(&mut self) -> EmergencyOutcome {
        let mut outputs = self.bus.preempt().await;

        self.delay.delay(self.debounce).await;
        if !self.line.read() {
            warn!(
                debounce_ms = self.debounce.as_millis() as u64,
                "emergency line dropped during debounce, edge ignored"
            );
            self.bus.flag().clear();
            self.bus.record(StatEvent::EmergencySpurious);
            return EmergencyOutcome::Spurious;
        }

        outputs.set_motor(false);
        outputs.set_buzzer(true);
        info!(
            hold_ms = self.hold.as_millis() as u64,
            "emergency stop engaged"
        );

        self.delay.delay(self.hold).await;

        outputs.set_buzzer(false);
        self.bus.flag().clear();
        self.bus.record(StatEvent::EmergencyHandled);
        info!("emergency stop released");

        EmergencyOutcome::Handled
    }

    /// Serve the flag forever.
    pub async fn run(mut self) {
        loop {
            self.bus.flag().raised().await;
            self.handle().await;
        }
    }
}

impl<L, D> EmergencyHandler<L, D>
where
    L: InputLine + 'static,
    D: Delay + 'static,
{
    /// Run the handler on a new Tokio task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
