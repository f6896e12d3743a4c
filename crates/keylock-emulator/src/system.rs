//! Whole-system wiring.
//!
//! [`KeylockSystem::start`] puts the outputs on an [`ActuatorBus`], spawns the
//! emergency handler, powers the controller on and spawns the foreground
//! loop. Both tasks run until the system is shut down.

use std::sync::Arc;

use keylock_core::{AccessConfig, Result};
use keylock_hardware::{Delay, InputLine, InterruptFlag, KeypadDevice, OutputController};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info};

use crate::bus::ActuatorBus;
use crate::controller::AccessController;
use crate::emergency::EmergencyHandler;
use crate::state_machine::StateReport;
use crate::stats::StatsSnapshot;

/// A running access controller and its emergency handler.
#[derive(Debug)]
pub struct KeylockSystem {
    bus: Arc<ActuatorBus>,
    report: watch::Receiver<StateReport>,
    foreground: JoinHandle<()>,
    handler: JoinHandle<()>,
}

impl KeylockSystem {
    /// Validate `config`, wire the collaborators and start both tasks.
    ///
    /// `flag` must be the flag the platform raises on the emergency line's
    /// rising edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub async fn start<K, L, D>(
        config: AccessConfig,
        keypad: K,
        outputs: OutputController,
        emergency_line: L,
        flag: InterruptFlag,
        delay: D,
    ) -> Result<Self>
    where
        K: KeypadDevice + 'static,
        L: InputLine + 'static,
        D: Delay + Clone + 'static,
    {
        config.validate()?;

        let bus = Arc::new(ActuatorBus::new(outputs, flag));
        let handler = EmergencyHandler::new(
            emergency_line,
            Arc::clone(&bus),
            delay.clone(),
            &config.timing,
        )
        .spawn();

        let mut controller = AccessController::new(keypad, Arc::clone(&bus), delay, config);
        controller.power_on().await;
        let report = controller.machine().subscribe();
        let foreground = tokio::spawn(controller.run());

        info!(version = keylock_core::VERSION, "keylock system started");
        Ok(Self {
            bus,
            report,
            foreground,
            handler,
        })
    }

    /// The shared actuator bus.
    pub fn bus(&self) -> &Arc<ActuatorBus> {
        &self.bus
    }

    /// Attempt and emergency counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.bus.stats()
    }

    /// Foreground state and its most recent transitions.
    pub fn state_report(&self) -> StateReport {
        self.report.borrow().clone()
    }

    /// Returns `true` while an emergency is pending or being served.
    pub fn emergency_active(&self) -> bool {
        self.bus.flag().is_raised()
    }

    /// Stop both tasks.
    pub async fn shutdown(self) {
        self.foreground.abort();
        self.handler.abort();
        log_task_exit("foreground", self.foreground.await);
        log_task_exit("emergency handler", self.handler.await);
        info!("keylock system stopped");
    }
}

fn log_task_exit(task: &str, result: std::result::Result<(), JoinError>) {
    match result {
        Err(error) if !error.is_cancelled() => error!(task, %error, "task failed"),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DisplayHandle;
    use crate::state_machine::AccessState;
    use keylock_core::KeyEvent;
    use keylock_hardware::TokioDelay;
    use keylock_hardware::mock::{MockActuators, MockEmergencyLine, MockKeypad};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_state_report_follows_foreground() {
        let (keypad, keys) = MockKeypad::new();
        let (motor, buzzer, _probe) = MockActuators::new();
        let flag = InterruptFlag::new();
        let (line, _button) = MockEmergencyLine::new(flag.clone());
        let outputs = OutputController::new(motor, buzzer, DisplayHandle::default());
        let system = KeylockSystem::start(
            AccessConfig::default(),
            keypad,
            outputs,
            line,
            flag,
            TokioDelay,
        )
        .await
        .unwrap();
        assert_eq!(system.state_report().state, AccessState::AwaitingFirstDigit);

        keys.send_key(KeyEvent::Digit(3)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;

        let report = system.state_report();
        assert_eq!(report.state, AccessState::AwaitingSecondDigit);
        assert_eq!(report.recent.len(), 1);
        assert_eq!(report.recent[0].from, AccessState::AwaitingFirstDigit);

        system.shutdown().await;
    }

    #[tokio::test]
    async fn test_cancelled_task_exit_is_quiet() {
        let task = tokio::spawn(std::future::pending::<()>());
        task.abort();
        let result = task.await;
        assert!(result.as_ref().is_err_and(JoinError::is_cancelled));
        log_task_exit("pending", result);
    }
}
