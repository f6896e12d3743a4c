//! Common test utilities for integration tests.
//!
//! [`Bench`] starts a complete [`KeylockSystem`] on mock hardware and keeps
//! the handles a test needs: the scripted keypad, the emergency button, the
//! actuator probe and the display. All tests run on paused Tokio time, so
//! every instant below is exact.

#![allow(dead_code)]

use std::time::Duration;

use keylock_core::{AccessConfig, OutputState};
use keylock_emulator::{DisplayHandle, KeylockSystem};
use keylock_hardware::mock::{
    ActuatorProbe, MockActuators, MockEmergencyButton, MockEmergencyLine, MockKeypad,
    MockKeypadHandle, MockMatrix, MockMatrixHandle,
};
use keylock_hardware::{InterruptFlag, MatrixKeypad, OutputController, TokioDelay};
use tokio::time::Instant;

/// A running system and its test handles.
pub struct Bench {
    pub system: KeylockSystem,
    pub keys: MockKeypadHandle,
    pub button: MockEmergencyButton,
    pub probe: ActuatorProbe,
    pub display: DisplayHandle,
    pub started: Instant,
}

impl Bench {
    /// Start a system with a scripted keypad.
    pub async fn start(config: AccessConfig) -> Self {
        let (keypad, keys) = MockKeypad::new();
        let flag = InterruptFlag::new();
        let (line, button) = MockEmergencyLine::new(flag.clone());
        let (motor, buzzer, probe) = MockActuators::new();
        let display = DisplayHandle::default();
        let outputs = OutputController::new(motor, buzzer, display.clone());

        let started = Instant::now();
        let system = KeylockSystem::start(config, keypad, outputs, line, flag, TokioDelay)
            .await
            .unwrap();

        Self {
            system,
            keys,
            button,
            probe,
            display,
            started,
        }
    }

    /// Queue keypad symbols.
    pub async fn type_symbols(&self, symbols: &str) {
        self.keys.send_symbols(symbols).await.unwrap();
    }

    /// Sleep until `offset` after the system started.
    pub async fn advance_to(&self, offset: Duration) {
        tokio::time::sleep_until(self.started + offset).await;
    }

    /// Offset from start at which the actuators first reached `state`.
    pub fn entered_at(&self, state: OutputState) -> Option<Duration> {
        self.probe
            .first_entered(state)
            .map(|instant| instant - self.started)
    }
}

/// A running system scanning a simulated key matrix.
pub struct MatrixBench {
    pub system: KeylockSystem,
    pub matrix: MockMatrixHandle,
    pub probe: ActuatorProbe,
    pub display: DisplayHandle,
}

impl MatrixBench {
    pub async fn start(config: AccessConfig) -> Self {
        let (columns, rows, matrix) = MockMatrix::new(config.keymap);
        let keypad = MatrixKeypad::new(
            columns,
            rows,
            config.keymap,
            TokioDelay,
            config.timing.key_settle,
        );
        let flag = InterruptFlag::new();
        let (line, _button) = MockEmergencyLine::new(flag.clone());
        let (motor, buzzer, probe) = MockActuators::new();
        let display = DisplayHandle::default();
        let outputs = OutputController::new(motor, buzzer, display.clone());

        let system = KeylockSystem::start(config, keypad, outputs, line, flag, TokioDelay)
            .await
            .unwrap();

        Self {
            system,
            matrix,
            probe,
            display,
        }
    }
}

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}
