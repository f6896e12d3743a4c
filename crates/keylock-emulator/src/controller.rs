//! Foreground access controller.
//!
//! Collects a two-digit code from the keypad, echoes it, evaluates it against
//! the secret and drives the outcome through the [`ActuatorBus`]:
//!
//! - **Granted**: with the emergency handler masked, the motor is switched on
//!   and held for the success interval. The motor then stays latched on.
//! - **Denied**: the motor is switched off, then the buzzer sounds for the
//!   failure interval.
//! - **Invalid input**: a non-digit where a digit is expected discards the
//!   attempt without touching the actuators.
//!
//! Every outcome ends with the result pause and the prompt.

use std::sync::Arc;

use keylock_core::{
    AccessAttempt, AccessConfig, EntryMode, Error, KeyEvent, Result,
    constants::{ECHO_LINE, MSG_DENIED, MSG_DIGITS_ONLY, MSG_GRANTED, MSG_PROMPT},
};
use keylock_hardware::{Delay, KeypadDevice};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::bus::ActuatorBus;
use crate::state_machine::{AccessState, StateMachine};
use crate::stats::StatEvent;

/// How an access attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Granted,
    Denied,
    InvalidInput,
}

/// The foreground loop.
#[derive(Debug)]
pub struct AccessController<K, D> {
    keypad: K,
    delay: D,
    bus: Arc<ActuatorBus>,
    config: AccessConfig,
    machine: StateMachine,
    attempt: AccessAttempt,
}

impl<K, D> AccessController<K, D>
where
    K: KeypadDevice,
    D: Delay,
{
    pub fn new(keypad: K, bus: Arc<ActuatorBus>, delay: D, config: AccessConfig) -> Self {
        Self {
            keypad,
            delay,
            bus,
            config,
            machine: StateMachine::new(),
            attempt: AccessAttempt::new(),
        }
    }

    /// Current foreground state.
    pub fn state(&self) -> AccessState {
        self.machine.current_state()
    }

    /// The state machine, for transition history.
    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// Digits collected so far in the current attempt.
    pub fn attempt(&self) -> &AccessAttempt {
        &self.attempt
    }

    /// Drive both actuators off and show the prompt.
    pub async fn power_on(&mut self) {
        let mut outputs = self.bus.acquire().await;
        outputs.set_motor(false);
        outputs.set_buzzer(false);
        outputs.show(MSG_PROMPT);
        info!(entry_mode = ?self.config.entry_mode, "access controller ready");
    }

    /// Advance the attempt with one key.
    ///
    /// Returns the outcome once the attempt has finished, after the result
    /// pause and with the prompt back on screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the machine is not in a state that takes keys.
    /// The caller is expected to [`recover`](Self::recover).
    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<Option<AttemptOutcome>> {
        let state = self.machine.current_state();
        match (state, key) {
            (AccessState::AwaitingFirstDigit, KeyEvent::Digit(digit)) => {
                self.store_digit(digit).await?;
                self.machine.transition_to(AccessState::AwaitingSecondDigit)?;
                Ok(None)
            }
            (AccessState::AwaitingSecondDigit, KeyEvent::Digit(digit)) => {
                self.store_digit(digit).await?;
                match self.config.entry_mode {
                    EntryMode::Immediate => {
                        self.machine.transition_to(AccessState::Evaluating)?;
                        self.evaluate().await.map(Some)
                    }
                    EntryMode::Confirm => {
                        self.machine.transition_to(AccessState::AwaitingConfirm)?;
                        Ok(None)
                    }
                }
            }
            (AccessState::AwaitingConfirm, KeyEvent::Accept) => {
                self.machine.transition_to(AccessState::Evaluating)?;
                self.evaluate().await.map(Some)
            }
            (state, key) if state.expects_key() => self.reject(key).await.map(Some),
            (state, key) => Err(Error::InvalidStateTransition {
                from: state.to_string(),
                to: format!("key {key}"),
            }),
        }
    }

    /// One foreground pass: yield to a pending emergency, scan the keypad
    /// and handle the key, if any.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`handle_key`](Self::handle_key).
    pub async fn run_cycle(&mut self) -> Result<Option<AttemptOutcome>> {
        self.bus.checkpoint().await;
        match self.keypad.poll_keypad().await {
            Some(key) => self.handle_key(key).await,
            None => Ok(None),
        }
    }

    /// Run the foreground loop forever. Errors are logged and the attempt is
    /// reset; nothing stops the loop.
    pub async fn run(mut self) {
        loop {
            match self.run_cycle().await {
                Ok(Some(outcome)) => debug!(?outcome, "attempt finished"),
                Ok(None) => {}
                Err(error) => {
                    error!(%error, "access cycle failed, resetting");
                    self.recover().await;
                }
            }
        }
    }

    /// Discard the attempt and return to the prompt.
    pub async fn recover(&mut self) {
        self.attempt.clear();
        self.machine.reset();
        self.bus.acquire().await.show(MSG_PROMPT);
    }

    async fn store_digit(&mut self, digit: u8) -> Result<()> {
        self.attempt.push_digit(digit)?;
        let column = if self.attempt.is_complete() { 1 } else { 0 };
        self.bus
            .acquire()
            .await
            .write_text(ECHO_LINE, column, &digit.to_string());
        self.delay.delay(self.config.timing.digit_pacing).await;
        Ok(())
    }

    async fn evaluate(&mut self) -> Result<AttemptOutcome> {
        let entered = self
            .attempt
            .entered()
            .ok_or_else(|| Error::IncompleteAttempt("evaluated before second digit".into()))?;
        self.attempt.clear();

        let timing = self.config.timing;
        let outcome = if self.config.secret.matches(entered) {
            {
                let mut outputs = self.bus.mask().await;
                outputs.set_motor(true);
                outputs.show(MSG_GRANTED);
                self.delay.delay(timing.success_hold).await;
            }
            self.machine.transition_to(AccessState::MotorRunning)?;
            self.bus.record(StatEvent::Granted);
            info!("access granted");
            AttemptOutcome::Granted
        } else {
            self.machine.transition_to(AccessState::AlarmBuzzing)?;
            {
                let mut outputs = self.bus.acquire().await;
                outputs.set_motor(false);
                outputs.set_buzzer(true);
                outputs.show(MSG_DENIED);
            }
            info!(
                hold_ms = timing.failure_hold.as_millis() as u64,
                "access denied"
            );
            self.delay.delay(timing.failure_hold).await;
            self.bus.acquire().await.set_buzzer(false);
            self.bus.record(StatEvent::Denied);
            AttemptOutcome::Denied
        };

        self.finish_attempt().await?;
        Ok(outcome)
    }

    async fn reject(&mut self, key: KeyEvent) -> Result<AttemptOutcome> {
        warn!(%key, "non-digit key, attempt discarded");
        self.attempt.clear();
        self.machine.transition_to(AccessState::InvalidInput)?;
        self.bus.acquire().await.show(MSG_DIGITS_ONLY);
        self.bus.record(StatEvent::Invalid);
        self.finish_attempt().await?;
        Ok(AttemptOutcome::InvalidInput)
    }

    async fn finish_attempt(&mut self) -> Result<()> {
        self.delay.delay(self.config.timing.result_display).await;
        self.bus.acquire().await.show(MSG_PROMPT);
        self.machine.transition_to(AccessState::AwaitingFirstDigit)?;
        Ok(())
    }
}
