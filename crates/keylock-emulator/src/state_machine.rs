//! Access state machine.
//!
//! This module tracks the foreground's position in an access attempt, from
//! waiting for the first digit through evaluation to the outcome, and rejects
//! any transition the access flow does not allow.
//!
//! # States
//!
//! - `AwaitingFirstDigit`: prompt shown, waiting for the first key
//! - `AwaitingSecondDigit`: first digit stored and echoed
//! - `AwaitingConfirm`: both digits stored, waiting for the accept key
//!   (confirm entry mode only)
//! - `Evaluating`: comparing the entered code with the secret
//! - `MotorRunning`: code accepted, motor committed on
//! - `AlarmBuzzing`: code rejected, buzzer sounding
//! - `InvalidInput`: a non-digit key arrived where a digit was expected
//!
//! # Valid Transitions
//!
//! - AwaitingFirstDigit → AwaitingSecondDigit → Evaluating
//! - AwaitingSecondDigit → AwaitingConfirm → Evaluating
//! - Evaluating → MotorRunning | AlarmBuzzing
//! - AwaitingFirstDigit | AwaitingSecondDigit | AwaitingConfirm → InvalidInput
//! - MotorRunning | AlarmBuzzing | InvalidInput → AwaitingFirstDigit
//!
//! # Examples
//!
//! ```
//! use keylock_emulator::{AccessState, StateMachine};
//!
//! let mut machine = StateMachine::new();
//! assert_eq!(machine.current_state(), AccessState::AwaitingFirstDigit);
//!
//! machine.transition_to(AccessState::AwaitingSecondDigit).unwrap();
//! assert!(machine.transition_to(AccessState::MotorRunning).is_err());
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

use keylock_core::{Error, Result};

/// Maximum number of state transitions to keep in history.
///
/// A full attempt is four transitions, so this covers the last 25 attempts.
const MAX_HISTORY_SIZE: usize = 100;

/// Number of transitions carried in each published [`StateReport`].
pub const REPORTED_TRANSITIONS: usize = 8;

/// Foreground states of an access attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessState {
    /// Prompt shown, no digit stored.
    AwaitingFirstDigit,

    /// First digit stored.
    AwaitingSecondDigit,

    /// Both digits stored, waiting for the accept key.
    AwaitingConfirm,

    /// Comparing the entered code with the secret.
    Evaluating,

    /// Code accepted and the motor committed on.
    MotorRunning,

    /// Code rejected and the buzzer sounding.
    AlarmBuzzing,

    /// Attempt aborted by a non-digit key.
    InvalidInput,
}

impl fmt::Display for AccessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            AccessState::AwaitingFirstDigit => "AwaitingFirstDigit",
            AccessState::AwaitingSecondDigit => "AwaitingSecondDigit",
            AccessState::AwaitingConfirm => "AwaitingConfirm",
            AccessState::Evaluating => "Evaluating",
            AccessState::MotorRunning => "MotorRunning",
            AccessState::AlarmBuzzing => "AlarmBuzzing",
            AccessState::InvalidInput => "InvalidInput",
        };
        write!(f, "{}", state_str)
    }
}

impl AccessState {
    /// Check if transition to target state is valid from this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use keylock_emulator::AccessState;
    ///
    /// assert!(AccessState::Evaluating.can_transition_to(&AccessState::MotorRunning));
    /// assert!(!AccessState::Evaluating.can_transition_to(&AccessState::InvalidInput));
    /// ```
    pub fn can_transition_to(&self, target: &AccessState) -> bool {
        match self {
            AccessState::AwaitingFirstDigit => matches!(
                target,
                AccessState::AwaitingSecondDigit | AccessState::InvalidInput
            ),
            AccessState::AwaitingSecondDigit => matches!(
                target,
                AccessState::Evaluating | AccessState::AwaitingConfirm | AccessState::InvalidInput
            ),
            AccessState::AwaitingConfirm => matches!(
                target,
                AccessState::Evaluating | AccessState::InvalidInput
            ),
            AccessState::Evaluating => matches!(
                target,
                AccessState::MotorRunning | AccessState::AlarmBuzzing
            ),
            // Every outcome returns to the prompt
            AccessState::MotorRunning | AccessState::AlarmBuzzing | AccessState::InvalidInput => {
                *target == AccessState::AwaitingFirstDigit
            }
        }
    }

    /// Returns `true` for states in which a key is expected.
    pub fn expects_key(&self) -> bool {
        matches!(
            self,
            AccessState::AwaitingFirstDigit
                | AccessState::AwaitingSecondDigit
                | AccessState::AwaitingConfirm
        )
    }
}

/// Represents a single state transition with timestamp.
///
/// # Serialization Note
///
/// The `timestamp` field is not serialized as `Instant` is process-specific.
/// When deserializing, the timestamp will be set to the current time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state transitioned from.
    pub from: AccessState,

    /// The state transitioned to.
    pub to: AccessState,

    /// When the transition occurred.
    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StateTransition {
    /// Create a new state transition record stamped now.
    pub fn new(from: AccessState, to: AccessState) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    /// Get the duration since this transition occurred.
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// Current state plus the most recent transitions, oldest first.
///
/// Published by the machine on every change so that tasks which do not own
/// the machine can inspect it.
#[derive(Debug, Clone)]
pub struct StateReport {
    pub state: AccessState,
    pub recent: Vec<StateTransition>,
}

impl StateReport {
    fn initial(state: AccessState) -> Self {
        Self {
            state,
            recent: Vec::new(),
        }
    }
}

/// State machine for the access attempt flow.
///
/// Enforces valid transitions and keeps a bounded transition history.
///
/// # Thread Safety
///
/// This struct is owned by the foreground task and is not shared.
#[derive(Debug)]
pub struct StateMachine {
    /// Current state.
    current_state: AccessState,

    /// History of state transitions (limited to MAX_HISTORY_SIZE).
    history: VecDeque<StateTransition>,

    report: watch::Sender<StateReport>,
}

impl StateMachine {
    /// Create a new state machine waiting for the first digit.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for constructing a state machine with custom configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use keylock_emulator::{AccessState, StateMachine};
    ///
    /// let machine = StateMachine::builder()
    ///     .with_initial_state(AccessState::Evaluating)
    ///     .build();
    ///
    /// assert_eq!(machine.current_state(), AccessState::Evaluating);
    /// ```
    pub fn builder() -> StateMachineBuilder {
        StateMachineBuilder::default()
    }

    /// Get the current state of the machine.
    pub fn current_state(&self) -> AccessState {
        self.current_state
    }

    /// Transition history, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Get the last N state transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        self.history
            .iter()
            .rev()
            .take(count)
            .rev()
            .cloned()
            .collect()
    }

    /// Watch the current state and recent transitions.
    pub fn subscribe(&self) -> watch::Receiver<StateReport> {
        self.report.subscribe()
    }

    /// Transition to a new state, validating the transition.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the transition is not
    /// allowed from the current state. The machine is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use keylock_emulator::{AccessState, StateMachine};
    ///
    /// let mut machine = StateMachine::new();
    ///
    /// let transition = machine.transition_to(AccessState::InvalidInput).unwrap();
    /// assert_eq!(transition.from, AccessState::AwaitingFirstDigit);
    ///
    /// assert!(machine.transition_to(AccessState::Evaluating).is_err());
    /// ```
    pub fn transition_to(&mut self, new_state: AccessState) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.current_state, new_state);
        debug!(from = %transition.from, to = %transition.to, "state transition");
        self.perform_state_change(new_state, transition.clone());

        Ok(transition)
    }

    /// Force the machine back to `AwaitingFirstDigit`.
    ///
    /// Used for error recovery; no validation is applied.
    pub fn reset(&mut self) -> StateTransition {
        let transition = StateTransition::new(self.current_state, AccessState::AwaitingFirstDigit);
        self.perform_state_change(AccessState::AwaitingFirstDigit, transition.clone());
        transition
    }

    fn perform_state_change(&mut self, new_state: AccessState, transition: StateTransition) {
        self.current_state = new_state;

        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }

        self.report.send_replace(StateReport {
            state: new_state,
            recent: self.last_transitions(REPORTED_TRANSITIONS),
        });
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing `StateMachine` instances.
#[derive(Debug)]
pub struct StateMachineBuilder {
    initial_state: AccessState,
}

impl StateMachineBuilder {
    /// Set the initial state for the machine.
    pub fn with_initial_state(mut self, state: AccessState) -> Self {
        self.initial_state = state;
        self
    }

    /// Build the state machine.
    pub fn build(self) -> StateMachine {
        let (report, _) = watch::channel(StateReport::initial(self.initial_state));
        StateMachine {
            current_state: self.initial_state,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
            report,
        }
    }
}

impl Default for StateMachineBuilder {
    fn default() -> Self {
        Self {
            initial_state: AccessState::AwaitingFirstDigit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_new_machine_awaits_first_digit() {
        let machine = StateMachine::new();
        assert_eq!(machine.current_state(), AccessState::AwaitingFirstDigit);
        assert!(machine.history().is_empty());
    }

    #[rstest]
    #[case(AccessState::AwaitingFirstDigit, AccessState::AwaitingSecondDigit)]
    #[case(AccessState::AwaitingFirstDigit, AccessState::InvalidInput)]
    #[case(AccessState::AwaitingSecondDigit, AccessState::Evaluating)]
    #[case(AccessState::AwaitingSecondDigit, AccessState::AwaitingConfirm)]
    #[case(AccessState::AwaitingSecondDigit, AccessState::InvalidInput)]
    #[case(AccessState::AwaitingConfirm, AccessState::Evaluating)]
    #[case(AccessState::AwaitingConfirm, AccessState::InvalidInput)]
    #[case(AccessState::Evaluating, AccessState::MotorRunning)]
    #[case(AccessState::Evaluating, AccessState::AlarmBuzzing)]
    #[case(AccessState::MotorRunning, AccessState::AwaitingFirstDigit)]
    #[case(AccessState::AlarmBuzzing, AccessState::AwaitingFirstDigit)]
    #[case(AccessState::InvalidInput, AccessState::AwaitingFirstDigit)]
    fn test_valid_transitions(#[case] from: AccessState, #[case] to: AccessState) {
        let mut machine = StateMachine::builder().with_initial_state(from).build();
        let transition = machine.transition_to(to).unwrap();
        assert_eq!(transition.from, from);
        assert_eq!(transition.to, to);
        assert_eq!(machine.current_state(), to);
    }

    #[rstest]
    #[case(AccessState::AwaitingFirstDigit, AccessState::Evaluating)]
    #[case(AccessState::AwaitingFirstDigit, AccessState::MotorRunning)]
    #[case(AccessState::Evaluating, AccessState::InvalidInput)]
    #[case(AccessState::Evaluating, AccessState::AwaitingFirstDigit)]
    #[case(AccessState::MotorRunning, AccessState::AlarmBuzzing)]
    #[case(AccessState::AlarmBuzzing, AccessState::MotorRunning)]
    #[case(AccessState::InvalidInput, AccessState::Evaluating)]
    fn test_invalid_transitions(#[case] from: AccessState, #[case] to: AccessState) {
        let mut machine = StateMachine::builder().with_initial_state(from).build();
        let result = machine.transition_to(to);
        assert!(matches!(result, Err(Error::InvalidStateTransition { .. })));
        assert_eq!(machine.current_state(), from);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_complete_granted_flow_history() {
        let mut machine = StateMachine::new();
        for state in [
            AccessState::AwaitingSecondDigit,
            AccessState::Evaluating,
            AccessState::MotorRunning,
            AccessState::AwaitingFirstDigit,
        ] {
            machine.transition_to(state).unwrap();
        }

        assert_eq!(machine.history().len(), 4);
        let last = machine.last_transitions(2);
        assert_eq!(last[0].to, AccessState::MotorRunning);
        assert_eq!(last[1].to, AccessState::AwaitingFirstDigit);
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut machine = StateMachine::builder()
            .with_initial_state(AccessState::Evaluating)
            .build();
        let transition = machine.reset();
        assert_eq!(transition.from, AccessState::Evaluating);
        assert_eq!(machine.current_state(), AccessState::AwaitingFirstDigit);
    }

    #[test]
    fn test_history_size_limit() {
        let mut machine = StateMachine::new();
        for _ in 0..60 {
            machine.transition_to(AccessState::InvalidInput).unwrap();
            machine
                .transition_to(AccessState::AwaitingFirstDigit)
                .unwrap();
        }
        assert_eq!(machine.history().len(), MAX_HISTORY_SIZE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_recent_transitions() {
        let mut machine = StateMachine::new();
        let report = machine.subscribe();
        assert_eq!(report.borrow().state, AccessState::AwaitingFirstDigit);
        assert!(report.borrow().recent.is_empty());

        machine.transition_to(AccessState::InvalidInput).unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        machine
            .transition_to(AccessState::AwaitingFirstDigit)
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let snapshot = report.borrow().clone();
        assert_eq!(snapshot.state, AccessState::AwaitingFirstDigit);
        assert_eq!(snapshot.recent.len(), 2);
        assert_eq!(snapshot.recent[0].to, AccessState::InvalidInput);
        assert_eq!(snapshot.recent[0].elapsed(), Duration::from_millis(300));
        assert_eq!(snapshot.recent[1].elapsed(), Duration::from_millis(50));
    }

    #[test]
    fn test_report_is_bounded() {
        let mut machine = StateMachine::new();
        let report = machine.subscribe();
        for _ in 0..10 {
            machine.transition_to(AccessState::InvalidInput).unwrap();
            machine.reset();
        }
        assert_eq!(report.borrow().recent.len(), REPORTED_TRANSITIONS);
        assert_eq!(machine.history().len(), 20);
    }

    #[test]
    fn test_expects_key() {
        assert!(AccessState::AwaitingFirstDigit.expects_key());
        assert!(AccessState::AwaitingConfirm.expects_key());
        assert!(!AccessState::Evaluating.expects_key());
        assert!(!AccessState::MotorRunning.expects_key());
    }

    #[test]
    fn test_state_display_formatting() {
        assert_eq!(
            AccessState::AwaitingFirstDigit.to_string(),
            "AwaitingFirstDigit"
        );
        assert_eq!(AccessState::AlarmBuzzing.to_string(), "AlarmBuzzing");
    }
}
