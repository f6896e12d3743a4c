//! Recording motor and buzzer lines.
//!
//! Both lines write into one shared timeline of [`OutputState`] snapshots so
//! that tests can check the motor/buzzer exclusivity invariant across every
//! transition and measure how long each state was held.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use keylock_core::OutputState;
use tokio::time::Instant;

use super::lock;
use crate::traits::OutputLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Actuator {
    Motor,
    Buzzer,
}

/// One recorded change of the actuator pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputTransition {
    /// When the write happened (Tokio clock, so it follows paused time).
    pub at: Instant,

    /// Levels after the write.
    pub state: OutputState,
}

#[derive(Debug, Default)]
struct Timeline {
    current: OutputState,
    history: Vec<OutputTransition>,
}

/// Constructor for a recording motor/buzzer pair.
#[derive(Debug)]
pub struct MockActuators;

impl MockActuators {
    /// Create a motor line, a buzzer line and a probe sharing one timeline.
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (MockActuatorLine, MockActuatorLine, ActuatorProbe) {
        let timeline = Arc::new(Mutex::new(Timeline::default()));
        let line = |actuator| MockActuatorLine {
            actuator,
            timeline: Arc::clone(&timeline),
        };
        (
            line(Actuator::Motor),
            line(Actuator::Buzzer),
            ActuatorProbe {
                timeline: Arc::clone(&timeline),
            },
        )
    }
}

/// Motor or buzzer line recording into the shared timeline.
#[derive(Debug)]
pub struct MockActuatorLine {
    actuator: Actuator,
    timeline: Arc<Mutex<Timeline>>,
}

impl OutputLine for MockActuatorLine {
    fn write(&mut self, level: bool) {
        let mut timeline = lock(&self.timeline);
        let mut next = timeline.current;
        match self.actuator {
            Actuator::Motor => next.motor = level,
            Actuator::Buzzer => next.buzzer = level,
        }
        if next != timeline.current {
            timeline.current = next;
            timeline.history.push(OutputTransition {
                at: Instant::now(),
                state: next,
            });
        }
    }
}

/// Read-only view of the recorded actuator timeline.
#[derive(Debug, Clone)]
pub struct ActuatorProbe {
    timeline: Arc<Mutex<Timeline>>,
}

impl ActuatorProbe {
    /// Current levels.
    pub fn state(&self) -> OutputState {
        lock(&self.timeline).current
    }

    /// Every change so far, oldest first.
    pub fn history(&self) -> Vec<OutputTransition> {
        lock(&self.timeline).history.clone()
    }

    /// Returns `false` if motor and buzzer were ever on at the same time.
    pub fn was_always_consistent(&self) -> bool {
        lock(&self.timeline)
            .history
            .iter()
            .all(|transition| transition.state.is_consistent())
    }

    /// Number of times the motor was switched on.
    pub fn motor_starts(&self) -> usize {
        self.count_rising(|state| state.motor)
    }

    /// Number of times the buzzer was switched on.
    pub fn buzzer_starts(&self) -> usize {
        self.count_rising(|state| state.buzzer)
    }

    /// When the given state was first entered, if ever.
    pub fn first_entered(&self, state: OutputState) -> Option<Instant> {
        lock(&self.timeline)
            .history
            .iter()
            .find(|transition| transition.state == state)
            .map(|transition| transition.at)
    }

    /// How long the buzzer stayed on for each completed buzzer period.
    pub fn buzzer_periods(&self) -> Vec<Duration> {
        let timeline = lock(&self.timeline);
        let mut periods = Vec::new();
        let mut started: Option<Instant> = None;
        for transition in &timeline.history {
            match (started, transition.state.buzzer) {
                (None, true) => started = Some(transition.at),
                (Some(start), false) => {
                    periods.push(transition.at - start);
                    started = None;
                }
                _ => {}
            }
        }
        periods
    }

    fn count_rising(&self, level: impl Fn(&OutputState) -> bool) -> usize {
        let timeline = lock(&self.timeline);
        let mut previous = false;
        let mut count = 0;
        for transition in &timeline.history {
            let now = level(&transition.state);
            if now && !previous {
                count += 1;
            }
            previous = now;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_records_changes_only() {
        let (mut motor, mut buzzer, probe) = MockActuators::new();

        motor.write(false);
        motor.write(true);
        motor.write(true);
        motor.write(false);
        buzzer.write(true);

        let states: Vec<OutputState> = probe.history().iter().map(|t| t.state).collect();
        assert_eq!(
            states,
            vec![OutputState::RUNNING, OutputState::IDLE, OutputState::ALARM]
        );
        assert_eq!(probe.motor_starts(), 1);
        assert_eq!(probe.buzzer_starts(), 1);
        assert!(probe.was_always_consistent());
    }

    #[test]
    fn test_overlap_is_detected() {
        let (mut motor, mut buzzer, probe) = MockActuators::new();
        motor.write(true);
        buzzer.write(true);
        assert!(!probe.was_always_consistent());
    }

    #[tokio::test(start_paused = true)]
    async fn test_buzzer_periods() {
        let (_motor, mut buzzer, probe) = MockActuators::new();

        buzzer.write(true);
        tokio::time::sleep(Duration::from_millis(250)).await;
        buzzer.write(false);

        assert_eq!(probe.buzzer_periods(), vec![Duration::from_millis(250)]);
        assert_eq!(probe.first_entered(OutputState::RUNNING), None);
    }
}
