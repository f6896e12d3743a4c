//! Output controller: motor, buzzer and display.
//!
//! A thin, unchecked sink. Every call is forwarded straight to the line or
//! display, in call order, with no queuing. In particular the controller does
//! NOT enforce that motor and buzzer are never on together: callers must
//! sequence their writes (motor off before buzzer on) and hold the actuator
//! bus while doing so.

use keylock_core::OutputState;
use tracing::debug;

use crate::traits::{OutputLine, TextDisplay};

/// Gate over the two actuators and the character display.
///
/// # Examples
///
/// ```
/// use keylock_core::OutputState;
/// use keylock_hardware::mock::MockActuators;
/// use keylock_hardware::outputs::OutputController;
/// use keylock_hardware::traits::TextDisplay;
///
/// struct NoDisplay;
/// impl TextDisplay for NoDisplay {
///     fn clear(&mut self) {}
///     fn write_text(&mut self, _row: usize, _column: usize, _text: &str) {}
/// }
///
/// let (motor, buzzer, probe) = MockActuators::new();
/// let mut outputs = OutputController::new(motor, buzzer, NoDisplay);
///
/// outputs.set_motor(true);
/// assert_eq!(outputs.state(), OutputState::RUNNING);
/// assert_eq!(probe.state(), OutputState::RUNNING);
/// ```
pub struct OutputController {
    motor: Box<dyn OutputLine>,
    buzzer: Box<dyn OutputLine>,
    display: Box<dyn TextDisplay>,
    state: OutputState,
}

impl OutputController {
    /// Wrap the lines and display. The actuators are driven off immediately
    /// so the cached state matches the hardware.
    pub fn new(
        motor: impl OutputLine + 'static,
        buzzer: impl OutputLine + 'static,
        display: impl TextDisplay + 'static,
    ) -> Self {
        let mut controller = Self {
            motor: Box::new(motor),
            buzzer: Box::new(buzzer),
            display: Box::new(display),
            state: OutputState::IDLE,
        };
        controller.motor.write(false);
        controller.buzzer.write(false);
        controller
    }

    pub fn set_motor(&mut self, on: bool) {
        self.motor.write(on);
        if self.state.motor != on {
            debug!(on, "motor");
        }
        self.state.motor = on;
    }

    pub fn set_buzzer(&mut self, on: bool) {
        self.buzzer.write(on);
        if self.state.buzzer != on {
            debug!(on, "buzzer");
        }
        self.state.buzzer = on;
    }

    /// Clear the display and write `text` on the first line.
    pub fn show(&mut self, text: &str) {
        self.display.clear();
        self.display.write_text(0, 0, text);
    }

    /// Write `text` at a display position without clearing.
    pub fn write_text(&mut self, row: usize, column: usize, text: &str) {
        self.display.write_text(row, column, text);
    }

    /// Last levels written to the actuators.
    pub fn state(&self) -> OutputState {
        self.state
    }
}

impl std::fmt::Debug for OutputController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputController")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
