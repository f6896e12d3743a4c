//! Simulated emergency-stop button.
//!
//! The button drives the level of the emergency input line and, on a rising
//! edge, raises the interrupt flag the way the platform's edge detector would.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::{interrupt::InterruptFlag, traits::InputLine};

/// Emergency input line with its button.
#[derive(Debug)]
pub struct MockEmergencyLine;

impl MockEmergencyLine {
    /// Create the input line (for the handler's re-check) and the button,
    /// both wired to `flag`.
    ///
    /// # Examples
    ///
    /// ```
    /// use keylock_hardware::interrupt::InterruptFlag;
    /// use keylock_hardware::mock::MockEmergencyLine;
    /// use keylock_hardware::traits::InputLine;
    ///
    /// let flag = InterruptFlag::new();
    /// let (line, button) = MockEmergencyLine::new(flag.clone());
    ///
    /// button.press();
    /// assert!(line.read());
    /// assert!(flag.is_raised());
    /// ```
    #[allow(clippy::new_ret_no_self)]
    pub fn new(flag: InterruptFlag) -> (EmergencyInput, MockEmergencyButton) {
        let level = Arc::new(AtomicBool::new(false));
        (
            EmergencyInput {
                level: Arc::clone(&level),
            },
            MockEmergencyButton { level, flag },
        )
    }
}

/// Input side of the simulated emergency line.
#[derive(Debug, Clone)]
pub struct EmergencyInput {
    level: Arc<AtomicBool>,
}

impl InputLine for EmergencyInput {
    fn read(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }
}

/// Handle that presses and releases the emergency button.
#[derive(Debug, Clone)]
pub struct MockEmergencyButton {
    level: Arc<AtomicBool>,
    flag: InterruptFlag,
}

impl MockEmergencyButton {
    /// Assert the line. A low-to-high change raises the interrupt flag.
    pub fn press(&self) {
        if !self.level.swap(true, Ordering::SeqCst) {
            self.flag.raise();
        }
    }

    /// Release the line. Falling edges do not interrupt.
    pub fn release(&self) {
        self.level.store(false, Ordering::SeqCst);
    }

    /// Assert the line for `width`, then release it.
    pub async fn pulse(&self, width: Duration) {
        self.press();
        tokio::time::sleep(width).await;
        self.release();
    }
}
