//! Mock device implementations for testing and development.
//!
//! This module provides simulated lines and devices that can be controlled
//! programmatically without requiring physical hardware:
//!
//! - [`MockKeypad`]: scripted key events delivered through a channel.
//! - [`MockMatrix`]: an electrical model of the 4x4 matrix for
//!   [`MatrixKeypad`](crate::keypad::MatrixKeypad).
//! - [`MockActuators`]: motor and buzzer lines recording a shared timeline.
//! - [`MockEmergencyLine`]: the emergency input and the button that drives it.

pub mod actuators;
pub mod emergency;
pub mod keypad;
pub mod matrix;

use std::sync::{Mutex, MutexGuard, PoisonError};

// Re-export commonly used types
pub use actuators::{ActuatorProbe, MockActuatorLine, MockActuators, OutputTransition};
pub use emergency::{EmergencyInput, MockEmergencyButton, MockEmergencyLine};
pub use keypad::{MockKeypad, MockKeypadHandle};
pub use matrix::{MockColumnLine, MockMatrix, MockMatrixHandle, MockRowLine};

/// Lock a mock's shared state, ignoring poisoning from a panicked test thread.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
