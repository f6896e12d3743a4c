//! Hardware abstraction layer for the keylock access controller.
//!
//! This crate defines the board-facing collaborators of the controller and
//! the small drivers built on top of them:
//!
//! - [`traits`]: digital input/output lines, the character display, the delay
//!   primitive and the keypad source.
//! - [`keypad`]: the 4x4 [`MatrixKeypad`] scanner.
//! - [`outputs`]: the [`OutputController`] gate over motor, buzzer and display.
//! - [`interrupt`]: the latched [`InterruptFlag`] raised by the emergency edge.
//! - [`mock`]: simulated lines and devices for tests and the simulator.
//!
//! # Design Philosophy
//!
//! - **Synchronous lines**: a GPIO read or write cannot fail and cannot block,
//!   so line and display traits are plain methods.
//! - **Async waiting**: delays and keypad passes are `Send` futures, so a
//!   wait is a suspension point where the emergency handler can run.
//! - **Object-safe sinks**: [`OutputLine`] and [`TextDisplay`] can be boxed,
//!   which keeps the shared output controller a concrete type.
//!
//! # Example
//!
//! ```
//! use keylock_core::OutputState;
//! use keylock_hardware::mock::MockActuators;
//! use keylock_hardware::{OutputController, TextDisplay};
//!
//! struct Lcd(Vec<String>);
//! impl TextDisplay for Lcd {
//!     fn clear(&mut self) { self.0.clear(); }
//!     fn write_text(&mut self, _row: usize, _column: usize, text: &str) {
//!         self.0.push(text.to_string());
//!     }
//! }
//!
//! let (motor, buzzer, probe) = MockActuators::new();
//! let mut outputs = OutputController::new(motor, buzzer, Lcd(Vec::new()));
//!
//! outputs.set_motor(false);
//! outputs.set_buzzer(true);
//! assert_eq!(probe.state(), OutputState::ALARM);
//! ```

pub mod error;
pub mod interrupt;
pub mod keypad;
pub mod mock;
pub mod outputs;
pub mod traits;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use interrupt::InterruptFlag;
pub use keypad::MatrixKeypad;
pub use outputs::OutputController;
pub use traits::{Delay, InputLine, KeypadDevice, OutputLine, TextDisplay, TokioDelay};
