//! Hardware collaborator trait definitions.
//!
//! These traits are the contract between the access controller and the board:
//! digital lines, the character display, the delay primitive and the keypad.
//! Line and display operations are synchronous and infallible, matching GPIO
//! and LCD latch writes on the target. Waiting is asynchronous so that a delay
//! is a suspension point the emergency handler can preempt.
//!
//! Async methods are declared as `-> impl Future + Send` so that generic
//! controllers can be moved onto a Tokio task. Implementors may still write
//! them as `async fn`.

use std::future::Future;
use std::time::Duration;

use keylock_core::KeyEvent;

/// A digital input line, sampled at its logical level.
///
/// `true` means asserted. Electrical polarity (pull-ups, active-low wiring)
/// belongs to the implementation.
pub trait InputLine: Send {
    /// Sample the current level.
    fn read(&self) -> bool;
}

/// A digital output line.
///
/// Writes are direct assignments: writing the same level twice is harmless.
pub trait OutputLine: Send {
    /// Drive the line to the given logical level.
    fn write(&mut self, level: bool);
}

/// Character display.
///
/// Fire-and-forget: no acknowledgement, no error reporting.
pub trait TextDisplay: Send {
    /// Blank the whole display.
    fn clear(&mut self);

    /// Write `text` starting at `(row, column)`.
    fn write_text(&mut self, row: usize, column: usize, text: &str);
}

/// Duration-based suspension.
pub trait Delay: Send + Sync {
    /// Suspend the caller for `duration`.
    fn delay(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Source of discrete key events.
///
/// # Examples
///
/// ```
/// use keylock_core::KeyEvent;
/// use keylock_hardware::mock::MockKeypad;
/// use keylock_hardware::traits::KeypadDevice;
///
/// #[tokio::main]
/// async fn main() -> keylock_hardware::Result<()> {
///     let (mut keypad, handle) = MockKeypad::new();
///     handle.send_symbols("3#").await?;
///
///     assert_eq!(keypad.poll_keypad().await, Some(KeyEvent::Digit(3)));
///     assert_eq!(keypad.poll_keypad().await, Some(KeyEvent::Accept));
///     Ok(())
/// }
/// ```
pub trait KeypadDevice: Send {
    /// Run one scan pass.
    ///
    /// Returns `None` if no key was pressed during the pass.
    fn poll_keypad(&mut self) -> impl Future<Output = Option<KeyEvent>> + Send;
}

/// [`Delay`] backed by the Tokio timer.
///
/// Under `tokio::time::pause` the delay advances with the virtual clock,
/// which is what makes hold durations testable.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

impl Delay for TokioDelay {
    async fn delay(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
