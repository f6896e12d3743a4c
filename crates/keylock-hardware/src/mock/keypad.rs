//! Mock keypad implementation for testing and development.
//!
//! This module provides a simulated keypad that reports scripted key events.
//! Each queued event is reported by exactly one scan pass; a pass with nothing
//! queued takes the configured pass duration and reports no key, like an idle
//! matrix scan.

use std::time::Duration;

use keylock_core::{
    KeyEvent,
    constants::{KEY_SETTLE_MS, KEYPAD_COLUMNS},
};
use tokio::sync::mpsc;

use crate::{Result, traits::KeypadDevice};

/// Mock keypad device for testing and development.
///
/// Tests and applications send key events through a [`MockKeypadHandle`].
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
///
///     tokio::spawn(async move {
///         handle.send_digits(&[3, 2]).await.unwrap();
///     });
///
///     assert_eq!(keypad.wait_for_key().await, KeyEvent::Digit(3));
///     assert_eq!(keypad.wait_for_key().await, KeyEvent::Digit(2));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockKeypad {
    /// Channel receiver for simulated key presses
    input_rx: mpsc::Receiver<KeyEvent>,

    /// Duration of an idle scan pass
    pass_duration: Duration,
}

impl MockKeypad {
    /// Create a mock keypad whose idle pass matches a 4-column scan with the
    /// default settle delay.
    pub fn new() -> (Self, MockKeypadHandle) {
        Self::with_pass_duration(Duration::from_millis(KEY_SETTLE_MS) * KEYPAD_COLUMNS as u32)
    }

    /// Create a mock keypad with a custom idle pass duration.
    pub fn with_pass_duration(pass_duration: Duration) -> (Self, MockKeypadHandle) {
        let (input_tx, input_rx) = mpsc::channel(32);
        let keypad = Self {
            input_rx,
            pass_duration,
        };
        (keypad, MockKeypadHandle { input_tx })
    }

    /// Poll until a key is reported.
    pub async fn wait_for_key(&mut self) -> KeyEvent {
        loop {
            if let Some(key) = self.poll_keypad().await {
                return key;
            }
        }
    }
}

impl KeypadDevice for MockKeypad {
    async fn poll_keypad(&mut self) -> Option<KeyEvent> {
        match tokio::time::timeout(self.pass_duration, self.input_rx.recv()).await {
            Ok(Some(key)) => Some(key),
            Ok(None) => {
                // Every handle dropped: behave like a keypad nobody touches.
                tokio::time::sleep(self.pass_duration).await;
                None
            }
            Err(_) => None,
        }
    }
}

/// Handle for controlling a mock keypad.
///
/// It can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockKeypadHandle {
    /// Channel sender for simulated key presses
    input_tx: mpsc::Sender<KeyEvent>,
}

impl MockKeypadHandle {
    /// Queue one key event.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad has been dropped and the channel is closed.
    pub async fn send_key(&self, key: KeyEvent) -> Result<()> {
        self.input_tx
            .send(key)
            .await
            .map_err(|_| crate::HardwareError::disconnected("Keypad input channel closed"))
    }

    /// Queue a sequence of digit keys.
    ///
    /// # Errors
    ///
    /// Returns an error if any digit is greater than 9 or the keypad has been
    /// dropped.
    pub async fn send_digits(&self, digits: &[u8]) -> Result<()> {
        for &digit in digits {
            self.send_key(KeyEvent::digit(digit)?).await?;
        }
        Ok(())
    }

    /// Queue keypad symbols, e.g. `"32#"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad has been dropped.
    pub async fn send_symbols(&self, symbols: &str) -> Result<()> {
        for symbol in symbols.chars() {
            self.send_key(KeyEvent::from_symbol(symbol)).await?;
        }
        Ok(())
    }
}
