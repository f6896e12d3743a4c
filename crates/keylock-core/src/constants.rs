//! Compiled-in constants for the keypad access controller.
//!
//! Every timing value, the secret code, the keypad layout and the LCD
//! messages live here. The controller has no runtime configuration source:
//! [`AccessConfig::default`](crate::AccessConfig) is built from these values
//! and the secret can only change by rebuilding the firmware.
//!
//! # Usage
//!
//! ```
//! use keylock_core::constants::*;
//! use std::time::Duration;
//!
//! assert!(SECRET_CODE <= MAX_SECRET_CODE);
//! let hold = Duration::from_millis(EMERGENCY_HOLD_MS);
//! assert_eq!(hold.as_secs(), 10);
//! ```

// ============================================================================
// Credential
// ============================================================================

/// Two-digit secret code accepted by the controller.
pub const SECRET_CODE: u8 = 32;

/// Highest value a two-digit code can take.
pub const MAX_SECRET_CODE: u8 = 99;

/// Number of digits collected per access attempt.
pub const CODE_DIGITS: usize = 2;

// ============================================================================
// Timing (milliseconds)
// ============================================================================

/// Settle time after driving a keypad column before sampling the rows.
pub const KEY_SETTLE_MS: u64 = 5;

/// Pause after echoing an entered digit.
///
/// This is also the only protection against a held key being read twice.
pub const DIGIT_PACING_MS: u64 = 300;

/// Masked window in which the motor-on decision is committed.
pub const SUCCESS_HOLD_MS: u64 = 100;

/// How long the buzzer sounds after a wrong code.
pub const FAILURE_HOLD_MS: u64 = 10_000;

/// Pause after any attempt before the prompt is shown again.
pub const RESULT_DISPLAY_MS: u64 = 1_000;

/// Delay before the emergency line level is re-checked after an edge.
pub const EMERGENCY_DEBOUNCE_MS: u64 = 50;

/// How long the buzzer sounds after a confirmed emergency stop.
pub const EMERGENCY_HOLD_MS: u64 = 10_000;

// ============================================================================
// Keypad
// ============================================================================

/// Number of keypad rows (sampled lines).
pub const KEYPAD_ROWS: usize = 4;

/// Number of keypad columns (driven lines).
pub const KEYPAD_COLUMNS: usize = 4;

/// Symbol layout of the 4x4 membrane keypad, indexed `[row][column]`.
///
/// ```
/// use keylock_core::constants::KEYPAD_LAYOUT;
///
/// assert_eq!(KEYPAD_LAYOUT[3][1], '0');
/// assert_eq!(KEYPAD_LAYOUT[0][3], 'A');
/// ```
pub const KEYPAD_LAYOUT: [[char; KEYPAD_COLUMNS]; KEYPAD_ROWS] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['*', '0', '#', 'D'],
];

/// Symbol reported as [`KeyEvent::Accept`](crate::KeyEvent::Accept).
pub const ACCEPT_SYMBOL: char = '#';

// ============================================================================
// Display
// ============================================================================

/// Number of LCD lines.
pub const LCD_LINES: usize = 2;

/// Number of LCD characters per line.
pub const LCD_COLUMNS: usize = 16;

/// Line used to echo entered digits.
pub const ECHO_LINE: usize = 1;

/// Idle prompt.
pub const MSG_PROMPT: &str = "Press Key:";

/// Shown while the motor-on decision is committed.
pub const MSG_GRANTED: &str = "motor";

/// Shown while the failure buzzer sounds.
pub const MSG_DENIED: &str = "Wrong Code";

/// Shown when a non-digit key is entered where a digit is expected.
pub const MSG_DIGITS_ONLY: &str = "Digits Only";
