use crate::{
    Result,
    constants::{
        ACCEPT_SYMBOL, KEYPAD_COLUMNS, KEYPAD_LAYOUT, KEYPAD_ROWS, MAX_SECRET_CODE, SECRET_CODE,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Logical key reported by a keypad scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyEvent {
    /// Numeric key 0-9.
    Digit(u8),

    /// Confirmation key.
    Accept,

    /// Any other symbol on the keypad (letters, `*`).
    Unused(char),
}

impl KeyEvent {
    /// Create a digit event.
    ///
    /// # Errors
    /// Returns `Error::InvalidDigit` if `d` is greater than 9.
    pub fn digit(d: u8) -> Result<Self> {
        if d > 9 {
            return Err(Error::InvalidDigit(d));
        }
        Ok(Self::Digit(d))
    }

    /// Classify a keypad symbol.
    ///
    /// ```
    /// use keylock_core::KeyEvent;
    ///
    /// assert_eq!(KeyEvent::from_symbol('7'), KeyEvent::Digit(7));
    /// assert_eq!(KeyEvent::from_symbol('#'), KeyEvent::Accept);
    /// assert_eq!(KeyEvent::from_symbol('B'), KeyEvent::Unused('B'));
    /// ```
    #[must_use]
    pub fn from_symbol(symbol: char) -> Self {
        match symbol {
            '0'..='9' => Self::Digit(symbol as u8 - b'0'),
            ACCEPT_SYMBOL => Self::Accept,
            other => Self::Unused(other),
        }
    }

    /// The printable keypad symbol for this event.
    ///
    /// A `Digit` built directly with a value above 9 prints as `?`.
    #[must_use]
    pub fn symbol(&self) -> char {
        match self {
            Self::Digit(d) => char::from_digit(u32::from(*d), 10).unwrap_or('?'),
            Self::Accept => ACCEPT_SYMBOL,
            Self::Unused(c) => *c,
        }
    }

    /// Get the digit value if this is a digit key.
    #[must_use]
    pub fn as_digit(&self) -> Option<u8> {
        match self {
            Self::Digit(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Fixed lookup table from matrix position to keypad symbol.
///
/// Indexed `[row][column]`. Symbols must be unique so that a symbol maps back
/// to exactly one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keymap([[char; KEYPAD_COLUMNS]; KEYPAD_ROWS]);

impl Keymap {
    /// Create a keymap from a symbol table.
    ///
    /// # Errors
    /// Returns `Error::InvalidKeymap` if a symbol appears more than once.
    pub fn new(layout: [[char; KEYPAD_COLUMNS]; KEYPAD_ROWS]) -> Result<Self> {
        let symbols: Vec<char> = layout.iter().flatten().copied().collect();
        for (i, symbol) in symbols.iter().enumerate() {
            if symbols[i + 1..].contains(symbol) {
                return Err(Error::InvalidKeymap(format!(
                    "symbol '{symbol}' appears more than once"
                )));
            }
        }
        Ok(Self(layout))
    }

    /// Event produced by the key at `(row, column)`, if the position exists.
    #[must_use]
    pub fn event_at(&self, row: usize, column: usize) -> Option<KeyEvent> {
        self.0
            .get(row)
            .and_then(|r| r.get(column))
            .map(|&symbol| KeyEvent::from_symbol(symbol))
    }

    /// Matrix position of a symbol.
    ///
    /// ```
    /// use keylock_core::Keymap;
    ///
    /// assert_eq!(Keymap::default().position_of('0'), Some((3, 1)));
    /// assert_eq!(Keymap::default().position_of('x'), None);
    /// ```
    #[must_use]
    pub fn position_of(&self, symbol: char) -> Option<(usize, usize)> {
        self.0.iter().enumerate().find_map(|(row, columns)| {
            columns
                .iter()
                .position(|&c| c == symbol)
                .map(|column| (row, column))
        })
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self(KEYPAD_LAYOUT)
    }
}

/// Two-digit secret code (0-99).
///
/// # Security
/// Comparison is constant-time and `Debug` never prints the value.
#[derive(Clone, Copy, Eq)]
pub struct SecretCode(u8);

impl SecretCode {
    /// Create a secret code with range validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidSecret` if the code is greater than 99.
    pub fn new(code: u8) -> Result<Self> {
        if code > MAX_SECRET_CODE {
            return Err(Error::InvalidSecret(code));
        }
        Ok(Self(code))
    }

    /// Check an entered value against the secret.
    ///
    /// ```
    /// use keylock_core::SecretCode;
    ///
    /// let secret = SecretCode::new(32).unwrap();
    /// assert!(secret.matches(32));
    /// assert!(!secret.matches(23));
    /// ```
    #[must_use]
    pub fn matches(&self, entered: u8) -> bool {
        self.0.ct_eq(&entered).into()
    }
}

impl Default for SecretCode {
    fn default() -> Self {
        Self(SECRET_CODE)
    }
}

impl PartialEq for SecretCode {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other.0)
    }
}

impl fmt::Debug for SecretCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("SecretCode(**)")
    }
}

/// Digits collected during one access attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessAttempt {
    first_digit: Option<u8>,
    second_digit: Option<u8>,
}

impl AccessAttempt {
    /// Create an empty attempt.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the next digit.
    ///
    /// # Errors
    /// Returns `Error::InvalidDigit` for values above 9 and
    /// `Error::IncompleteAttempt` if both digits are already stored.
    pub fn push_digit(&mut self, digit: u8) -> Result<()> {
        if digit > 9 {
            return Err(Error::InvalidDigit(digit));
        }
        match (self.first_digit, self.second_digit) {
            (None, _) => self.first_digit = Some(digit),
            (Some(_), None) => self.second_digit = Some(digit),
            (Some(_), Some(_)) => {
                return Err(Error::IncompleteAttempt(
                    "both digits already entered".to_string(),
                ));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn first_digit(&self) -> Option<u8> {
        self.first_digit
    }

    #[must_use]
    pub fn second_digit(&self) -> Option<u8> {
        self.second_digit
    }

    /// Returns `true` once both digits are stored.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.second_digit.is_some()
    }

    /// The entered two-digit value, if the attempt is complete.
    ///
    /// ```
    /// use keylock_core::AccessAttempt;
    ///
    /// let mut attempt = AccessAttempt::new();
    /// attempt.push_digit(3).unwrap();
    /// assert_eq!(attempt.entered(), None);
    /// attempt.push_digit(2).unwrap();
    /// assert_eq!(attempt.entered(), Some(32));
    /// ```
    #[must_use]
    pub fn entered(&self) -> Option<u8> {
        match (self.first_digit, self.second_digit) {
            (Some(first), Some(second)) => Some(first * 10 + second),
            _ => None,
        }
    }

    /// Discard both digits.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Snapshot of the two actuators.
///
/// Motor-run and alarm are mutually exclusive modes; a snapshot with both
/// set is inconsistent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputState {
    pub motor: bool,
    pub buzzer: bool,
}

impl OutputState {
    /// Both actuators off.
    pub const IDLE: Self = Self {
        motor: false,
        buzzer: false,
    };

    /// Emergency/alarm state: motor off, buzzer on.
    pub const ALARM: Self = Self {
        motor: false,
        buzzer: true,
    };

    /// Motor running, buzzer off.
    pub const RUNNING: Self = Self {
        motor: true,
        buzzer: false,
    };

    /// Returns `false` if motor and buzzer are both on.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        !(self.motor && self.buzzer)
    }
}

impl fmt::Display for OutputState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let level = |on: bool| if on { "on" } else { "off" };
        let (motor, buzzer) = (level(self.motor), level(self.buzzer));
        write!(f, "motor={motor} buzzer={buzzer}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(KeyEvent::Digit(0), "0")]
    #[case(KeyEvent::Digit(9), "9")]
    #[case(KeyEvent::Digit(12), "?")]
    #[case(KeyEvent::Digit(250), "?")]
    #[case(KeyEvent::Accept, "#")]
    #[case(KeyEvent::Unused('C'), "C")]
    fn test_key_event_display(#[case] key: KeyEvent, #[case] expected: &str) {
        assert_eq!(key.to_string(), expected);
    }

    #[rstest]
    #[case('0', KeyEvent::Digit(0))]
    #[case('9', KeyEvent::Digit(9))]
    #[case('#', KeyEvent::Accept)]
    #[case('*', KeyEvent::Unused('*'))]
    #[case('D', KeyEvent::Unused('D'))]
    fn test_key_event_from_symbol(#[case] symbol: char, #[case] expected: KeyEvent) {
        let event = KeyEvent::from_symbol(symbol);
        assert_eq!(event, expected);
        assert_eq!(event.symbol(), symbol);
    }

    #[test]
    fn test_key_event_digit_validation() {
        assert_eq!(KeyEvent::digit(4).unwrap().as_digit(), Some(4));
        assert_eq!(KeyEvent::digit(10), Err(Error::InvalidDigit(10)));
        assert_eq!(KeyEvent::Accept.as_digit(), None);
    }

    #[test]
    fn test_default_keymap_positions() {
        let keymap = Keymap::default();
        assert_eq!(keymap.event_at(0, 0), Some(KeyEvent::Digit(1)));
        assert_eq!(keymap.event_at(3, 2), Some(KeyEvent::Accept));
        assert_eq!(keymap.event_at(3, 3), Some(KeyEvent::Unused('D')));
        assert_eq!(keymap.event_at(4, 0), None);
        assert_eq!(keymap.position_of('#'), Some((3, 2)));
    }

    #[test]
    fn test_keymap_rejects_duplicates() {
        let mut layout = KEYPAD_LAYOUT;
        layout[2][3] = '1';
        assert!(matches!(Keymap::new(layout), Err(Error::InvalidKeymap(_))));
        assert!(Keymap::new(KEYPAD_LAYOUT).is_ok());
    }

    #[rstest]
    #[case(0)]
    #[case(32)]
    #[case(99)]
    fn test_secret_code_valid(#[case] code: u8) {
        let secret = SecretCode::new(code).unwrap();
        assert!(secret.matches(code));
    }

    #[test]
    fn test_secret_code_out_of_range() {
        assert_eq!(SecretCode::new(100), Err(Error::InvalidSecret(100)));
    }

    #[test]
    fn test_secret_code_debug_is_redacted() {
        let secret = SecretCode::new(32).unwrap();
        assert_eq!(format!("{secret:?}"), "SecretCode(**)");
    }

    #[test]
    fn test_access_attempt_lifecycle() {
        let mut attempt = AccessAttempt::new();
        assert!(!attempt.is_complete());

        attempt.push_digit(0).unwrap();
        attempt.push_digit(7).unwrap();
        assert!(attempt.is_complete());
        assert_eq!(attempt.entered(), Some(7));
        assert!(attempt.push_digit(1).is_err());

        attempt.clear();
        assert_eq!(attempt.first_digit(), None);
        assert_eq!(attempt.second_digit(), None);
    }

    #[test]
    fn test_access_attempt_rejects_non_digit_values() {
        let mut attempt = AccessAttempt::new();
        assert_eq!(attempt.push_digit(12), Err(Error::InvalidDigit(12)));
        assert_eq!(attempt, AccessAttempt::new());
    }

    #[test]
    fn test_output_state_consistency() {
        assert!(OutputState::IDLE.is_consistent());
        assert!(OutputState::ALARM.is_consistent());
        assert!(OutputState::RUNNING.is_consistent());
        assert!(
            !OutputState {
                motor: true,
                buzzer: true
            }
            .is_consistent()
        );
        assert_eq!(OutputState::ALARM.to_string(), "motor=off buzzer=on");
    }
}
