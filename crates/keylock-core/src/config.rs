//! Controller configuration.
//!
//! [`AccessConfig::default`] reproduces the compiled-in firmware values from
//! [`constants`](crate::constants). The builder exists for simulations and
//! tests that need a different secret or different hold times; the secret is
//! never read from or written to serialized configuration.
//!
//! # Examples
//!
//! ```
//! use keylock_core::{AccessConfig, EntryMode};
//! use std::time::Duration;
//!
//! let config = AccessConfig::builder()
//!     .secret(47)
//!     .entry_mode(EntryMode::Confirm)
//!     .failure_hold(Duration::from_secs(2))
//!     .build()
//!     .unwrap();
//!
//! assert!(config.secret.matches(47));
//! assert_eq!(config.timing.failure_hold, Duration::from_secs(2));
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    constants::{
        ACCEPT_SYMBOL, DIGIT_PACING_MS, EMERGENCY_DEBOUNCE_MS, EMERGENCY_HOLD_MS, FAILURE_HOLD_MS,
        KEY_SETTLE_MS, RESULT_DISPLAY_MS, SUCCESS_HOLD_MS,
    },
    error::Error,
    types::{Keymap, SecretCode},
};

/// When a complete two-digit code is evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryMode {
    /// Evaluate as soon as the second digit is entered.
    #[default]
    Immediate,

    /// Wait for the accept key after the second digit.
    Confirm,
}

/// Fixed delays used by the foreground loop and the emergency handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Settle time per driven keypad column.
    pub key_settle: Duration,

    /// Pause after each echoed digit.
    pub digit_pacing: Duration,

    /// Masked motor-on commit window.
    pub success_hold: Duration,

    /// Buzzer duration after a wrong code.
    pub failure_hold: Duration,

    /// Pause after an attempt before the prompt returns.
    pub result_display: Duration,

    /// Emergency line re-check delay.
    pub emergency_debounce: Duration,

    /// Buzzer duration after a confirmed emergency.
    pub emergency_hold: Duration,
}

impl TimingConfig {
    /// Check that every interval that gates an actuator is non-zero.
    ///
    /// # Errors
    /// Returns `Error::InvalidDuration` naming the first zero interval.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.key_settle, "key settle"),
            (self.success_hold, "success hold"),
            (self.failure_hold, "failure hold"),
            (self.emergency_debounce, "emergency debounce"),
            (self.emergency_hold, "emergency hold"),
        ];
        match checks.iter().find(|(duration, _)| duration.is_zero()) {
            Some((_, name)) => Err(Error::InvalidDuration(name)),
            None => Ok(()),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            key_settle: Duration::from_millis(KEY_SETTLE_MS),
            digit_pacing: Duration::from_millis(DIGIT_PACING_MS),
            success_hold: Duration::from_millis(SUCCESS_HOLD_MS),
            failure_hold: Duration::from_millis(FAILURE_HOLD_MS),
            result_display: Duration::from_millis(RESULT_DISPLAY_MS),
            emergency_debounce: Duration::from_millis(EMERGENCY_DEBOUNCE_MS),
            emergency_hold: Duration::from_millis(EMERGENCY_HOLD_MS),
        }
    }
}

/// Complete controller configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Secret code. Skipped by serde so it always comes from the build.
    #[serde(skip)]
    pub secret: SecretCode,

    /// When the entered code is evaluated.
    pub entry_mode: EntryMode,

    /// Keypad symbol layout.
    #[serde(skip)]
    pub keymap: Keymap,

    /// Fixed delays.
    pub timing: TimingConfig,
}

impl AccessConfig {
    /// Create a builder starting from the compiled-in defaults.
    pub fn builder() -> AccessConfigBuilder {
        AccessConfigBuilder::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns an error if any gating interval is zero, if the keymap cannot
    /// produce every digit, or if confirm mode has no accept key to press.
    pub fn validate(&self) -> Result<()> {
        self.timing.validate()?;

        if let Some(digit) = (0..=9u8)
            .filter_map(|d| char::from_digit(u32::from(d), 10))
            .find(|&symbol| self.keymap.position_of(symbol).is_none())
        {
            return Err(Error::Config(format!("keymap has no '{digit}' key")));
        }
        if self.entry_mode == EntryMode::Confirm
            && self.keymap.position_of(ACCEPT_SYMBOL).is_none()
        {
            return Err(Error::Config(format!(
                "confirm entry mode needs a '{ACCEPT_SYMBOL}' key"
            )));
        }
        Ok(())
    }
}

/// Builder for [`AccessConfig`].
#[derive(Debug, Default)]
pub struct AccessConfigBuilder {
    secret: Option<u8>,
    entry_mode: EntryMode,
    keymap: Keymap,
    timing: TimingConfig,
}

impl AccessConfigBuilder {
    pub fn secret(mut self, code: u8) -> Self {
        self.secret = Some(code);
        self
    }

    pub fn entry_mode(mut self, mode: EntryMode) -> Self {
        self.entry_mode = mode;
        self
    }

    pub fn keymap(mut self, keymap: Keymap) -> Self {
        self.keymap = keymap;
        self
    }

    pub fn timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    pub fn success_hold(mut self, duration: Duration) -> Self {
        self.timing.success_hold = duration;
        self
    }

    pub fn failure_hold(mut self, duration: Duration) -> Self {
        self.timing.failure_hold = duration;
        self
    }

    pub fn emergency_debounce(mut self, duration: Duration) -> Self {
        self.timing.emergency_debounce = duration;
        self
    }

    pub fn emergency_hold(mut self, duration: Duration) -> Self {
        self.timing.emergency_hold = duration;
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    /// Returns `Error::InvalidSecret` for a secret above 99 or
    /// `Error::InvalidDuration` for a zero gating interval.
    pub fn build(self) -> Result<AccessConfig> {
        let secret = match self.secret {
            Some(code) => SecretCode::new(code)?,
            None => SecretCode::default(),
        };
        let config = AccessConfig {
            secret,
            entry_mode: self.entry_mode,
            keymap: self.keymap,
            timing: self.timing,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SECRET_CODE;

    #[test]
    fn test_default_matches_firmware_constants() {
        let config = AccessConfig::default();
        assert!(config.secret.matches(SECRET_CODE));
        assert_eq!(config.entry_mode, EntryMode::Immediate);
        assert_eq!(config.timing.success_hold, Duration::from_millis(100));
        assert_eq!(config.timing.failure_hold, Duration::from_secs(10));
        assert_eq!(config.timing.emergency_debounce, Duration::from_millis(50));
        assert_eq!(config.timing.emergency_hold, Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_rejects_out_of_range_secret() {
        let result = AccessConfig::builder().secret(150).build();
        assert_eq!(result, Err(Error::InvalidSecret(150)));
    }

    #[test]
    fn test_builder_rejects_zero_hold() {
        let result = AccessConfig::builder()
            .emergency_hold(Duration::ZERO)
            .build();
        assert_eq!(result, Err(Error::InvalidDuration("emergency hold")));
    }

    #[test]
    fn test_keymap_without_digit_is_rejected() {
        let keymap = Keymap::new([
            ['1', '2', '3', 'A'],
            ['4', '5', '6', 'B'],
            ['7', '8', 'X', 'C'],
            ['*', '0', '#', 'D'],
        ])
        .unwrap();
        let result = AccessConfig::builder().keymap(keymap).build();
        assert_eq!(result, Err(Error::Config("keymap has no '9' key".into())));
    }

    #[test]
    fn test_confirm_mode_needs_accept_key() {
        let keymap = Keymap::new([
            ['1', '2', '3', 'A'],
            ['4', '5', '6', 'B'],
            ['7', '8', '9', 'C'],
            ['*', '0', 'E', 'D'],
        ])
        .unwrap();
        let immediate = AccessConfig::builder().keymap(keymap).build();
        assert!(immediate.is_ok());

        let confirm = AccessConfig::builder()
            .keymap(keymap)
            .entry_mode(EntryMode::Confirm)
            .build();
        assert!(matches!(confirm, Err(Error::Config(_))));
    }

    #[test]
    fn test_serialized_config_omits_secret() {
        let config = AccessConfig::builder().secret(7).build().unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"entry_mode\":\"immediate\""));

        let restored: AccessConfig = serde_json::from_str(&json).unwrap();
        assert!(restored.secret.matches(SECRET_CODE));
        assert_eq!(restored.timing, config.timing);
    }
}
