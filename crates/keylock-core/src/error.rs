use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Credential errors
    #[error("Secret code must be 0-99, got {0}")]
    InvalidSecret(u8),

    #[error("Digit must be 0-9, got {0}")]
    InvalidDigit(u8),

    // Keypad errors
    #[error("Invalid keymap: {0}")]
    InvalidKeymap(String),

    // Display errors
    #[error("Invalid display line {line}, maximum is {max}")]
    InvalidLine { line: usize, max: usize },

    // Timing errors
    #[error("Duration for {0} must be greater than zero")]
    InvalidDuration(&'static str),

    // State machine errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Incomplete access attempt: {0}")]
    IncompleteAttempt(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
