//! Error types for hardware operations.
//!
//! Line reads and writes are infallible on the target, so these errors only
//! come from keypad symbol lookups and from simulated peripherals whose
//! control handle has gone away.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Invalid data supplied to or received from a device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Domain validation error.
    #[error(transparent)]
    Core(#[from] keylock_core::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }
}
