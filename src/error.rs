//! Custom error types for message-key-sender.
//!
//! This module provides structured error types using `thiserror` for better
//! error handling and more informative error messages.

use std::io;
use thiserror::Error;

/// Main error type for message-key-sender operations.
#[derive(Error, Debug)]
pub enum MksError {
    /// Error parsing duration string.
    #[error("invalid duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    /// A menu answer could not be understood.
    #[error("invalid input '{input}': {reason}")]
    InvalidInput { input: String, reason: String },

    /// Platform-specific operation is not supported.
    #[error("operation not supported on this platform: {0}")]
    UnsupportedPlatform(String),

    /// The OS rejected a batch of synthetic key events.
    #[error("failed to inject {count} key event(s): {reason}")]
    InjectionFailed { count: usize, reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for message-key-sender operations.
pub type Result<T> = std::result::Result<T, MksError>;

impl MksError {
    /// Create a new InvalidDuration error.
    pub fn invalid_duration(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDuration {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a new UnsupportedPlatform error.
    pub fn unsupported_platform(message: impl Into<String>) -> Self {
        Self::UnsupportedPlatform(message.into())
    }

    /// Create a new InjectionFailed error.
    pub fn injection_failed(count: usize, reason: impl Into<String>) -> Self {
        Self::InjectionFailed {
            count,
            reason: reason.into(),
        }
    }
}
