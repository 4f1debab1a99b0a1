//! OS input capabilities consumed by the engine.
//!
//! Everything platform-specific sits behind [`InputBackend`]: polling key
//! state, translating characters to virtual keys, submitting key events and
//! adjusting the system timer resolution.

use std::sync::Arc;

use crate::error::Result;
use crate::keys::{KeyEvent, KeyMapping};

pub mod simulated;
#[cfg(windows)]
pub mod windows;

pub use simulated::{Activity, SimulatedBackend};

/// Capabilities the engine and watchdog need from the host.
pub trait InputBackend: Send + Sync {
    /// Non-blocking check of the current physical state of `virtual_key`.
    fn is_key_pressed(&self, virtual_key: u8) -> bool;

    /// Translates a character using the active keyboard layout. Characters
    /// the layout cannot produce map to [`KeyMapping::UNMAPPED`].
    fn map_char(&self, ch: char) -> KeyMapping;

    /// Submits one batch of events to the input stream as a single call.
    fn inject(&self, events: &[KeyEvent]) -> Result<()>;

    /// Asks the OS for its finest timer resolution. Returns `false` when the
    /// request could not be made.
    fn request_high_res_timer(&self) -> bool;

    /// Drops a request made with [`InputBackend::request_high_res_timer`].
    fn release_high_res_timer(&self) -> bool;
}

pub type SharedBackend = Arc<dyn InputBackend>;

/// Returns the backend for the current platform.
#[cfg(windows)]
pub fn platform_backend() -> Result<SharedBackend> {
    Ok(Arc::new(windows::WindowsBackend::new()))
}

/// Returns the backend for the current platform.
#[cfg(not(windows))]
pub fn platform_backend() -> Result<SharedBackend> {
    Err(crate::error::MksError::unsupported_platform(
        "key injection is only implemented for Windows (try --dry-run)",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(windows))]
    fn test_platform_backend_unsupported() {
        let err = platform_backend().err().unwrap();
        assert!(err.to_string().contains("--dry-run"));
    }

    #[test]
    #[cfg(windows)]
    fn test_platform_backend_available() {
        assert!(platform_backend().is_ok());
    }
}
