//! Runtime configuration shared between the menu and the engine.
//!
//! The configuration lives in memory only. The menu mutates it between bursts
//! and the engine takes a [`SharedConfig::snapshot`] each time the start
//! hotkey fires, so a burst never observes a half-applied change.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use crate::error::{MksError, Result};

/// What to type and how fast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Text typed on every repetition, unless `randomize` is set.
    pub message: String,
    /// Type random printable characters instead of `message`.
    pub randomize: bool,
    /// Pause after each Enter.
    pub message_delay: Duration,
    /// Pause after each character.
    pub key_delay: Duration,
    /// Messages typed per press of the start hotkey.
    pub repetitions: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            message: "Hello, world!".to_string(),
            randomize: false,
            message_delay: Duration::from_millis(100),
            key_delay: Duration::from_millis(20),
            repetitions: 2,
        }
    }
}

/// Handle to the process-wide configuration. Clones share the same record;
/// the last writer wins.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<Config>>,
}

impl SharedConfig {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Config> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Config> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Consistent copy of every field.
    pub fn snapshot(&self) -> Config {
        self.read().clone()
    }

    pub fn message(&self) -> String {
        self.read().message.clone()
    }

    /// Sets the message and turns randomization off.
    pub fn set_message(&self, message: impl Into<String>) {
        let mut config = self.write();
        config.message = message.into();
        config.randomize = false;
    }

    pub fn randomize(&self) -> bool {
        self.read().randomize
    }

    pub fn set_randomize(&self, randomize: bool) {
        self.write().randomize = randomize;
    }

    /// Flips the randomize flag and returns the new value.
    pub fn toggle_randomize(&self) -> bool {
        let mut config = self.write();
        config.randomize = !config.randomize;
        config.randomize
    }

    pub fn message_delay(&self) -> Duration {
        self.read().message_delay
    }

    pub fn set_message_delay(&self, delay: Duration) {
        self.write().message_delay = delay;
    }

    pub fn key_delay(&self) -> Duration {
        self.read().key_delay
    }

    pub fn set_key_delay(&self, delay: Duration) {
        self.write().key_delay = delay;
    }

    pub fn repetitions(&self) -> u32 {
        self.read().repetitions
    }

    pub fn set_repetitions(&self, repetitions: u32) {
        self.write().repetitions = repetitions;
    }
}

/// Parses a human duration: `250`, `250ms`, `1s`, `2m`. A bare number is
/// milliseconds. Case and surrounding whitespace are ignored.
pub fn parse_duration(value: &str) -> Result<Duration> {
    let trimmed = value.trim().to_lowercase();
    if trimmed.is_empty() {
        return Err(MksError::invalid_duration(value, "empty value"));
    }

    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    if number.is_empty() {
        return Err(MksError::invalid_duration(value, "expected a number"));
    }
    let amount: u64 = number
        .parse()
        .map_err(|e| MksError::invalid_duration(value, format!("{e}")))?;

    let duration = match unit.trim() {
        "" | "ms" => Duration::from_millis(amount),
        "s" => Duration::from_secs(amount),
        "m" => Duration::from_secs(amount.saturating_mul(60)),
        other => {
            return Err(MksError::invalid_duration(
                value,
                format!("unknown unit '{other}' (use ms, s or m)"),
            ))
        }
    };

    Ok(duration)
}

/// Formats a duration the way [`parse_duration`] reads it back.
pub fn format_duration(duration: Duration) -> String {
    format!("{}ms", duration.as_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.message, "Hello, world!");
        assert!(!config.randomize);
        assert_eq!(config.message_delay, Duration::from_millis(100));
        assert_eq!(config.key_delay, Duration::from_millis(20));
        assert_eq!(config.repetitions, 2);
    }

    #[test]
    fn test_set_message_clears_randomize() {
        let shared = SharedConfig::default();
        shared.set_randomize(true);
        shared.set_message("abc");
        assert_eq!(shared.message(), "abc");
        assert!(!shared.randomize());
    }

    #[test]
    fn test_toggle_randomize() {
        let shared = SharedConfig::default();
        assert!(shared.toggle_randomize());
        assert!(!shared.toggle_randomize());
    }

    #[test]
    fn test_clones_share_state() {
        let shared = SharedConfig::default();
        let other = shared.clone();
        other.set_repetitions(0);
        other.set_key_delay(Duration::ZERO);
        assert_eq!(shared.repetitions(), 0);
        assert_eq!(shared.snapshot().key_delay, Duration::ZERO);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("0ms").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("250").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("5S").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration(" 2m ").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("15 ms").unwrap(), Duration::from_millis(15));
    }

    #[test]
    fn test_parse_duration_errors() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("1000x").is_err());
        assert!(parse_duration("-1000ms").is_err());
        assert!(parse_duration("1.5s").is_err());
    }

    #[test]
    fn test_format_duration_round_trips() {
        let delay = Duration::from_millis(40);
        assert_eq!(parse_duration(&format_duration(delay)).unwrap(), delay);
    }
}
