//! In-memory backend with a US-QWERTY layout.
//!
//! Key state is set by hand and every injected batch is recorded, which makes
//! it the backend of choice for tests. [`SimulatedBackend::dry_run`] holds the
//! start hotkey down and logs what would have been typed instead.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use super::InputBackend;
use crate::error::{MksError, Result};
use crate::keys::{us_layout, vk, KeyEvent, KeyMapping};

/// One entry of the simulated backend's timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activity {
    Injected(Vec<KeyEvent>),
    TimerRequested,
    TimerReleased,
}

#[derive(Debug, Default)]
struct State {
    pressed: HashSet<u8>,
    activity: Vec<Activity>,
    timer_available: bool,
    fail_injection: bool,
    /// Dry-run text typed since the last Enter.
    line: String,
}

impl State {
    /// Buffers a decoded batch; returns the finished line on Enter.
    fn echo(&mut self, events: &[KeyEvent]) -> Option<String> {
        match decode_batch(events) {
            Some('\n') => Some(std::mem::take(&mut self.line)),
            Some(ch) => {
                self.line.push(ch);
                None
            }
            None => {
                debug!("dry run: undecodable batch {:?}", events);
                None
            }
        }
    }
}

#[derive(Debug)]
pub struct SimulatedBackend {
    state: Mutex<State>,
    record: bool,
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                timer_available: true,
                ..State::default()
            }),
            record: true,
        }
    }

    /// A backend that keeps F2 held and only logs typed text.
    pub fn dry_run() -> Self {
        let backend = Self {
            record: false,
            ..Self::new()
        };
        backend.press(vk::F2);
        backend
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock cannot leave the state half-written.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn press(&self, virtual_key: u8) {
        self.state().pressed.insert(virtual_key);
    }

    pub fn release(&self, virtual_key: u8) {
        self.state().pressed.remove(&virtual_key);
    }

    /// Makes timer resolution requests fail, as on hosts without a
    /// multimedia timer.
    pub fn set_timer_available(&self, available: bool) {
        self.state().timer_available = available;
    }

    /// Makes every subsequent injection return an error.
    pub fn set_fail_injection(&self, fail: bool) {
        self.state().fail_injection = fail;
    }

    pub fn activity(&self) -> Vec<Activity> {
        self.state().activity.clone()
    }

    /// Injected batches in order.
    pub fn batches(&self) -> Vec<Vec<KeyEvent>> {
        self.state()
            .activity
            .iter()
            .filter_map(|entry| match entry {
                Activity::Injected(events) => Some(events.clone()),
                _ => None,
            })
            .collect()
    }

    /// Decodes the injected batches back into text; Enter becomes `'\n'`.
    pub fn typed_text(&self) -> String {
        self.batches().iter().filter_map(|batch| decode_batch(batch)).collect()
    }

    pub fn clear(&self) {
        self.state().activity.clear();
    }
}

/// Reverses [`KeyMapping::key_events`] for a single batch.
pub fn decode_batch(events: &[KeyEvent]) -> Option<char> {
    let (needs_shift, key) = match events {
        [down, _] => (false, down.virtual_key),
        [_, down, _, _] => (true, down.virtual_key),
        _ => return None,
    };
    if key == vk::RETURN {
        return Some('\n');
    }
    us_layout::key_to_char(KeyMapping::new(key, needs_shift))
}

impl InputBackend for SimulatedBackend {
    fn is_key_pressed(&self, virtual_key: u8) -> bool {
        self.state().pressed.contains(&virtual_key)
    }

    fn map_char(&self, ch: char) -> KeyMapping {
        us_layout::char_to_key(ch).unwrap_or(KeyMapping::UNMAPPED)
    }

    fn inject(&self, events: &[KeyEvent]) -> Result<()> {
        let mut state = self.state();
        if state.fail_injection {
            return Err(MksError::injection_failed(events.len(), "simulated failure"));
        }
        if self.record {
            state.activity.push(Activity::Injected(events.to_vec()));
        } else if let Some(line) = state.echo(events) {
            info!("dry run: {}", line);
        }
        Ok(())
    }

    fn request_high_res_timer(&self) -> bool {
        let mut state = self.state();
        if !state.timer_available {
            return false;
        }
        if self.record {
            state.activity.push(Activity::TimerRequested);
        }
        true
    }

    fn release_high_res_timer(&self) -> bool {
        let mut state = self.state();
        if !state.timer_available {
            return false;
        }
        if self.record {
            state.activity.push(Activity::TimerReleased);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_state() {
        let backend = SimulatedBackend::new();
        assert!(!backend.is_key_pressed(vk::F2));
        backend.press(vk::F2);
        assert!(backend.is_key_pressed(vk::F2));
        backend.release(vk::F2);
        assert!(!backend.is_key_pressed(vk::F2));
    }

    #[test]
    fn test_dry_run_holds_start_key() {
        let backend = SimulatedBackend::dry_run();
        assert!(backend.is_key_pressed(vk::F2));
        backend.inject(&KeyMapping::new(b'A', true).key_events()).unwrap();
        assert!(backend.activity().is_empty());
    }

    #[test]
    fn test_dry_run_logs_whole_lines() {
        let mut state = State::default();
        let backend = SimulatedBackend::new();
        for ch in "Hi!".chars() {
            assert_eq!(state.echo(&backend.map_char(ch).key_events()), None);
        }
        assert_eq!(state.echo(&crate::keys::enter_events()), Some("Hi!".to_string()));
        assert_eq!(state.echo(&crate::keys::enter_events()), Some(String::new()));
    }

    #[test]
    fn test_typed_text() {
        let backend = SimulatedBackend::new();
        for ch in "Hi!".chars() {
            backend.inject(&backend.map_char(ch).key_events()).unwrap();
        }
        backend.inject(&crate::keys::enter_events()).unwrap();
        assert_eq!(backend.typed_text(), "Hi!\n");
    }

    #[test]
    fn test_unmapped_character() {
        let backend = SimulatedBackend::new();
        assert!(backend.map_char('\t').is_unmapped());
    }

    #[test]
    fn test_timer_unavailable() {
        let backend = SimulatedBackend::new();
        backend.set_timer_available(false);
        assert!(!backend.request_high_res_timer());
        assert!(!backend.release_high_res_timer());
        assert!(backend.activity().is_empty());
    }

    #[test]
    fn test_injection_failure() {
        let backend = SimulatedBackend::new();
        backend.set_fail_injection(true);
        assert!(backend.inject(&crate::keys::enter_events()).is_err());
        assert!(backend.batches().is_empty());
    }
}
