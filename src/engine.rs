//! The injection engine.
//!
//! An engine idles in `WaitingForStart`, polling the start hotkey every
//! [`POLL_INTERVAL`]. Once the key is seen down it types one burst (the
//! configured number of messages, each followed by Enter) and goes back to
//! waiting. Holding the key keeps re-triggering bursts. The engine has no
//! terminal state; it runs until its [`CancelToken`] fires.

use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::backend::SharedBackend;
use crate::config::SharedConfig;
use crate::keys::{enter_events, vk, KeyEvent, PRINTABLE_FIRST, PRINTABLE_LAST};
use crate::task::{CancelToken, Cancelled, TaskHandle};
use crate::timer::{precise_sleep, POLL_INTERVAL};

/// Longest message typed in randomize mode.
pub const MAX_RANDOM_LENGTH: usize = 94;

pub struct InjectionEngine {
    backend: SharedBackend,
    config: SharedConfig,
    rng: StdRng,
}

impl InjectionEngine {
    pub fn new(backend: SharedBackend, config: SharedConfig) -> Self {
        Self {
            backend,
            config,
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Replaces the random source, for reproducible randomized messages.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Runs until `cancel` fires.
    pub async fn run(mut self, mut cancel: CancelToken) {
        let Err(Cancelled) = self.run_until_cancelled(&mut cancel).await;
        debug!("engine cancelled");
    }

    async fn run_until_cancelled(
        &mut self,
        cancel: &mut CancelToken,
    ) -> Result<Infallible, Cancelled> {
        loop {
            self.wait_for_start(cancel).await?;
            self.send_burst(cancel).await?;
        }
    }

    async fn wait_for_start(&self, cancel: &mut CancelToken) -> Result<(), Cancelled> {
        while !self.backend.is_key_pressed(vk::F2) {
            precise_sleep(&*self.backend, POLL_INTERVAL, cancel).await?;
        }
        Ok(())
    }

    async fn send_burst(&mut self, cancel: &mut CancelToken) -> Result<(), Cancelled> {
        let config = self.config.snapshot();
        info!(
            repetitions = config.repetitions,
            randomize = config.randomize,
            "start hotkey pressed, sending"
        );

        // Zero repetitions still waits out one message delay.
        if config.repetitions == 0 {
            return precise_sleep(&*self.backend, config.message_delay, cancel).await;
        }

        for repetition in 0..config.repetitions {
            let message: Vec<char> = if config.randomize {
                self.random_message()
            } else {
                config.message.chars().collect()
            };
            debug!(repetition, length = message.len(), "typing message");

            for ch in message {
                cancel.check()?;
                let mapping = self.backend.map_char(ch);
                if mapping.is_unmapped() {
                    debug!("no key for {:?} in the active layout", ch);
                }
                self.inject(&mapping.key_events());
                precise_sleep(&*self.backend, config.key_delay, cancel).await?;
            }

            cancel.check()?;
            self.inject(&enter_events());
            precise_sleep(&*self.backend, config.message_delay, cancel).await?;
        }

        info!("burst complete, waiting for start hotkey");
        Ok(())
    }

    /// Failures are logged and otherwise ignored.
    fn inject(&self, events: &[KeyEvent]) {
        if let Err(e) = self.backend.inject(events) {
            warn!("{}", e);
        }
    }

    /// A fresh length in `0..=MAX_RANDOM_LENGTH` of printable ASCII.
    fn random_message(&mut self) -> Vec<char> {
        let length = self.rng.random_range(0..=MAX_RANDOM_LENGTH);
        (0..length)
            .map(|_| self.rng.random_range(PRINTABLE_FIRST..=PRINTABLE_LAST))
            .collect()
    }
}

/// The slot holding the single active engine, shared by the supervisor and
/// the watchdog. Clones refer to the same slot.
#[derive(Clone)]
pub struct EngineSlot {
    backend: SharedBackend,
    config: SharedConfig,
    current: Arc<Mutex<Option<TaskHandle>>>,
    next_generation: Arc<AtomicU64>,
}

impl EngineSlot {
    pub fn new(backend: SharedBackend, config: SharedConfig) -> Self {
        Self {
            backend,
            config,
            current: Arc::new(Mutex::new(None)),
            next_generation: Arc::new(AtomicU64::new(1)),
        }
    }

    fn launch(&self) -> TaskHandle {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let engine = InjectionEngine::new(self.backend.clone(), self.config.clone());
        TaskHandle::spawn("engine", generation, move |cancel| engine.run(cancel))
    }

    /// Starts an engine unless one is already running. Returns whether a new
    /// engine was started.
    pub async fn start(&self) -> bool {
        let mut current = self.current.lock().await;
        if current.is_some() {
            return false;
        }
        *current = Some(self.launch());
        true
    }

    /// Stops the running engine, if any. Returns whether one was stopped.
    pub async fn stop(&self) -> bool {
        let mut current = self.current.lock().await;
        let Some(engine) = current.take() else {
            return false;
        };
        engine.stop().await;
        true
    }

    /// Replaces a running engine with a fresh one that reads the current
    /// configuration. Does nothing when no engine is running. Returns the new
    /// engine's generation.
    pub async fn restart(&self) -> Option<u64> {
        let mut current = self.current.lock().await;
        let previous = current.take()?;
        previous.stop().await;
        let engine = self.launch();
        let generation = engine.generation();
        *current = Some(engine);
        Some(generation)
    }

    pub async fn is_running(&self) -> bool {
        self.current.lock().await.is_some()
    }

    pub async fn generation(&self) -> Option<u64> {
        self.current.lock().await.as_ref().map(TaskHandle::generation)
    }
}
