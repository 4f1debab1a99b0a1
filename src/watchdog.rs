//! Stop hotkey listener.
//!
//! Polls F4 alongside the engine. While the key is down and an engine is
//! running, the engine is cancelled mid-burst and replaced by a fresh one
//! that waits for the start hotkey again with the current configuration.

use tracing::info;

use crate::backend::SharedBackend;
use crate::engine::EngineSlot;
use crate::keys::vk;
use crate::task::CancelToken;
use crate::timer::{precise_sleep, POLL_INTERVAL};

pub struct Watchdog {
    backend: SharedBackend,
    engine: EngineSlot,
}

impl Watchdog {
    pub fn new(backend: SharedBackend, engine: EngineSlot) -> Self {
        Self { backend, engine }
    }

    /// Runs until `cancel` fires.
    pub async fn run(self, mut cancel: CancelToken) {
        loop {
            if self.backend.is_key_pressed(vk::F4) {
                if let Some(generation) = self.engine.restart().await {
                    info!(generation, "stop hotkey pressed, engine restarted");
                }
            }

            if precise_sleep(&*self.backend, POLL_INTERVAL, &mut cancel)
                .await
                .is_err()
            {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SimulatedBackend;
    use crate::config::SharedConfig;
    use crate::task::TaskHandle;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_ignores_stop_key_without_engine() {
        let backend = Arc::new(SimulatedBackend::new());
        let slot = EngineSlot::new(backend.clone(), SharedConfig::default());
        let watchdog = Watchdog::new(backend.clone(), slot.clone());
        let handle = TaskHandle::spawn("watchdog", 1, move |cancel| watchdog.run(cancel));

        backend.press(vk::F4);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!slot.is_running().await);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_restarts_running_engine() {
        let backend = Arc::new(SimulatedBackend::new());
        let slot = EngineSlot::new(backend.clone(), SharedConfig::default());
        slot.start().await;
        let first = slot.generation().await.unwrap();

        let watchdog = Watchdog::new(backend.clone(), slot.clone());
        let handle = TaskHandle::spawn("watchdog", 1, move |cancel| watchdog.run(cancel));

        backend.press(vk::F4);
        tokio::time::sleep(Duration::from_millis(10)).await;
        backend.release(vk::F4);
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(slot.generation().await, Some(first + 1));
        handle.stop().await;
        slot.stop().await;
    }
}
