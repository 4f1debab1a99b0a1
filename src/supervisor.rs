//! Lifecycle of the engine and watchdog pair.

use tracing::info;

use crate::backend::SharedBackend;
use crate::config::SharedConfig;
use crate::engine::EngineSlot;
use crate::task::TaskHandle;
use crate::watchdog::Watchdog;

/// Starts and stops the engine together with its watchdog.
///
/// Activation is guarded: while a pair is running, [`Supervisor::activate`]
/// leaves it untouched, and [`Supervisor::deactivate`] on an idle supervisor
/// does nothing.
pub struct Supervisor {
    backend: SharedBackend,
    config: SharedConfig,
    engine: EngineSlot,
    watchdog: Option<TaskHandle>,
    watchdog_generation: u64,
}

impl Supervisor {
    pub fn new(backend: SharedBackend, config: SharedConfig) -> Self {
        let engine = EngineSlot::new(backend.clone(), config.clone());
        Self {
            backend,
            config,
            engine,
            watchdog: None,
            watchdog_generation: 0,
        }
    }

    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.watchdog.is_some()
    }

    /// Starts the engine and watchdog. Returns `false` if they were already
    /// running.
    pub async fn activate(&mut self) -> bool {
        if self.is_active() {
            return false;
        }

        self.engine.start().await;
        self.watchdog_generation += 1;
        let watchdog = Watchdog::new(self.backend.clone(), self.engine.clone());
        self.watchdog = Some(TaskHandle::spawn(
            "watchdog",
            self.watchdog_generation,
            move |cancel| watchdog.run(cancel),
        ));

        info!("activated: F2 to start, F4 to stop");
        true
    }

    /// Stops the watchdog, then the engine. Returns `false` if nothing was
    /// running.
    pub async fn deactivate(&mut self) -> bool {
        let Some(watchdog) = self.watchdog.take() else {
            return false;
        };

        // The watchdog goes first so it cannot relaunch the engine.
        watchdog.stop().await;
        self.engine.stop().await;

        info!("deactivated");
        true
    }

    /// Generation of the running engine, which changes on every relaunch.
    pub async fn engine_generation(&self) -> Option<u64> {
        self.engine.generation().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SimulatedBackend;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_activate_is_idempotent() {
        let backend = Arc::new(SimulatedBackend::new());
        let mut supervisor = Supervisor::new(backend, SharedConfig::default());

        assert!(!supervisor.is_active());
        assert!(supervisor.activate().await);
        let generation = supervisor.engine_generation().await;
        assert!(generation.is_some());

        assert!(!supervisor.activate().await);
        assert!(supervisor.is_active());
        assert_eq!(supervisor.engine_generation().await, generation);

        assert!(supervisor.deactivate().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivate_when_idle() {
        let backend = Arc::new(SimulatedBackend::new());
        let mut supervisor = Supervisor::new(backend, SharedConfig::default());

        assert!(!supervisor.deactivate().await);
        supervisor.activate().await;
        assert!(supervisor.deactivate().await);
        assert!(!supervisor.deactivate().await);
        assert!(!supervisor.is_active());
        assert_eq!(supervisor.engine_generation().await, None);
    }
}
