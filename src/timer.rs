//! Sleeping with best-effort high timer resolution.
//!
//! The finer OS timer is requested right before each sleep and released as
//! soon as the sleep ends, so it is never held across key injection or across
//! two sleeps. A failed request just means default timing.

use std::time::Duration;

use tracing::trace;

use crate::backend::InputBackend;
use crate::task::{CancelToken, Cancelled};

/// Hotkey polling cadence of the engine and the watchdog.
pub const POLL_INTERVAL: Duration = Duration::from_millis(40);

/// Holds a timer resolution request for as long as it lives.
pub struct HighResTimer<'a> {
    backend: &'a dyn InputBackend,
    acquired: bool,
}

impl<'a> HighResTimer<'a> {
    pub fn request(backend: &'a dyn InputBackend) -> Self {
        let acquired = backend.request_high_res_timer();
        if !acquired {
            trace!("high resolution timer unavailable");
        }
        Self { backend, acquired }
    }

    /// Whether the OS granted the request; only then is it released on drop.
    pub fn is_acquired(&self) -> bool {
        self.acquired
    }
}

impl Drop for HighResTimer<'_> {
    fn drop(&mut self) {
        if self.acquired {
            self.backend.release_high_res_timer();
        }
    }
}

/// Sleeps for `duration` under a [`HighResTimer`], waking early with
/// [`Cancelled`] if `cancel` fires.
pub async fn precise_sleep(
    backend: &dyn InputBackend,
    duration: Duration,
    cancel: &mut CancelToken,
) -> Result<(), Cancelled> {
    cancel.check()?;
    let _timer = HighResTimer::request(backend);
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Activity, SimulatedBackend};
    use crate::task::TaskHandle;

    #[test]
    fn test_guard_pairs_request_and_release() {
        let backend = SimulatedBackend::new();
        {
            let timer = HighResTimer::request(&backend);
            assert!(timer.is_acquired());
            assert_eq!(backend.activity(), vec![Activity::TimerRequested]);
        }
        assert_eq!(
            backend.activity(),
            vec![Activity::TimerRequested, Activity::TimerReleased]
        );
    }

    #[test]
    fn test_failed_request_is_not_released() {
        let backend = SimulatedBackend::new();
        backend.set_timer_available(false);
        let timer = HighResTimer::request(&backend);
        assert!(!timer.is_acquired());
        drop(timer);
        assert!(backend.activity().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_sleep_releases_timer() {
        let backend = std::sync::Arc::new(SimulatedBackend::new());
        let shared = backend.clone();
        let (tx, rx) = tokio::sync::oneshot::channel();

        let handle = TaskHandle::spawn("sleeper", 1, move |mut cancel| async move {
            let result = precise_sleep(&*shared, Duration::from_secs(3600), &mut cancel).await;
            let _ = tx.send(result);
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.stop().await;

        assert_eq!(rx.await.unwrap(), Err(Cancelled));
        assert_eq!(
            backend.activity(),
            vec![Activity::TimerRequested, Activity::TimerReleased]
        );
    }
}
