//! Background tasks with cooperative cancellation.
//!
//! Each task owns a [`CancelToken`] and checks it between key events and
//! while sleeping. Stopping a task signals the token and waits for the task
//! to return, so nothing runs after [`TaskHandle::stop`] completes.

use std::future::Future;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Marker returned when a task notices it has been cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Receiving side of a cancellation signal. Dropping the matching
/// [`TaskHandle`] also counts as cancellation.
#[derive(Debug, Clone)]
pub struct CancelToken {
    receiver: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow() || self.receiver.has_changed().is_err()
    }

    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&mut self) {
        // An error means the sender is gone, which is treated the same way.
        let _ = self.receiver.wait_for(|cancelled| *cancelled).await;
    }
}

/// A spawned task paired with the sender that cancels it.
#[derive(Debug)]
pub struct TaskHandle {
    name: &'static str,
    generation: u64,
    cancel: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl TaskHandle {
    /// Spawns `task` on the current tokio runtime.
    pub fn spawn<F, Fut>(name: &'static str, generation: u64, task: F) -> Self
    where
        F: FnOnce(CancelToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (cancel, receiver) = watch::channel(false);
        let join = tokio::spawn(task(CancelToken { receiver }));
        debug!(task = name, generation, "task spawned");
        Self {
            name,
            generation,
            cancel,
            join,
        }
    }

    /// Label used in log events, e.g. `"engine"`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Distinguishes successive tasks filling the same role.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Signals cancellation and waits for the task to return.
    pub async fn stop(self) {
        // Fails only if the task already dropped its token.
        let _ = self.cancel.send(true);
        match self.join.await {
            Ok(()) => debug!(task = self.name, generation = self.generation, "task stopped"),
            Err(e) if e.is_panic() => {
                warn!(task = self.name, generation = self.generation, "task panicked: {}", e)
            }
            Err(e) => debug!(task = self.name, generation = self.generation, "task aborted: {}", e),
        }
    }
}
