//! # Message Key Sender
//!
//! A command-line tool that repeatedly types a message into whichever window
//! has keyboard focus.
//!
//! ## Features
//!
//! - Fixed message or random printable characters
//! - Configurable delay per key, delay per message and repetitions
//! - F2 starts a burst, F4 cancels it mid-message and re-arms the engine
//! - Best-effort high resolution timing around every sleep
//! - Simulated backend for dry runs and tests
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use message_key_sender::{SharedConfig, SimulatedBackend, Supervisor};
//!
//! # async fn demo() {
//! let config = SharedConfig::default();
//! config.set_message("Hi");
//!
//! let mut supervisor = Supervisor::new(Arc::new(SimulatedBackend::new()), config);
//! supervisor.activate().await;
//! // ... F2 / F4 are now live ...
//! supervisor.deactivate().await;
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod keys;
pub mod menu;
pub mod supervisor;
pub mod task;
pub mod timer;
pub mod watchdog;

pub use backend::{platform_backend, InputBackend, SharedBackend, SimulatedBackend};
pub use config::{Config, SharedConfig};
pub use engine::{EngineSlot, InjectionEngine};
pub use error::{MksError, Result};
pub use keys::{KeyEvent, KeyMapping};
pub use supervisor::Supervisor;
pub use watchdog::Watchdog;
