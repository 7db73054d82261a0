//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Provision teleport → Start listeners
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → server, station and knock tasks stop
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Provisioning never blocks: long-running work runs on spawned tasks
//! - Every background task owns a shutdown receiver and a JoinHandle

pub mod shutdown;
pub mod signals;

pub use shutdown::{signalled, Shutdown, ShutdownSignal};
