//! Knock subsystem: outbound probes that precede station exposure.
//!
//! # Data Flow
//! ```text
//! StationConfig.knock
//!     → ProbeSequence (url, count, 1s interval)
//!     → ProbeScheduler::spawn (own task, cancellable)
//!     → JoinHandle<ProbeReport> (completion notification)
//! ```

pub mod scheduler;

pub use scheduler::{ProbeReport, ProbeScheduler, ProbeSequence, KNOCK_INTERVAL};
