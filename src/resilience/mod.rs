//! Resilience primitives for long-lived background connections.
//!
//! The handoff core itself never retries: station serve failures are logged
//! and knock probes are fire-and-forget. Only the `dial://` station
//! transport redials, using `backoff`.

pub mod backoff;

pub use backoff::Backoff;
