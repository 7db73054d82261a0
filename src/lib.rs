//! Teleport bridge library.
//!
//! Exposes a locally served handler chain under a remote station: the first
//! request through the `teleport` middleware captures the chain and its
//! ambient context, and every later request, local or delivered by the
//! station, is served by that captured chain.

pub mod admin;
pub mod config;
pub mod handoff;
pub mod http;
pub mod knock;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod station;

pub use config::schema::BridgeConfig;
pub use handoff::{HandoffState, Teleport};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
