//! Handoff subsystem: capture a handler chain once, serve it from anywhere.
//!
//! # Data Flow
//! ```text
//! Teleport::provision
//!     → knock sequence (optional, own task)
//!     → StationServer::serve(station, tunnel_router) (own task)
//!
//! first local request
//!     → handoff_middleware captures Next + ambient context → HandoffState
//!
//! later local / tunnel requests
//!     → bind_context(frozen ambient) → captured downstream
//! ```
//!
//! # Design Decisions
//! - HandoffState is an injected `Arc`, not a process global
//! - Ambient context reads are capability checks returning `BindError`
//! - The replacer is rebuilt per request; everything else is frozen

pub mod binder;
pub mod context;
pub mod replacer;
pub mod state;
pub mod teleport;

pub use binder::{handoff_middleware, tunnel_handler, tunnel_router};
pub use context::{bind_context, Ambient, BindError, RequestSnapshot, RouteGroup, ServerHandle};
pub use replacer::Replacer;
pub use state::{BindOutcome, Binding, Downstream, HandoffState};
pub use teleport::Teleport;
