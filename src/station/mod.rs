//! Station transport boundary.
//!
//! # Contract
//! ```text
//! serve(station, handler, shutdown)
//!     → accept tunnel traffic addressed to `station`
//!     → turn each request into a call against `handler`
//!     → resolve only when the station stops (shutdown or fatal error)
//! ```
//!
//! # Design Decisions
//! - The handoff core only depends on this trait; the wire protocol is the
//!   transport's business
//! - `serve` is awaited on its own task, never on a request path
//! - `DirectStation` ships a plain TCP transport (listen or reverse-dial) so
//!   a station works end to end without an external relay

pub mod direct;

use axum::Router;
use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::lifecycle::ShutdownSignal;

pub use direct::{DirectStation, StationEndpoint};

/// Errors that end a station.
#[derive(Debug, Error)]
pub enum StationError {
    #[error("invalid station {station:?}: {reason}")]
    InvalidStation { station: String, reason: String },

    #[error("unsupported station scheme {0:?} (expected listen:// or dial://)")]
    UnsupportedScheme(String),

    #[error("station I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that can expose a handler under a station name.
pub trait StationServer: Send + Sync + 'static {
    fn serve(
        &self,
        station: String,
        handler: Router,
        shutdown: ShutdownSignal,
    ) -> BoxFuture<'static, Result<(), StationError>>;
}
