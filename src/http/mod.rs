//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, cross-cutting layers)
//!     → request.rs (add request ID)
//!     → ambient.rs (replacer, server handle, route group, original request)
//!     → handoff middleware (teleport routes only)
//!     → middleware/delay.rs (delay routes only)
//!     → handlers.rs (forward upstream or render response)
//! ```

pub mod ambient;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod server;

pub use request::{RequestId, RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use server::HttpServer;
