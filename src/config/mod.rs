//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → directive.rs (teleport <station> [knock <url> [<count>]])
//!     → BridgeConfig + StationConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the handoff binding is write-once,
//!   so there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod directive;
pub mod loader;
pub mod schema;
pub mod validation;

pub use directive::{parse_directive, DirectiveError, KnockConfig, StationConfig};
pub use schema::{
    AdminConfig, BridgeConfig, DelayConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    RouteConfig, TimeoutConfig, TunnelConfig,
};
