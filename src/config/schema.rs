//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::config::directive::{parse_directive, DirectiveError, StationConfig};

/// Root configuration for the teleport bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Local server listener.
    pub listener: ListenerConfig,

    /// Local routes served by the host chain.
    pub routes: Vec<RouteConfig>,

    /// `teleport` directive text, e.g. `"dial://relay:7000 knock http://fw/open 3"`.
    pub teleport: Option<String>,

    /// Station transport tuning.
    pub tunnel: TunnelConfig,

    /// Random delay middleware.
    pub delay: DelayConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin status endpoint.
    pub admin: AdminConfig,
}

impl BridgeConfig {
    /// Parse the `teleport` directive, if one is configured.
    pub fn station(&self) -> Result<Option<StationConfig>, DirectiveError> {
        self.teleport.as_deref().map(parse_directive).transpose()
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Name reported through the server handle.
    pub server_name: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            server_name: "teleport-bridge".to_string(),
        }
    }
}

/// A local route and the handler chain behind it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier, always part of the route group.
    pub name: String,

    /// Path pattern (axum syntax, e.g. "/api/{*rest}").
    pub path: String,

    /// Additional route group names visible to this chain.
    #[serde(default)]
    pub groups: Vec<String>,

    /// Upstream address to forward to (e.g., "127.0.0.1:3000").
    #[serde(default)]
    pub upstream: Option<String>,

    /// Static response body; `{placeholders}` are expanded per request.
    #[serde(default)]
    pub respond: Option<String>,

    /// Put the handoff middleware in front of this route.
    #[serde(default)]
    pub teleport: bool,

    /// Put the random delay middleware in front of this route.
    #[serde(default)]
    pub delay: bool,
}

impl RouteConfig {
    /// Route group snapshot for this route: its own name plus `groups`.
    pub fn route_group(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.groups.iter().map(String::as_str))
    }
}

/// Station transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TunnelConfig {
    /// Base delay before redialing a `dial://` station, in milliseconds.
    pub redial_base_ms: u64,

    /// Maximum redial delay in milliseconds.
    pub redial_max_ms: u64,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            redial_base_ms: 500,
            redial_max_ms: 30_000,
        }
    }
}

/// Random delay middleware configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DelayConfig {
    /// Enable the middleware on routes that ask for it.
    pub enabled: bool,

    /// Lower bound of the delay (inclusive) in milliseconds.
    pub min_ms: u64,

    /// Upper bound of the delay (exclusive) in milliseconds.
    pub max_ms: u64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_ms: 450,
            max_ms: 550,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Timeout for a single knock probe in seconds.
    pub knock_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            knock_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin status endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin server.
    pub enabled: bool,

    /// Admin server bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
