//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that the teleport directive parses and is used by some route
//! - Validate value ranges (addresses parse, delay range non-empty)
//! - Detect conflicting routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use std::str::FromStr;

use axum::http::uri::Authority;
use thiserror::Error;

use crate::config::directive::DirectiveError;
use crate::config::schema::BridgeConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: String, value: String },

    #[error("route #{index} has an empty name")]
    EmptyRouteName { index: usize },

    #[error("route {0:?} is defined more than once")]
    DuplicateRoute(String),

    #[error("route {route:?}: path {path:?} must start with '/'")]
    InvalidPath { route: String, path: String },

    #[error("route {route:?}: path {path:?} is already used")]
    DuplicatePath { route: String, path: String },

    #[error("route {0:?} needs exactly one of `upstream` or `respond`")]
    AmbiguousHandler(String),

    #[error("route {route:?}: invalid upstream {upstream:?}")]
    InvalidUpstream { route: String, upstream: String },

    #[error("teleport directive: {0}")]
    Directive(#[from] DirectiveError),

    #[error("route {0:?} enables teleport but no teleport directive is configured")]
    TeleportWithoutStation(String),

    #[error("teleport directive is configured but no route enables teleport")]
    StationWithoutRoute,

    #[error("delay range {min_ms}..{max_ms} ms is empty")]
    EmptyDelayRange { min_ms: u64, max_ms: u64 },

    #[error("tunnel redial delays must satisfy 0 < base ({base_ms}) <= max ({max_ms})")]
    InvalidRedial { base_ms: u64, max_ms: u64 },

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let mut names = HashSet::new();
    let mut paths = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        if route.name.trim().is_empty() {
            errors.push(ValidationError::EmptyRouteName { index });
        } else if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.name.clone()));
        }

        if !route.path.starts_with('/') {
            errors.push(ValidationError::InvalidPath {
                route: route.name.clone(),
                path: route.path.clone(),
            });
        } else if !paths.insert(route.path.as_str()) {
            errors.push(ValidationError::DuplicatePath {
                route: route.name.clone(),
                path: route.path.clone(),
            });
        }

        match (&route.upstream, &route.respond) {
            (Some(upstream), None) => {
                if Authority::from_str(upstream).is_err() {
                    errors.push(ValidationError::InvalidUpstream {
                        route: route.name.clone(),
                        upstream: upstream.clone(),
                    });
                }
            }
            (None, Some(_)) => {}
            _ => errors.push(ValidationError::AmbiguousHandler(route.name.clone())),
        }
    }

    match config.station() {
        Ok(Some(_)) => {
            if !config.routes.iter().any(|r| r.teleport) {
                errors.push(ValidationError::StationWithoutRoute);
            }
        }
        Ok(None) => {
            for route in config.routes.iter().filter(|r| r.teleport) {
                errors.push(ValidationError::TeleportWithoutStation(route.name.clone()));
            }
        }
        Err(e) => errors.push(e.into()),
    }

    if config.delay.enabled && config.delay.min_ms >= config.delay.max_ms {
        errors.push(ValidationError::EmptyDelayRange {
            min_ms: config.delay.min_ms,
            max_ms: config.delay.max_ms,
        });
    }

    let tunnel = &config.tunnel;
    if tunnel.redial_base_ms == 0 || tunnel.redial_base_ms > tunnel.redial_max_ms {
        errors.push(ValidationError::InvalidRedial {
            base_ms: tunnel.redial_base_ms,
            max_ms: tunnel.redial_max_ms,
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }
    if config.timeouts.knock_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("knock_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}
