//! Per-request ambient context.
//!
//! # Responsibilities
//! - Define the four ambient values a handler chain expects on every request
//!   (replacer, server handle, route group, original request)
//! - Read them back with an explicit capability check
//! - Build new requests carrying a given set of ambient values
//!
//! # Design Decisions
//! - Ambient values travel as request extensions, keyed by type
//! - Server handle and route group are `Arc` snapshots: cloning is cheap and
//!   equality on the server handle is identity
//! - The replacer is never carried over, every bound request gets a fresh one

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use axum::body::Body;
use axum::http::{Extensions, HeaderMap, Method, Request, Uri};
use thiserror::Error;

use crate::handoff::replacer::Replacer;

/// Failure to read the ambient context from a request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("request context is missing the {0}")]
    MissingAmbient(&'static str),
}

/// Describes the local server that owns a handler chain.
#[derive(Debug)]
pub struct ServerInfo {
    pub name: String,
    pub bind_address: String,
    pub started_at: SystemTime,
}

/// Shared handle to the local server.
#[derive(Debug, Clone)]
pub struct ServerHandle(Arc<ServerInfo>);

impl ServerHandle {
    pub fn new(name: impl Into<String>, bind_address: impl Into<String>) -> Self {
        Self(Arc::new(ServerInfo {
            name: name.into(),
            bind_address: bind_address.into(),
            started_at: SystemTime::now(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn bind_address(&self) -> &str {
        &self.0.bind_address
    }

    pub fn started_at(&self) -> SystemTime {
        self.0.started_at
    }
}

impl PartialEq for ServerHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ServerHandle {}

/// Immutable snapshot of the route names visible to a chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteGroup(Arc<BTreeSet<String>>);

impl RouteGroup {
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for RouteGroup {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(Arc::new(iter.into_iter().map(Into::into).collect()))
    }
}

impl fmt::Display for RouteGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

/// Value copy of the request metadata a chain saw first.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSnapshot {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl RequestSnapshot {
    pub fn capture<B>(request: &Request<B>) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            headers: request.headers().clone(),
        }
    }
}

/// The ambient values frozen into a binding. The replacer is absent on
/// purpose: it is rebuilt for every request.
#[derive(Debug, Clone, PartialEq)]
pub struct Ambient {
    pub server: ServerHandle,
    pub route_group: RouteGroup,
    pub original: RequestSnapshot,
}

impl Ambient {
    /// Read the ambient values from a request context. Every value,
    /// including the replacer, must be present.
    pub fn from_extensions(extensions: &Extensions) -> Result<Self, BindError> {
        if extensions.get::<Replacer>().is_none() {
            return Err(BindError::MissingAmbient("replacer"));
        }
        let server = extensions
            .get::<ServerHandle>()
            .cloned()
            .ok_or(BindError::MissingAmbient("server handle"))?;
        let route_group = extensions
            .get::<RouteGroup>()
            .cloned()
            .ok_or(BindError::MissingAmbient("route group"))?;
        let original = extensions
            .get::<RequestSnapshot>()
            .cloned()
            .ok_or(BindError::MissingAmbient("original request"))?;

        Ok(Self {
            server,
            route_group,
            original,
        })
    }

    /// Insert a fresh replacer and these values, replacing any present.
    pub fn attach(&self, extensions: &mut Extensions) {
        extensions.insert(Replacer::new());
        extensions.insert(self.server.clone());
        extensions.insert(self.route_group.clone());
        extensions.insert(self.original.clone());
    }
}

/// Rebuild `request` so its context exposes `ambient`. Method, URI,
/// version, headers, body and unrelated extensions carry over.
pub fn bind_context(request: Request<Body>, ambient: &Ambient) -> Request<Body> {
    let (mut parts, body) = request.into_parts();
    ambient.attach(&mut parts.extensions);
    Request::from_parts(parts, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ambient() -> Ambient {
        let first = Request::builder()
            .method(Method::POST)
            .uri("http://local/first")
            .header("x-first", "1")
            .body(())
            .unwrap();
        Ambient {
            server: ServerHandle::new("edge", "127.0.0.1:8080"),
            route_group: ["app", "public"].into_iter().collect(),
            original: RequestSnapshot::capture(&first),
        }
    }

    #[test]
    fn test_bind_context_exposes_all_values() {
        let ambient = ambient();
        let request = Request::builder()
            .uri("/later?x=1")
            .header("x-later", "2")
            .body(Body::from("payload"))
            .unwrap();

        let bound = bind_context(request, &ambient);
        assert_eq!(bound.uri(), "/later?x=1");
        assert_eq!(bound.headers()["x-later"], "2");

        let read = Ambient::from_extensions(bound.extensions()).unwrap();
        assert_eq!(read, ambient);
        assert_eq!(read.original.uri, "http://local/first");
        assert!(bound.extensions().get::<Replacer>().unwrap().is_empty());
    }

    #[test]
    fn test_bind_context_resets_replacer() {
        let ambient = ambient();
        let mut request = Request::new(Body::empty());
        let mut used = Replacer::new();
        used.set("stale", "value");
        request.extensions_mut().insert(used);

        let bound = bind_context(request, &ambient);
        assert!(bound.extensions().get::<Replacer>().unwrap().get("stale").is_none());
    }

    #[test]
    fn test_missing_values_reported() {
        let mut ext = Extensions::new();
        assert_eq!(
            Ambient::from_extensions(&ext),
            Err(BindError::MissingAmbient("replacer"))
        );

        ext.insert(Replacer::new());
        assert_eq!(
            Ambient::from_extensions(&ext),
            Err(BindError::MissingAmbient("server handle"))
        );

        ext.insert(ServerHandle::new("edge", "127.0.0.1:8080"));
        ext.insert(RouteGroup::default());
        assert_eq!(
            Ambient::from_extensions(&ext),
            Err(BindError::MissingAmbient("original request"))
        );
    }

    #[test]
    fn test_server_handle_identity() {
        let a = ServerHandle::new("edge", "x");
        let b = ServerHandle::new("edge", "x");
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_route_group_display() {
        let group: RouteGroup = ["b", "a"].into_iter().collect();
        assert_eq!(group.to_string(), "a,b");
        assert!(group.contains("a"));
        assert_eq!(group.len(), 2);
    }
}
