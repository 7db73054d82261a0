//! Host-side ambient context injection.
//!
//! Every configured route runs this layer outermost, so the handler chain
//! behind it always finds a fresh replacer, the server handle, its route
//! group and a snapshot of the inbound request in the request extensions.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::handoff::{Ambient, RequestSnapshot, RouteGroup, ServerHandle};
use crate::observability::metrics;

/// Ambient values known when a route is built.
#[derive(Debug, Clone)]
pub struct RouteContext {
    pub route: Arc<str>,
    pub server: ServerHandle,
    pub route_group: RouteGroup,
}

pub async fn ambient_context(
    State(ctx): State<RouteContext>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let ambient = Ambient {
        server: ctx.server.clone(),
        route_group: ctx.route_group.clone(),
        original: RequestSnapshot::capture(&request),
    };
    ambient.attach(request.extensions_mut());

    let response = next.run(request).await;
    metrics::record_request(&ctx.route, response.status().as_u16());
    response
}
