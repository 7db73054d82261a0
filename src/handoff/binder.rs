//! Request entry points into the handoff binding.
//!
//! # Data Flow
//! ```text
//! local chain:  ambient layer → handoff_middleware → (bind once) → downstream
//! tunnel:       station → tunnel_router → tunnel_handler → downstream
//! ```
//!
//! Both entry points end in the same captured downstream once bound; the
//! tunnel answers 404 until the first local request has bound the state.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::handoff::context::{bind_context, Ambient};
use crate::handoff::state::{BindOutcome, Binding, Downstream, HandoffState};
use crate::http::request::RequestIdLayer;
use crate::observability::metrics;

/// Local middleware entry.
///
/// The first request through captures `next` and the ambient context, then
/// continues down the chain unchanged. Every later request is rebuilt with
/// the frozen ambient context and handed to the captured downstream.
pub async fn handoff_middleware(
    State(state): State<Arc<HandoffState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(binding) = state.binding() {
        return dispatch_bound(binding, request, "local").await;
    }

    let ambient = Ambient::from_extensions(request.extensions());
    let downstream = Downstream::from_next(next.clone());
    let result = state
        .bind_with(move || {
            Ok(Binding {
                downstream,
                ambient: ambient?,
            })
        })
        .await;

    match result {
        Ok((binding, BindOutcome::Captured)) => {
            tracing::info!(
                server = %binding.ambient.server.name(),
                route_group = %binding.ambient.route_group,
                method = %binding.ambient.original.method,
                uri = %binding.ambient.original.uri,
                "Handler chain bound"
            );
            metrics::record_bind();
            next.run(request).await
        }
        Ok((binding, BindOutcome::AlreadyBound)) => {
            dispatch_bound(binding, request, "local").await
        }
        Err(e) => {
            tracing::error!(error = %e, path = %request.uri().path(), "Handoff binding failed");
            metrics::record_bind_failure();
            (StatusCode::INTERNAL_SERVER_ERROR, "Handoff binding failed").into_response()
        }
    }
}

/// Tunnel entry: serve a station-delivered request with the bound chain.
pub async fn tunnel_handler(
    State(state): State<Arc<HandoffState>>,
    request: Request<Body>,
) -> Response {
    match state.binding() {
        Some(binding) => {
            metrics::record_tunnel_request("dispatched");
            dispatch_bound(binding, request, "tunnel").await
        }
        None => {
            tracing::info!(path = %request.uri().path(), "Tunnel request before binding, not found");
            metrics::record_tunnel_request("unbound");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// Handler given to the station server. Requests that run longer than
/// `request_timeout` get 408, as on the local router.
#[allow(deprecated)]
pub fn tunnel_router(state: Arc<HandoffState>, request_timeout: Duration) -> Router {
    Router::new()
        .fallback(tunnel_handler)
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(RequestIdLayer)
        .layer(TraceLayer::new_for_http())
}

async fn dispatch_bound(binding: &Binding, request: Request<Body>, origin: &'static str) -> Response {
    tracing::debug!(
        origin,
        method = %request.method(),
        path = %request.uri().path(),
        "Dispatching to bound handler chain"
    );
    let request = bind_context(request, &binding.ambient);
    binding.downstream.dispatch(request).await
}
