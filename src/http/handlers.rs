//! Terminal route handlers.
//!
//! # Responsibilities
//! - Forward requests to an upstream address
//! - Render static responses through the request's replacer
//!
//! # Design Decisions
//! - Forwarding rewrites scheme and authority only; path, query, headers and
//!   body stream through unchanged
//! - Upstream failures map to 502

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        header, Request, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
};
use hyper_util::client::legacy::{connect::HttpConnector, Client};

use crate::handoff::{Replacer, RequestSnapshot, RouteGroup, ServerHandle};
use crate::http::request::RequestIdExt;

/// An upstream to forward a route's traffic to.
#[derive(Clone)]
pub struct Upstream {
    client: Client<HttpConnector, Body>,
    authority: Authority,
}

impl Upstream {
    pub fn new(client: Client<HttpConnector, Body>, authority: Authority) -> Self {
        Self { client, authority }
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }
}

/// Forward the request to the upstream and stream its response back.
pub async fn forward(State(upstream): State<Upstream>, request: Request<Body>) -> Response {
    let request_id = request
        .request_id()
        .map(|id| id.as_str().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let (mut parts, body) = request.into_parts();

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(upstream.authority.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream URI");
            return (StatusCode::BAD_GATEWAY, "Invalid upstream URI").into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        upstream = %upstream.authority,
        uri = %parts.uri,
        "Forwarding request"
    );

    match upstream.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                upstream = %upstream.authority,
                error = %e,
                "Upstream error"
            );
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

/// Render the route's template with the request's replacer.
pub async fn respond(State(template): State<Arc<str>>, mut request: Request<Body>) -> Response {
    let mut replacer = request
        .extensions_mut()
        .remove::<Replacer>()
        .unwrap_or_default();
    fill_request_placeholders(&mut replacer, &request);

    (StatusCode::OK, replacer.replace_all(&template, "")).into_response()
}

/// Record the standard `http.*` placeholders for `request`.
pub fn fill_request_placeholders<B>(replacer: &mut Replacer, request: &Request<B>) {
    replacer.set("http.request.method", request.method().as_str());
    replacer.set("http.request.uri", request.uri().to_string());
    replacer.set("http.request.path", request.uri().path());

    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().host());
    if let Some(host) = host {
        replacer.set("http.request.host", host);
    }

    if let Some(id) = request.request_id() {
        replacer.set("http.request.id", id.as_str());
    }

    let ext = request.extensions();
    if let Some(server) = ext.get::<ServerHandle>() {
        replacer.set("http.server.name", server.name());
    }
    if let Some(group) = ext.get::<RouteGroup>() {
        replacer.set("http.route.groups", group.to_string());
    }
    if let Some(original) = ext.get::<RequestSnapshot>() {
        replacer.set("http.original.method", original.method.as_str());
        replacer.set("http.original.uri", original.uri.to_string());
    }
}
