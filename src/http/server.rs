//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with one chain per configured route
//! - Inject ambient context on every route (outermost layer)
//! - Wire up handoff and delay middleware where routes ask for them
//! - Wire up cross-cutting layers (tracing, timeout, request ID)
//! - Serve until shutdown is signalled
//!
//! # Chain per route
//! ```text
//! ambient_context → [handoff_middleware] → [delay_middleware] → forward | respond
//! ```

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{uri::Authority, StatusCode},
    middleware,
    routing::{any, MethodRouter},
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{BridgeConfig, RouteConfig};
use crate::handoff::{handoff_middleware, HandoffState, ServerHandle};
use crate::http::ambient::{ambient_context, RouteContext};
use crate::http::handlers::{forward, respond, Upstream};
use crate::http::middleware::{delay_middleware, Delay};
use crate::http::request::RequestIdLayer;
use crate::lifecycle::{signalled, ShutdownSignal};

/// Local HTTP server hosting the handler chains.
pub struct HttpServer {
    router: Router,
    config: BridgeConfig,
    server: ServerHandle,
}

impl HttpServer {
    /// Create a server. `handoff` is the state shared with the teleport
    /// station; routes with `teleport = true` bind into it.
    pub fn new(config: BridgeConfig, handoff: Option<Arc<HandoffState>>) -> Self {
        let server = ServerHandle::new(
            config.listener.server_name.clone(),
            config.listener.bind_address.clone(),
        );
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let router = Self::build_router(&config, &server, &client, handoff.as_ref());
        Self {
            router,
            config,
            server,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        config: &BridgeConfig,
        server: &ServerHandle,
        client: &Client<HttpConnector, Body>,
        handoff: Option<&Arc<HandoffState>>,
    ) -> Router {
        let mut router = Router::new();

        for route in &config.routes {
            if let Some(chain) = build_route(route, config, server, client, handoff) {
                router = router.route(&route.path, chain);
            }
        }

        router
            .fallback(|| async { (StatusCode::NOT_FOUND, "No matching route found") })
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            server = %self.server.name(),
            routes = self.config.routes.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(signalled(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The assembled router, for serving elsewhere or testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn server_handle(&self) -> &ServerHandle {
        &self.server
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}

fn build_route(
    route: &RouteConfig,
    config: &BridgeConfig,
    server: &ServerHandle,
    client: &Client<HttpConnector, Body>,
    handoff: Option<&Arc<HandoffState>>,
) -> Option<MethodRouter> {
    let mut chain: MethodRouter = match (&route.upstream, &route.respond) {
        (Some(upstream), None) => match Authority::from_str(upstream) {
            Ok(authority) => any(forward).with_state(Upstream::new(client.clone(), authority)),
            Err(e) => {
                tracing::error!(route = %route.name, upstream = %upstream, error = %e, "Invalid upstream, route skipped");
                return None;
            }
        },
        (None, Some(template)) => any(respond).with_state(Arc::<str>::from(template.as_str())),
        _ => {
            tracing::error!(route = %route.name, "Route needs exactly one of upstream or respond, skipped");
            return None;
        }
    };

    if route.delay && config.delay.enabled {
        chain = chain.layer(middleware::from_fn_with_state(
            Delay::from(&config.delay),
            delay_middleware,
        ));
    }

    if route.teleport {
        match handoff {
            Some(state) => {
                chain = chain.layer(middleware::from_fn_with_state(
                    state.clone(),
                    handoff_middleware,
                ));
            }
            None => tracing::warn!(route = %route.name, "Route enables teleport but no station is provisioned"),
        }
    }

    let ctx = RouteContext {
        route: Arc::from(route.name.as_str()),
        server: server.clone(),
        route_group: route.route_group().collect(),
    };
    tracing::debug!(route = %route.name, path = %route.path, teleport = route.teleport, "Route configured");

    Some(chain.layer(middleware::from_fn_with_state(ctx, ambient_context)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use tower::ServiceExt;

    fn config() -> BridgeConfig {
        let mut config = BridgeConfig::default();
        config.routes.push(RouteConfig {
            name: "app".into(),
            path: "/hello".into(),
            groups: vec!["public".into()],
            upstream: None,
            respond: Some("{http.server.name}:{http.route.groups}:{http.original.uri}".into()),
            teleport: false,
            delay: false,
        });
        config.listener.server_name = "edge".into();
        config
    }

    async fn call(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_route_sees_ambient_context() {
        let server = HttpServer::new(config(), None);
        let (status, body) = call(server.router(), "/hello").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "edge:app,public:/hello");
    }

    #[tokio::test]
    async fn test_unknown_path_falls_back() {
        let server = HttpServer::new(config(), None);
        let (status, _) = call(server.router(), "/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_teleport_route_binds_state() {
        let mut config = config();
        config.routes[0].teleport = true;
        let state = Arc::new(HandoffState::new());
        let server = HttpServer::new(config, Some(state.clone()));

        let (status, _) = call(server.router(), "/hello").await;
        assert_eq!(status, StatusCode::OK);

        let binding = state.binding().unwrap();
        assert_eq!(&binding.ambient.server, server.server_handle());
        assert_eq!(binding.ambient.original.uri, "/hello");
    }
}
