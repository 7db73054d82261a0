//! Plain TCP station transport.
//!
//! # Station forms
//! - `listen://host:port`: accept connections on a local socket
//! - `dial://host:port`: reverse connection, dial out and serve HTTP/1.1
//!   over the outbound socket, redialing with backoff when it ends

use axum::Router;
use futures_util::future::{BoxFuture, FutureExt};
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use tokio::net::{TcpListener, TcpStream};

use crate::lifecycle::{signalled, ShutdownSignal};
use crate::resilience::Backoff;
use crate::station::{StationError, StationServer};

/// Where a station is reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationEndpoint {
    Listen(String),
    Dial(String),
}

impl StationEndpoint {
    pub fn parse(station: &str) -> Result<Self, StationError> {
        let invalid = |reason: &str| StationError::InvalidStation {
            station: station.to_string(),
            reason: reason.to_string(),
        };

        let url = url::Url::parse(station).map_err(|e| invalid(&e.to_string()))?;
        let endpoint: fn(String) -> Self = match url.scheme() {
            "listen" => Self::Listen,
            "dial" => Self::Dial,
            other => return Err(StationError::UnsupportedScheme(other.to_string())),
        };

        let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
        let port = url.port().ok_or_else(|| invalid("missing port"))?;
        Ok(endpoint(format!("{host}:{port}")))
    }
}

/// TCP station transport.
#[derive(Debug, Clone)]
pub struct DirectStation {
    redial: Backoff,
}

impl DirectStation {
    pub fn new(redial: Backoff) -> Self {
        Self { redial }
    }
}

impl StationServer for DirectStation {
    fn serve(
        &self,
        station: String,
        handler: Router,
        shutdown: ShutdownSignal,
    ) -> BoxFuture<'static, Result<(), StationError>> {
        let redial = self.redial;
        async move {
            match StationEndpoint::parse(&station)? {
                StationEndpoint::Listen(address) => serve_listen(&address, handler, shutdown).await,
                StationEndpoint::Dial(address) => {
                    serve_dial(&address, handler, shutdown, redial).await
                }
            }
        }
        .boxed()
    }
}

async fn serve_listen(
    address: &str,
    handler: Router,
    shutdown: ShutdownSignal,
) -> Result<(), StationError> {
    let listener = TcpListener::bind(address).await?;
    tracing::info!(address = %listener.local_addr()?, "Station listening");

    axum::serve(listener, handler)
        .with_graceful_shutdown(signalled(shutdown))
        .await?;

    tracing::info!(address, "Station listener stopped");
    Ok(())
}

async fn serve_dial(
    address: &str,
    handler: Router,
    mut shutdown: ShutdownSignal,
    redial: Backoff,
) -> Result<(), StationError> {
    let mut attempt = 0u32;

    loop {
        let connected = tokio::select! {
            res = TcpStream::connect(address) => res,
            _ = shutdown.recv() => return Ok(()),
        };

        match connected {
            Ok(stream) => {
                attempt = 0;
                tracing::info!(address, "Station connected");

                let service = TowerToHyperService::new(handler.clone());
                let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);

                tokio::select! {
                    res = connection => match res {
                        Ok(()) => tracing::info!(address, "Station connection closed"),
                        Err(e) => tracing::warn!(address, error = %e, "Station connection failed"),
                    },
                    _ = shutdown.recv() => return Ok(()),
                }
            }
            Err(e) => {
                tracing::warn!(address, attempt, error = %e, "Station dial failed");
            }
        }

        attempt = attempt.saturating_add(1);
        let delay = redial.delay(attempt);
        tracing::debug!(address, ?delay, "Station redialing");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.recv() => return Ok(()),
        }
    }
}
