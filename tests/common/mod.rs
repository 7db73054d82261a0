//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use teleport_bridge::config::{BridgeConfig, RouteConfig};

/// One request seen by a recording backend.
#[derive(Debug, Clone)]
pub struct Hit {
    pub at: Instant,
    pub request_line: String,
}

/// Start a simple mock backend that returns a fixed response.
#[allow(dead_code)]
pub async fn start_mock_backend(addr: SocketAddr, response: &'static str) {
    start_recording_backend(addr, 200, response).await;
}

/// Start a backend that answers every request with `status`/`body` and
/// records when each request arrived.
#[allow(dead_code)]
pub async fn start_recording_backend(
    addr: SocketAddr,
    status: u16,
    body: &'static str,
) -> Arc<Mutex<Vec<Hit>>> {
    let listener = TcpListener::bind(addr).await.unwrap();
    let hits = Arc::new(Mutex::new(Vec::new()));
    let recorded = hits.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        let head = read_head(&mut socket).await;
                        let request_line = head.lines().next().unwrap_or_default().to_string();
                        recorded.lock().unwrap().push(Hit {
                            at: Instant::now(),
                            request_line,
                        });

                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    hits
}

/// Read an HTTP request head (up to the blank line).
pub async fn read_head(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// A config with a single teleported route rendering its ambient context.
#[allow(dead_code)]
pub fn teleport_config(proxy: SocketAddr, station: &str) -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.listener.bind_address = proxy.to_string();
    config.listener.server_name = "edge".into();
    config.teleport = Some(station.to_string());
    config.tunnel.redial_base_ms = 50;
    config.tunnel.redial_max_ms = 200;
    config.routes.push(RouteConfig {
        name: "app".into(),
        path: "/{*path}".into(),
        groups: vec!["public".into()],
        upstream: None,
        respond: Some(
            "{http.request.method} {http.request.path} first={http.original.uri} \
             server={http.server.name} groups={http.route.groups}"
                .into(),
        ),
        teleport: true,
        delay: false,
    });
    config
}

/// HTTP client that never pools or proxies.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}
