//! End-to-end handoff: local server, teleport station, tunnel requests.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use teleport_bridge::config::BridgeConfig;
use teleport_bridge::knock::ProbeScheduler;
use teleport_bridge::resilience::Backoff;
use teleport_bridge::station::DirectStation;
use teleport_bridge::{HttpServer, Shutdown, Teleport};

struct Running {
    shutdown: Shutdown,
    teleport: Teleport,
    server: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

async fn start(config: BridgeConfig) -> Running {
    let shutdown = Shutdown::new();
    let station_config = config.station().unwrap().unwrap();
    let station = Arc::new(DirectStation::new(Backoff::from(&config.tunnel)));
    let teleport = Teleport::provision(
        station_config,
        Duration::from_secs(config.timeouts.request_secs),
        station,
        &ProbeScheduler::new(Duration::from_secs(1)),
        &shutdown,
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let server = HttpServer::new(config, Some(teleport.state()));
    let server = tokio::spawn(server.run(listener, shutdown.subscribe()));

    // Let the station come up.
    tokio::time::sleep(Duration::from_millis(200)).await;

    Running {
        shutdown,
        teleport,
        server,
    }
}

impl Running {
    async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.teleport.station_task)
            .await
            .expect("station did not stop")
            .unwrap();
        tokio::time::timeout(Duration::from_secs(5), self.server)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();
    }
}

async fn get(client: &reqwest::Client, url: String) -> (u16, String) {
    let response = client.get(url).send().await.unwrap();
    let status = response.status().as_u16();
    (status, response.text().await.unwrap())
}

#[tokio::test]
async fn test_listen_station_serves_bound_chain() {
    let proxy: SocketAddr = "127.0.0.1:28411".parse().unwrap();
    let station = "127.0.0.1:28412";
    let running = start(common::teleport_config(proxy, &format!("listen://{station}"))).await;
    let client = common::client();

    // Nothing bound yet: the tunnel has no chain to serve.
    let (status, _) = get(&client, format!("http://{station}/early")).await;
    assert_eq!(status, 404);
    assert!(!running.teleport.state.is_bound());

    let (status, body) = get(&client, format!("http://{proxy}/first")).await;
    assert_eq!(status, 200);
    assert_eq!(body, "GET /first first=/first server=edge groups=app,public");
    assert!(running.teleport.state.is_bound());

    let (status, body) = get(&client, format!("http://{station}/later")).await;
    assert_eq!(status, 200);
    assert_eq!(body, "GET /later first=/first server=edge groups=app,public");

    // Later local requests run against the frozen context too.
    let (status, body) = get(&client, format!("http://{proxy}/second")).await;
    assert_eq!(status, 200);
    assert_eq!(body, "GET /second first=/first server=edge groups=app,public");

    running.stop().await;
}

#[tokio::test]
async fn test_tunnel_forwards_to_upstream_of_bound_route() {
    let backend: SocketAddr = "127.0.0.1:28431".parse().unwrap();
    let proxy: SocketAddr = "127.0.0.1:28432".parse().unwrap();
    let station = "127.0.0.1:28433";
    common::start_mock_backend(backend, "Hello from backend").await;

    let mut config = common::teleport_config(proxy, &format!("listen://{station}"));
    config.routes[0].respond = None;
    config.routes[0].upstream = Some(backend.to_string());
    let running = start(config).await;
    let client = common::client();

    let (status, body) = get(&client, format!("http://{proxy}/api")).await;
    assert_eq!(status, 200);
    assert_eq!(body, "Hello from backend");

    let (status, body) = get(&client, format!("http://{station}/api")).await;
    assert_eq!(status, 200);
    assert_eq!(body, "Hello from backend");

    running.stop().await;
}

async fn relay_request(relay: &TcpListener, path: &str) -> String {
    let (mut socket, _): (TcpStream, _) = tokio::time::timeout(Duration::from_secs(5), relay.accept())
        .await
        .expect("station never dialed the relay")
        .unwrap();

    let request = format!("GET {path} HTTP/1.1\r\nHost: relay\r\nConnection: close\r\n\r\n");
    socket.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), socket.read_to_end(&mut response))
        .await
        .expect("station never answered")
        .unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

#[tokio::test]
async fn test_dial_station_serves_relay_requests() {
    let proxy: SocketAddr = "127.0.0.1:28421".parse().unwrap();
    let relay = TcpListener::bind("127.0.0.1:28422").await.unwrap();
    let running = start(common::teleport_config(proxy, "dial://127.0.0.1:28422")).await;
    let client = common::client();

    let response = relay_request(&relay, "/early").await;
    assert!(response.starts_with("HTTP/1.1 404"), "{response}");

    let (status, _) = get(&client, format!("http://{proxy}/first")).await;
    assert_eq!(status, 200);

    // The station redials after the relay closes the previous connection.
    let response = relay_request(&relay, "/via-relay").await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.ends_with("GET /via-relay first=/first server=edge groups=app,public"));

    running.stop().await;
}
