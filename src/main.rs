//! teleport-bridge
//!
//! # Architecture Overview
//!
//! ```text
//!   Local client ──▶ listener ──▶ ambient ──▶ teleport ──▶ [delay] ──▶ forward / respond
//!                                              │  ▲
//!                                   first req  │  │ captured chain
//!                                   binds      ▼  │
//!                                         ┌──────────────┐
//!   Remote client ──▶ station ──────────▶ │ HandoffState │
//!   (listen:// or dial://)   tunnel_router └──────────────┘
//!
//!   provisioning: knock probes (1s apart) + station serve, both on own tasks
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use teleport_bridge::admin::{setup_admin_router, AdminState};
use teleport_bridge::config::loader::load_config;
use teleport_bridge::handoff::Teleport;
use teleport_bridge::http::HttpServer;
use teleport_bridge::knock::ProbeScheduler;
use teleport_bridge::lifecycle::{signalled, signals, Shutdown};
use teleport_bridge::observability::{logging, metrics};
use teleport_bridge::resilience::Backoff;
use teleport_bridge::station::DirectStation;

#[derive(Parser)]
#[command(name = "teleport-bridge", version)]
#[command(about = "Expose a local handler chain under a remote station", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "teleport.toml")]
    config: PathBuf,

    /// Override the station from the teleport directive.
    #[arg(long)]
    station: Option<String>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    logging::init(&config.observability)?;

    let mut station = config.station()?;
    if let Some(name) = cli.station {
        match station.as_mut() {
            Some(station) => station.station = name,
            None => tracing::warn!(station = %name, "--station ignored: no teleport directive configured"),
        }
    }

    tracing::info!(
        config = %cli.config.display(),
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        station = station.as_ref().map(|s| s.station.as_str()).unwrap_or("none"),
        "Configuration loaded"
    );

    if cli.check {
        tracing::info!("Configuration OK");
        return Ok(());
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();

    let teleport = station.clone().map(|station_config| {
        let transport = Arc::new(DirectStation::new(Backoff::from(&config.tunnel)));
        let probes = ProbeScheduler::new(Duration::from_secs(config.timeouts.knock_secs));
        Teleport::provision(
            station_config,
            Duration::from_secs(config.timeouts.request_secs),
            transport,
            &probes,
            &shutdown,
        )
    });
    let handoff = teleport.as_ref().map(Teleport::state);

    if config.admin.enabled {
        let admin = setup_admin_router(AdminState {
            station,
            handoff: handoff.clone(),
        });
        let admin_listener = TcpListener::bind(&config.admin.bind_address).await?;
        let admin_shutdown = shutdown.subscribe();
        tracing::info!(address = %config.admin.bind_address, "Admin endpoint listening");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(admin_listener, admin)
                .with_graceful_shutdown(signalled(admin_shutdown))
                .await
            {
                tracing::error!(error = %e, "Admin server failed");
            }
        });
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config, handoff);
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let exited_early = tokio::select! {
        _ = signals::wait_for_signal() => None,
        res = &mut server_task => Some(res),
    };
    if exited_early.is_some() {
        tracing::error!("HTTP server exited before shutdown was requested");
    }
    shutdown.trigger();

    match exited_early {
        Some(res) => res??,
        None => server_task.await??,
    }
    if let Some(teleport) = teleport {
        let _ = teleport.station_task.await;
        if let Some(knock) = teleport.knock_task {
            let _ = knock.await;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
