//! Provisioning hook for a teleport station.
//!
//! `Teleport::provision` returns immediately: the knock sequence and the
//! station serve loop each run on their own task with their own shutdown
//! receiver, and the returned handles report when they finish.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::StationConfig;
use crate::handoff::binder::tunnel_router;
use crate::handoff::state::HandoffState;
use crate::knock::{ProbeReport, ProbeScheduler, ProbeSequence};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::station::StationServer;

/// A provisioned station and its background tasks.
#[derive(Debug)]
pub struct Teleport {
    pub config: StationConfig,
    pub state: Arc<HandoffState>,
    pub station_task: JoinHandle<()>,
    pub knock_task: Option<JoinHandle<ProbeReport>>,
}

impl Teleport {
    /// Start exposing `config.station` with a fresh handoff state.
    /// Tunnel requests are cut off after `request_timeout`.
    pub fn provision(
        config: StationConfig,
        request_timeout: Duration,
        station: Arc<dyn StationServer>,
        probes: &ProbeScheduler,
        shutdown: &Shutdown,
    ) -> Self {
        Self::provision_with_state(
            config,
            Arc::new(HandoffState::new()),
            request_timeout,
            station,
            probes,
            shutdown,
        )
    }

    /// Start exposing `config.station` backed by an existing handoff state.
    pub fn provision_with_state(
        config: StationConfig,
        state: Arc<HandoffState>,
        request_timeout: Duration,
        station: Arc<dyn StationServer>,
        probes: &ProbeScheduler,
        shutdown: &Shutdown,
    ) -> Self {
        tracing::info!(
            station = %config.station,
            knock = config.knock_url().unwrap_or("none"),
            "Provisioning teleport station"
        );

        let knock_task = config.knock.as_ref().map(|knock| {
            probes.spawn(ProbeSequence::from(knock), shutdown.subscribe())
        });

        let name = config.station.clone();
        let handler = tunnel_router(state.clone(), request_timeout);
        let rx = shutdown.subscribe();
        let station_task = tokio::spawn(async move {
            match station.serve(name.clone(), handler, rx).await {
                Ok(()) => tracing::info!(station = %name, "Station stopped"),
                Err(e) => {
                    metrics::record_station_error();
                    tracing::error!(
                        station = %name,
                        error = %e,
                        "Station serve failed; continuing without tunnel exposure"
                    );
                }
            }
        });

        Self {
            config,
            state,
            station_task,
            knock_task,
        }
    }

    pub fn state(&self) -> Arc<HandoffState> {
        self.state.clone()
    }
}
