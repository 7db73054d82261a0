//! Knock probe scheduling.
//!
//! # Responsibilities
//! - Send a bounded burst of GET probes to the knock URL
//! - Space probes by a fixed interval (one second in production)
//! - Stop early when shutdown is signalled
//!
//! # Design Decisions
//! - Fire-and-forget: bodies, statuses and errors are logged and counted,
//!   never retried and never surfaced to request serving
//! - The interval elapses before every probe, including the first

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::KnockConfig;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;

/// Spacing between knock probes.
pub const KNOCK_INTERVAL: Duration = Duration::from_secs(1);

/// A pending knock burst.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSequence {
    pub url: String,
    pub remaining: u32,
    pub interval: Duration,
}

impl ProbeSequence {
    /// A sequence of `count` probes; zero is treated as one.
    pub fn new(url: impl Into<String>, count: u32) -> Self {
        Self {
            url: url.into(),
            remaining: count.max(1),
            interval: KNOCK_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl From<&KnockConfig> for ProbeSequence {
    fn from(knock: &KnockConfig) -> Self {
        Self::new(knock.url.clone(), knock.count)
    }
}

/// What a finished sequence did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeReport {
    /// Probes sent, successful or not.
    pub sent: u32,
    /// Probes that errored or got a non-2xx status.
    pub failed: u32,
    /// The sequence stopped on shutdown before completing.
    pub cancelled: bool,
}

/// Sends knock probes with a shared HTTP client.
#[derive(Debug, Clone)]
pub struct ProbeScheduler {
    client: reqwest::Client,
}

impl ProbeScheduler {
    /// Scheduler whose probes time out after `probe_timeout`.
    pub fn new(probe_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(probe_timeout)
            .user_agent(concat!("teleport-bridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default knock client");
                reqwest::Client::new()
            });
        Self::with_client(client)
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Run the sequence to completion or until shutdown.
    pub async fn run(
        &self,
        mut sequence: ProbeSequence,
        mut shutdown: ShutdownSignal,
    ) -> ProbeReport {
        let mut report = ProbeReport::default();

        tracing::info!(
            url = %sequence.url,
            count = sequence.remaining,
            interval = ?sequence.interval,
            "Knock sequence starting"
        );

        while sequence.remaining > 0 {
            tokio::select! {
                _ = tokio::time::sleep(sequence.interval) => {}
                _ = shutdown.recv() => {
                    tracing::info!(url = %sequence.url, remaining = sequence.remaining, "Knock sequence cancelled");
                    report.cancelled = true;
                    break;
                }
            }

            sequence.remaining -= 1;
            report.sent += 1;

            match self.client.get(&sequence.url).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(url = %sequence.url, status = %response.status(), "Knock sent");
                    metrics::record_knock("ok");
                }
                Ok(response) => {
                    tracing::debug!(url = %sequence.url, status = %response.status(), "Knock answered with non-success status");
                    metrics::record_knock("status");
                    report.failed += 1;
                }
                Err(e) => {
                    tracing::debug!(url = %sequence.url, error = %e, "Knock failed");
                    metrics::record_knock("error");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            url = %sequence.url,
            sent = report.sent,
            failed = report.failed,
            "Knock sequence finished"
        );
        report
    }

    /// Run the sequence on its own task. The handle resolves with the report.
    pub fn spawn(
        &self,
        sequence: ProbeSequence,
        shutdown: ShutdownSignal,
    ) -> JoinHandle<ProbeReport> {
        let scheduler = self.clone();
        tokio::spawn(async move { scheduler.run(sequence, shutdown).await })
    }
}
