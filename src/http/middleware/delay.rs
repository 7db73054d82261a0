//! Random delay middleware.
//!
//! Sleeps a uniformly random duration in `[min, max)` and then forwards.
//! Stateless; each request draws its own delay.

use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use rand::Rng;

use crate::config::DelayConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delay {
    min: Duration,
    max: Duration,
}

impl Delay {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// Draw a delay. A degenerate range always yields `min`.
    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..self.max)
    }
}

impl From<&DelayConfig> for Delay {
    fn from(config: &DelayConfig) -> Self {
        Self::new(
            Duration::from_millis(config.min_ms),
            Duration::from_millis(config.max_ms),
        )
    }
}

pub async fn delay_middleware(
    State(delay): State<Delay>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let pause = delay.sample();
    tracing::debug!(?pause, path = %request.uri().path(), "delay start");
    tokio::time::sleep(pause).await;
    tracing::debug!("delay end");

    next.run(request).await
}
