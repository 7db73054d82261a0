//! Exponential backoff with jitter for station redials.

use std::time::Duration;

use rand::Rng;

use crate::config::TunnelConfig;

/// Redial delay policy: `base * 2^(attempt-1)`, capped at `max`, plus up to
/// 10% jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// Delay before attempt number `attempt` (1-based). Attempt 0 is immediate.
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base_ms = self.base.as_millis() as u64;
        let max_ms = self.max.as_millis() as u64;
        let factor = 2u64.saturating_pow(attempt - 1);
        let capped = base_ms.saturating_mul(factor).min(max_ms);

        let jitter_range = capped / 10;
        let jitter = if jitter_range > 0 {
            rand::thread_rng().gen_range(0..jitter_range)
        } else {
            0
        };

        Duration::from_millis(capped + jitter)
    }
}

impl From<&TunnelConfig> for Backoff {
    fn from(config: &TunnelConfig) -> Self {
        Self::new(
            Duration::from_millis(config.redial_base_ms),
            Duration::from_millis(config.redial_max_ms),
        )
    }
}
