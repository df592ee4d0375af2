// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Randomized exponential backoff for transient API failures.

use std::time::Duration;

use minuta_config::model::OpenAiConfig;
use rand::Rng;

/// Attempt budget and backoff window for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; never less than one.
    pub max_attempts: u32,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl From<&OpenAiConfig> for RetryPolicy {
    fn from(config: &OpenAiConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            min_backoff: Duration::from_secs(config.min_backoff_secs),
            max_backoff: Duration::from_secs(config.max_backoff_secs),
        }
    }
}

impl RetryPolicy {
    /// Retries immediately; for tests against a local mock server.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            min_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Upper bound of the wait after the `attempt`-th failure (1-based):
    /// `2^attempt` seconds capped at `max_backoff`.
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let exp = Duration::from_secs(1u64 << attempt.min(16));
        exp.min(self.max_backoff)
    }

    /// Wait after the `attempt`-th failure: uniform in `[0, ceiling]`,
    /// then clamped into `[min_backoff, max_backoff]`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let ceiling = self.ceiling(attempt).as_secs_f64();
        let drawn = if ceiling > 0.0 {
            rand::thread_rng().gen_range(0.0..=ceiling)
        } else {
            0.0
        };
        Duration::from_secs_f64(drawn).clamp(self.min_backoff, self.max_backoff.max(self.min_backoff))
    }
}
