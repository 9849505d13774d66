//! Bounded retry policy for a single identifier
//!
//! The policy decides how long to wait after a failed attempt, keyed by the
//! kind of failure. It owns no I/O, so it can be driven by synthetic outcomes.
//!
//! | Failure | Delay after attempt `k` |
//! |---------|-------------------------|
//! | HTTP 429 | `k * rate_limit_step + U[0, rate_limit_jitter)` |
//! | Other HTTP status | `http_error_delay + U[0, jitter)` |
//! | Timeout | `timeout_delay + U[0, jitter)` |
//! | Network error / malformed body | `network_delay + U[0, jitter)` |

use crate::config::RetryConfig;
use rand::Rng;
use std::fmt;
use std::time::Duration;

/// Transient condition that makes an attempt worth repeating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    /// HTTP 429
    RateLimited,

    /// Any status other than 200 and 429
    HttpStatus(u16),

    /// Connect or request timeout
    Timeout,

    /// Connection or client error
    Network(String),

    /// HTTP 200 with a body that is not JSON
    Malformed(String),
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => f.write_str("HTTP 429"),
            Self::HttpStatus(code) => write!(f, "HTTP {}", code),
            Self::Timeout => f.write_str("timeout"),
            Self::Network(e) => write!(f, "network error: {}", e),
            Self::Malformed(e) => write!(f, "malformed body: {}", e),
        }
    }
}

/// Retry policy: attempt bound plus backoff per failure kind
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    rate_limit_step: Duration,
    rate_limit_jitter: Duration,
    http_error_delay: Duration,
    timeout_delay: Duration,
    network_delay: Duration,
    jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            rate_limit_step: Duration::from_millis(config.rate_limit_step_ms),
            rate_limit_jitter: Duration::from_millis(config.rate_limit_jitter_ms),
            http_error_delay: Duration::from_millis(config.http_error_delay_ms),
            timeout_delay: Duration::from_millis(config.timeout_delay_ms),
            network_delay: Duration::from_millis(config.network_delay_ms),
            jitter: Duration::from_millis(config.jitter_ms),
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Fixed part of the delay and the jitter bound after failed attempt
    /// `attempt` (1-indexed)
    pub fn backoff(&self, reason: &RetryReason, attempt: u32) -> (Duration, Duration) {
        match reason {
            RetryReason::RateLimited => (
                self.rate_limit_step
                    .checked_mul(attempt)
                    .unwrap_or(Duration::MAX),
                self.rate_limit_jitter,
            ),
            RetryReason::HttpStatus(_) => (self.http_error_delay, self.jitter),
            RetryReason::Timeout => (self.timeout_delay, self.jitter),
            RetryReason::Network(_) | RetryReason::Malformed(_) => (self.network_delay, self.jitter),
        }
    }

    /// Delay to wait after failed attempt `attempt`, jitter included
    pub fn delay_for<R: Rng + ?Sized>(&self, reason: &RetryReason, attempt: u32, rng: &mut R) -> Duration {
        let (base, jitter) = self.backoff(reason, attempt);
        base.saturating_add(random_jitter(jitter, rng))
    }
}

/// Uniform duration in `[0, bound)`; zero when the bound is zero
fn random_jitter<R: Rng + ?Sized>(bound: Duration, rng: &mut R) -> Duration {
    if bound.is_zero() {
        return Duration::ZERO;
    }
    let jitter = Duration::from_secs_f64(rng.gen_range(0.0..bound.as_secs_f64()));
    // from_secs_f64 rounds to the nearest nanosecond
    jitter.min(bound - Duration::from_nanos(1))
}
