//! HTTP fetcher implementation
//!
//! This module handles all requests to the score endpoint, including:
//! - Building the shared HTTP client
//! - A single classified attempt per identifier (`Probe`)
//! - Retrying transient failures under a `RetryPolicy` (`Fetcher`)

use crate::config::EndpointConfig;
use crate::crawler::payload::{self, Payload};
use crate::crawler::retry::{RetryPolicy, RetryReason};
use crate::identifier::Identifier;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

/// Result of probing one identifier
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The endpoint holds at least one record for the identifier
    Success { payload: Payload },

    /// The endpoint answered and confirmed there is no record
    Empty,

    /// The attempt hit a transient condition
    ///
    /// Only a single attempt produces this; [`Fetcher::fetch`] never
    /// returns it.
    Retryable { reason: RetryReason },

    /// Every attempt hit a transient condition; counted as a miss
    Exhausted,
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// One attempt at fetching an identifier
///
/// Implemented over HTTP by [`HttpProbe`]; tests plug in synthetic probes.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, identifier: &Identifier, year: u16) -> FetchOutcome;
}

/// Builds the HTTP client shared by every request of a run
///
/// Connecting and the whole request are each bounded by the configured
/// per-attempt timeout.
pub fn build_http_client(config: &EndpointConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .timeout(config.request_timeout())
        .connect_timeout(config.request_timeout())
        .gzip(true)
        .brotli(true);

    if let Some(user_agent) = &config.user_agent {
        builder = builder.user_agent(user_agent.as_str());
    }

    builder.build()
}

/// Probes the score endpoint over HTTP
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    base_url: Url,
}

impl HttpProbe {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Request target for `identifier`: `<base-url>?sbd=<identifier>&year=<year>`
    pub fn request_url(&self, identifier: &Identifier, year: u16) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("sbd", identifier.as_str())
            .append_pair("year", &year.to_string());
        url
    }
}

#[async_trait]
impl Probe for HttpProbe {
    /// Classifies one GET request
    ///
    /// | Response | Outcome |
    /// |----------|---------|
    /// | 200, success flag and positive total | `Success` |
    /// | 200, otherwise | `Empty` |
    /// | 200, body is not JSON | `Retryable(Malformed)` |
    /// | 429 | `Retryable(RateLimited)` |
    /// | any other status | `Retryable(HttpStatus)` |
    /// | timeout | `Retryable(Timeout)` |
    /// | connection/client error | `Retryable(Network)` |
    async fn probe(&self, identifier: &Identifier, year: u16) -> FetchOutcome {
        let url = self.request_url(identifier, year);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return retryable(classify_error(&e)),
        };

        match response.status() {
            StatusCode::OK => {}
            StatusCode::TOO_MANY_REQUESTS => return retryable(RetryReason::RateLimited),
            status => return retryable(RetryReason::HttpStatus(status.as_u16())),
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return retryable(classify_error(&e)),
        };

        match payload::decode(&body) {
            Ok(Some(payload)) => FetchOutcome::Success { payload },
            Ok(None) => FetchOutcome::Empty,
            Err(e) => retryable(RetryReason::Malformed(e.to_string())),
        }
    }
}

fn retryable(reason: RetryReason) -> FetchOutcome {
    FetchOutcome::Retryable { reason }
}

fn classify_error(error: &reqwest::Error) -> RetryReason {
    if error.is_timeout() {
        RetryReason::Timeout
    } else {
        RetryReason::Network(error.to_string())
    }
}

/// Fetches identifiers through a probe, retrying transient failures
pub struct Fetcher<P> {
    probe: P,
    policy: RetryPolicy,
}

impl<P: Probe> Fetcher<P> {
    pub fn new(probe: P, policy: RetryPolicy) -> Self {
        Self { probe, policy }
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Fetches `identifier` for `year`
    ///
    /// Every transient failure is followed by its backoff delay, the last
    /// one included, so a fully rate-limited identifier also spaces out the
    /// requests that come after it. Returns `Success`, `Empty` or
    /// `Exhausted`; the latter means "persistently unreachable" and is
    /// treated exactly like `Empty` downstream.
    pub async fn fetch(&self, identifier: &Identifier, year: u16) -> FetchOutcome {
        let max_attempts = self.policy.max_attempts();

        for attempt in 1..=max_attempts {
            match self.probe.probe(identifier, year).await {
                FetchOutcome::Success { payload } => {
                    tracing::info!("{}: found, total={}", identifier, payload.total);
                    return FetchOutcome::Success { payload };
                }
                FetchOutcome::Empty => {
                    tracing::debug!("{}: no record", identifier);
                    return FetchOutcome::Empty;
                }
                FetchOutcome::Exhausted => {
                    tracing::warn!("{}: probe gave up", identifier);
                    return FetchOutcome::Exhausted;
                }
                FetchOutcome::Retryable { reason } => {
                    let delay = self
                        .policy
                        .delay_for(&reason, attempt, &mut rand::thread_rng());
                    tracing::warn!(
                        "{}: {} (attempt {}/{}), waiting {:.2}s",
                        identifier,
                        reason,
                        attempt,
                        max_attempts,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        tracing::warn!("{}: retries exhausted, counting as miss", identifier);
        FetchOutcome::Exhausted
    }
}
