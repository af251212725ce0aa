// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Exponential backoff for Kubernetes API retries and Azure operation polling.
//!
//! Kubernetes calls are retried on transient errors (429, 5xx, connection
//! failures) and fail fast on everything else. Long-running Azure Resource
//! Manager operations reuse the same backoff type to space out status polls.

use crate::errors::{Error, Result};
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Maximum total time to spend retrying a Kubernetes call (2 minutes)
const MAX_ELAPSED_TIME_SECS: u64 = 120;

/// Initial retry interval (100ms)
const INITIAL_INTERVAL_MILLIS: u64 = 100;

/// Maximum interval between retries (10 seconds)
const MAX_INTERVAL_SECS: u64 = 10;

/// Backoff multiplier (exponential growth factor)
const BACKOFF_MULTIPLIER: f64 = 2.0;

/// First poll of a long-running Azure operation (1 second)
const POLL_INITIAL_INTERVAL_MILLIS: u64 = 1000;

/// Maximum interval between polls (15 seconds)
const POLL_MAX_INTERVAL_SECS: u64 = 15;

/// Give up on a long-running Azure operation after 15 minutes
const POLL_MAX_ELAPSED_TIME_SECS: u64 = 900;

/// Exponential backoff bounded by a maximum interval and total elapsed time.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// Interval returned by the next call to [`ExponentialBackoff::next_backoff`]
    pub current_interval: Duration,
    /// First interval
    pub initial_interval: Duration,
    /// Upper bound of a single interval
    pub max_interval: Duration,
    /// Upper bound of the total time spent, `None` for unbounded
    pub max_elapsed_time: Option<Duration>,
    /// Growth factor applied after every interval
    pub multiplier: f64,
    start_time: Instant,
}

impl ExponentialBackoff {
    /// Create a backoff starting now.
    #[must_use]
    pub fn new(
        initial_interval: Duration,
        max_interval: Duration,
        max_elapsed_time: Option<Duration>,
        multiplier: f64,
    ) -> Self {
        Self {
            current_interval: initial_interval,
            initial_interval,
            max_interval,
            max_elapsed_time,
            multiplier,
            start_time: Instant::now(),
        }
    }

    /// Next interval to wait, or `None` once the elapsed time budget is spent.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if let Some(max_elapsed) = self.max_elapsed_time {
            if self.start_time.elapsed() >= max_elapsed {
                return None;
            }
        }

        let interval = self.current_interval;
        let next = interval.as_secs_f64() * self.multiplier;
        self.current_interval = Duration::from_secs_f64(next).min(self.max_interval);

        Some(interval)
    }
}

/// Backoff for Kubernetes API retries.
///
/// 100ms, 200ms, 400ms ... capped at 10s, for at most 2 minutes.
#[must_use]
pub fn default_backoff() -> ExponentialBackoff {
    ExponentialBackoff::new(
        Duration::from_millis(INITIAL_INTERVAL_MILLIS),
        Duration::from_secs(MAX_INTERVAL_SECS),
        Some(Duration::from_secs(MAX_ELAPSED_TIME_SECS)),
        BACKOFF_MULTIPLIER,
    )
}

/// Backoff between status polls of a long-running Azure operation.
///
/// 1s, 2s, 4s, 8s then every 15s, for at most 15 minutes. Storage account
/// creation usually completes within the first few polls.
#[must_use]
pub fn poll_backoff() -> ExponentialBackoff {
    ExponentialBackoff::new(
        Duration::from_millis(POLL_INITIAL_INTERVAL_MILLIS),
        Duration::from_secs(POLL_MAX_INTERVAL_SECS),
        Some(Duration::from_secs(POLL_MAX_ELAPSED_TIME_SECS)),
        BACKOFF_MULTIPLIER,
    )
}

/// Whether an HTTP status denotes a transient failure (429, 500, 502, 503, 504).
#[must_use]
pub fn is_retryable_http_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Retry a Kubernetes API call with exponential backoff.
///
/// # Arguments
///
/// * `operation` - Closure performing the API call
/// * `operation_name` - Human-readable name for logging (e.g. "patch bucket status")
///
/// # Errors
///
/// Returns the last [`kube::Error`] as [`Error::ControlPlane`] when the error is
/// not retryable or the backoff is exhausted.
pub async fn retry_api_call<T, F, Fut>(mut operation: F, operation_name: &str) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = std::result::Result<T, kube::Error>>,
{
    let mut backoff = default_backoff();
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt, "Kubernetes API call succeeded after retries"
                    );
                }
                return Ok(value);
            }
            Err(e) if !is_retryable_error(&e) => {
                return Err(Error::ControlPlane(e));
            }
            Err(e) => match backoff.next_backoff() {
                Some(duration) => {
                    warn!(
                        operation = operation_name,
                        attempt,
                        retry_after = ?duration,
                        error = %e,
                        "Retryable Kubernetes API error, will retry"
                    );
                    tokio::time::sleep(duration).await;
                }
                None => {
                    error!(
                        operation = operation_name,
                        attempt,
                        error = %e,
                        "Backoff exhausted, giving up"
                    );
                    return Err(Error::ControlPlane(e));
                }
            },
        }
    }
}

/// Transient Kubernetes errors: 429, 5xx and transport failures.
fn is_retryable_error(err: &kube::Error) -> bool {
    match err {
        kube::Error::Api(status) => status.code == 429 || (500..600).contains(&status.code),
        kube::Error::Service(_) => true,
        _ => false,
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
