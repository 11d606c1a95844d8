use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Request, Response, StatusCode};
use tracing::{debug, warn};

use crate::error::{Result, TokopediaError};

/// Upper bound on any single backoff sleep, including server-provided `Retry-After`.
pub const BACKOFF_MAX: Duration = Duration::from_secs(120);

/// Statuses retried when no explicit set is configured.
pub const DEFAULT_RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Statuses for which a `Retry-After` header replaces the computed backoff.
const RETRY_AFTER_STATUSES: [u16; 3] = [413, 429, 503];

/// Retry budget for the transport.
///
/// `total` caps every retry regardless of cause. `connect` and `read` cap
/// retries caused by connection-phase and read-phase failures respectively.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub total: u32,
    pub connect: u32,
    pub read: u32,
    pub backoff_factor: f64,
    pub statuses: Vec<u16>,
}

impl RetryPolicy {
    /// Same budget for every failure class, like a single `total` knob.
    pub fn new(total: u32, backoff_factor: f64, statuses: Vec<u16>) -> Self {
        Self {
            total,
            connect: total,
            read: total,
            backoff_factor,
            statuses,
        }
    }

    pub fn none() -> Self {
        Self::new(0, 0.0, Vec::new())
    }

    pub fn is_retryable_status(&self, status: StatusCode) -> bool {
        self.statuses.contains(&status.as_u16())
    }

    /// Backoff before the next attempt, given how many attempts have failed so far.
    /// The first retry goes out immediately; after that the delay doubles.
    pub fn backoff(&self, failed_attempts: u32) -> Duration {
        if failed_attempts <= 1 || self.backoff_factor <= 0.0 {
            return Duration::ZERO;
        }
        let exp = (failed_attempts - 1).min(32) as i32;
        let secs = self.backoff_factor * 2f64.powi(exp);
        if !secs.is_finite() {
            return BACKOFF_MAX;
        }
        Duration::from_secs_f64(secs).min(BACKOFF_MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, 0.5, DEFAULT_RETRY_STATUSES.to_vec())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailureKind {
    Connect,
    Read,
    Status,
}

/// Failures observed so far for one logical request.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct RetryState {
    total: u32,
    connect: u32,
    read: u32,
}

impl RetryState {
    /// Record a failure. Returns the number of failed attempts if the policy
    /// still allows another try, or `None` once the budget is spent.
    pub(crate) fn record(&mut self, policy: &RetryPolicy, kind: FailureKind) -> Option<u32> {
        self.total += 1;
        match kind {
            FailureKind::Connect => self.connect += 1,
            FailureKind::Read => self.read += 1,
            FailureKind::Status => {}
        }
        let exhausted = self.total > policy.total
            || self.connect > policy.connect
            || self.read > policy.read;
        if exhausted {
            None
        } else {
            Some(self.total)
        }
    }
}

fn classify(err: &reqwest::Error) -> FailureKind {
    if err.is_connect() {
        FailureKind::Connect
    } else {
        FailureKind::Read
    }
}

/// Server-requested delay, honoured only on statuses that define it.
fn retry_after(status: StatusCode, headers: &HeaderMap) -> Option<Duration> {
    if !RETRY_AFTER_STATUSES.contains(&status.as_u16()) {
        return None;
    }
    let secs: u64 = headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()?;
    Some(Duration::from_secs(secs).min(BACKOFF_MAX))
}

/// Send `request`, retrying transient failures under `policy`.
///
/// When the status budget runs out the last response is handed back as-is so
/// the caller decides what a terminal status means. Connection and read
/// failures surface as `TokopediaError::Network` once their budget is spent.
pub(crate) async fn execute_with_retry(
    client: &Client,
    policy: &RetryPolicy,
    request: Request,
) -> Result<Response> {
    let mut state = RetryState::default();
    let url = request.url().clone();

    loop {
        let attempt = request
            .try_clone()
            .ok_or(TokopediaError::UnclonableRequest)?;

        let delay = match client.execute(attempt).await {
            Ok(response) => {
                let status = response.status();
                if !policy.is_retryable_status(status) {
                    return Ok(response);
                }
                match state.record(policy, FailureKind::Status) {
                    Some(failed) => {
                        let delay = retry_after(status, response.headers()).unwrap_or_else(|| policy.backoff(failed));
                        warn!(
                            url = %url,
                            status = status.as_u16(),
                            attempt = failed,
                            backoff_ms = delay.as_millis() as u64,
                            "Retryable status, retrying"
                        );
                        delay
                    }
                    None => {
                        debug!(url = %url, status = status.as_u16(), "Retry budget spent, returning last response");
                        return Ok(response);
                    }
                }
            }
            Err(err) => {
                let kind = classify(&err);
                match state.record(policy, kind) {
                    Some(failed) => {
                        let delay = policy.backoff(failed);
                        warn!(
                            url = %url,
                            attempt = failed,
                            kind = ?kind,
                            backoff_ms = delay.as_millis() as u64,
                            error = %err,
                            "Request failed, retrying"
                        );
                        delay
                    }
                    None => return Err(err.into()),
                }
            }
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
