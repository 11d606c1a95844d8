use std::env;
use std::str::FromStr;
use std::time::Duration;

use tokopedia_client::{DEFAULT_RETRY_STATUSES, DEFAULT_REVIEW_ENDPOINT};

use crate::error::CatalogError;

/// Run configuration. Built once at startup and passed down; nothing mutates
/// it after the run begins.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    // Review stage
    pub batch_size: usize,
    pub review_page_size: u32,
    pub max_workers: usize,
    pub after_batch_delay: Duration,
    /// Optional guard against a server that never clears `hasNext`.
    pub max_review_pages: Option<u32>,

    // Transport
    pub review_endpoint: String,
    pub request_timeout: Duration,
    pub retry_total: u32,
    pub retry_backoff_factor: f64,
    pub retry_statuses: Vec<u16>,
    pub pool_max_idle_per_host: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_size: 25,
            review_page_size: 10,
            max_workers: 8,
            after_batch_delay: Duration::from_secs(2),
            max_review_pages: None,
            review_endpoint: DEFAULT_REVIEW_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(20),
            retry_total: 5,
            retry_backoff_factor: 0.5,
            retry_statuses: DEFAULT_RETRY_STATUSES.to_vec(),
            pool_max_idle_per_host: 50,
        }
    }
}

impl Config {
    /// Load configuration from `SCOUT_*` environment variables, falling back
    /// to defaults for anything unset.
    pub fn from_env() -> Result<Self, CatalogError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env` but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CatalogError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let after_batch_delay = match get("SCOUT_AFTER_BATCH_DELAY_SECS") {
            Some(raw) => seconds("SCOUT_AFTER_BATCH_DELAY_SECS", &raw)?,
            None => defaults.after_batch_delay,
        };
        let request_timeout = match get("SCOUT_REQUEST_TIMEOUT_SECS") {
            Some(raw) => seconds("SCOUT_REQUEST_TIMEOUT_SECS", &raw)?,
            None => defaults.request_timeout,
        };
        let retry_statuses = match get("SCOUT_RETRY_STATUSES") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| parse::<u16>("SCOUT_RETRY_STATUSES", s))
                .collect::<Result<Vec<_>, _>>()?,
            None => defaults.retry_statuses,
        };
        let max_review_pages = match get("SCOUT_MAX_REVIEW_PAGES") {
            Some(raw) => Some(parse("SCOUT_MAX_REVIEW_PAGES", &raw)?),
            None => None,
        };

        let config = Self {
            batch_size: parse_or(&get, "SCOUT_BATCH_SIZE", defaults.batch_size)?,
            review_page_size: parse_or(&get, "SCOUT_REVIEW_PAGE_SIZE", defaults.review_page_size)?,
            max_workers: parse_or(&get, "SCOUT_MAX_WORKERS", defaults.max_workers)?,
            after_batch_delay,
            max_review_pages,
            review_endpoint: get("SCOUT_REVIEW_ENDPOINT").unwrap_or(defaults.review_endpoint),
            request_timeout,
            retry_total: parse_or(&get, "SCOUT_RETRY_TOTAL", defaults.retry_total)?,
            retry_backoff_factor: parse_or(
                &get,
                "SCOUT_RETRY_BACKOFF_FACTOR",
                defaults.retry_backoff_factor,
            )?,
            retry_statuses,
            pool_max_idle_per_host: parse_or(
                &get,
                "SCOUT_POOL_MAXSIZE",
                defaults.pool_max_idle_per_host,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.batch_size == 0 {
            return Err(CatalogError::Config("batch_size must be at least 1".into()));
        }
        if self.review_page_size == 0 {
            return Err(CatalogError::Config(
                "review_page_size must be at least 1".into(),
            ));
        }
        if self.max_workers == 0 {
            return Err(CatalogError::Config("max_workers must be at least 1".into()));
        }
        if !self.retry_backoff_factor.is_finite() || self.retry_backoff_factor < 0.0 {
            return Err(CatalogError::Config(format!(
                "retry_backoff_factor must be a non-negative number, got {}",
                self.retry_backoff_factor
            )));
        }
        if self.max_review_pages == Some(0) {
            return Err(CatalogError::Config(
                "max_review_pages must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }

    pub fn log_summary(&self) {
        tracing::info!(
            batch_size = self.batch_size,
            review_page_size = self.review_page_size,
            max_workers = self.max_workers,
            after_batch_delay_ms = self.after_batch_delay.as_millis() as u64,
            max_review_pages = ?self.max_review_pages,
            endpoint = self.review_endpoint.as_str(),
            request_timeout_secs = self.request_timeout.as_secs_f64(),
            retry_total = self.retry_total,
            retry_backoff_factor = self.retry_backoff_factor,
            retry_statuses = ?self.retry_statuses,
            pool_max_idle_per_host = self.pool_max_idle_per_host,
            "Scout config"
        );
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T, CatalogError> {
    raw.trim()
        .parse()
        .map_err(|_| CatalogError::Config(format!("{key} has invalid value {raw:?}")))
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, CatalogError> {
    match get(key) {
        Some(raw) => parse(key, &raw),
        None => Ok(default),
    }
}

fn seconds(key: &str, raw: &str) -> Result<Duration, CatalogError> {
    let secs: f64 = parse(key, raw)?;
    Duration::try_from_secs_f64(secs).map_err(|_| {
        CatalogError::Config(format!(
            "{key} must be a non-negative number of seconds, got {raw:?}"
        ))
    })
}
