// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for the search pipeline and its HTTP session

use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_INTERNAL_SEARCH_URL: &str =
    "https://api.bilibili.com/x/web-interface/search/type";
pub const DEFAULT_EXTERNAL_SEARCH_URL: &str = "https://www.dogedoge.com/results";
pub const DEFAULT_EXTERNAL_ORIGIN: &str = "https://www.dogedoge.com/";
pub const DEFAULT_SITE_FILTER: &str = "www.bilibili.com";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Invalid configuration, reported before any search starts
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Internal search concurrency must be at least 1")]
    InvalidConcurrency,

    #[error("Rate limit must be greater than 0 when set")]
    ZeroRateLimit,

    #[error("HTTP timeout must be greater than 0")]
    ZeroTimeout,

    #[error("Invalid {name} URL '{value}': {reason}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Configuration for a search run
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Number of concurrent internal search workers
    pub internal_concurrency: usize,
    /// Pause before each internal search request in milliseconds
    pub internal_delay_ms: u64,
    /// Optional global cap on internal requests per minute
    pub internal_rate_limit_per_minute: Option<u32>,
    /// Upper bound of the random pause between external searches in seconds
    pub external_max_delay_secs: u64,
    /// Count a target found by both phases only once
    pub dedup_across_phases: bool,
    /// Backend endpoints
    pub endpoints: EndpointConfig,
}

/// Backend endpoints
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Internal video search API
    pub internal_search_url: String,
    /// External search engine results page
    pub external_search_url: String,
    /// Origin that relative result links are resolved against
    pub external_origin: String,
    /// Site restriction appended to external queries
    pub site_filter: String,
}

/// Configuration for the shared HTTP session
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    pub user_agent: String,
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
}

fn check_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidUrl {
            name,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

impl SearchConfig {
    /// Load configuration from `SM2AV_*` environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            internal_concurrency: env_parse("SM2AV_CONCURRENCY")
                .unwrap_or(defaults.internal_concurrency),
            internal_delay_ms: env_parse("SM2AV_INTERNAL_DELAY_MS")
                .unwrap_or(defaults.internal_delay_ms),
            internal_rate_limit_per_minute: env_parse("SM2AV_RATE_LIMIT_PER_MINUTE"),
            external_max_delay_secs: env_parse("SM2AV_MAX_DELAY")
                .unwrap_or(defaults.external_max_delay_secs),
            dedup_across_phases: env_flag("SM2AV_DEDUP_ACROSS_PHASES")
                .unwrap_or(defaults.dedup_across_phases),
            endpoints: EndpointConfig::from_env(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.internal_concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        if self.internal_rate_limit_per_minute == Some(0) {
            return Err(ConfigError::ZeroRateLimit);
        }
        self.endpoints.validate()
    }

    pub fn internal_delay(&self) -> Duration {
        Duration::from_millis(self.internal_delay_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            internal_concurrency: 1,
            internal_delay_ms: 500,
            internal_rate_limit_per_minute: None,
            external_max_delay_secs: 2,
            dedup_across_phases: false,
            endpoints: EndpointConfig::default(),
        }
    }
}

impl EndpointConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            internal_search_url: env::var("SM2AV_INTERNAL_SEARCH_URL")
                .unwrap_or(defaults.internal_search_url),
            external_search_url: env::var("SM2AV_EXTERNAL_SEARCH_URL")
                .unwrap_or(defaults.external_search_url),
            external_origin: env::var("SM2AV_EXTERNAL_ORIGIN")
                .unwrap_or(defaults.external_origin),
            site_filter: env::var("SM2AV_SITE_FILTER").unwrap_or(defaults.site_filter),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("internal search", &self.internal_search_url)?;
        check_url("external search", &self.external_search_url)?;
        check_url("external origin", &self.external_origin)
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            internal_search_url: DEFAULT_INTERNAL_SEARCH_URL.to_string(),
            external_search_url: DEFAULT_EXTERNAL_SEARCH_URL.to_string(),
            external_origin: DEFAULT_EXTERNAL_ORIGIN.to_string(),
            site_filter: DEFAULT_SITE_FILTER.to_string(),
        }
    }
}

impl HttpConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timeout_secs: env_parse("SM2AV_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
            user_agent: env::var("SM2AV_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}
