//! Builder for configuring gateway instances

use std::sync::Arc;

use super::client::GatewayClient;
use super::policy::{ConnectionLimits, TimeoutPolicy};
use super::retry::{RetryConfig, Sleeper, TokioSleeper};
use super::session::bearer;
use crate::cache::CacheConfig;
use crate::{GatewayError, Result};

/// Default upstream base address.
pub const DEFAULT_BASE_URL: &str = "https://api.straico.com";

/// Validated settings a [`GatewayClient`] runs with.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_key: String,
    /// Base address with any trailing `/` removed.
    pub base_url: String,
    pub cache: CacheConfig,
    pub retry: RetryConfig,
    pub timeouts: TimeoutPolicy,
    pub limits: ConnectionLimits,
}

/// Main entry point for creating gateway instances.
pub struct Straico;

impl Straico {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> StraicoBuilder {
        StraicoBuilder::new()
    }
}

/// Builder for configuring gateway instances.
pub struct StraicoBuilder {
    api_key: Option<String>,
    base_url: String,
    cache: CacheConfig,
    retry: RetryConfig,
    timeouts: TimeoutPolicy,
    limits: ConnectionLimits,
    sleeper: Arc<dyn Sleeper>,
}

impl Default for StraicoBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StraicoBuilder {
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            cache: CacheConfig::default(),
            retry: RetryConfig::default(),
            timeouts: TimeoutPolicy::default(),
            limits: ConnectionLimits::default(),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// API key sent as a bearer token on every request.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override the upstream base address (e.g. a mock server in tests).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the response cache configuration.
    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    /// Set the retry policy for chat completions.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Set per-request-class timeouts.
    pub fn timeouts(mut self, policy: TimeoutPolicy) -> Self {
        self.timeouts = policy;
        self
    }

    /// Set connection pool limits.
    pub fn limits(mut self, limits: ConnectionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Replace the backoff sleeper (tests inject one that records delays).
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Validate the configuration and build an unopened client.
    ///
    /// Fails with [`GatewayError::Configuration`] on a missing or blank API
    /// key, an unparseable base address, or zero pool/attempt limits.
    pub fn build(self) -> Result<GatewayClient> {
        let api_key = self
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| GatewayError::Configuration("API key is required".into()))?;
        bearer(&api_key)?;

        let base_url = self.base_url.trim().trim_end_matches('/').to_string();
        let parsed = reqwest::Url::parse(&base_url).map_err(|e| {
            GatewayError::Configuration(format!("invalid base URL '{base_url}': {e}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GatewayError::Configuration(format!(
                "base URL must use http or https: {base_url}"
            )));
        }

        if self.limits.max_connections == 0 || self.limits.max_per_host == 0 {
            return Err(GatewayError::Configuration(
                "connection limits must be positive".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(GatewayError::Configuration(
                "retry max_attempts must be at least 1".into(),
            ));
        }

        let config = GatewayConfig {
            api_key,
            base_url,
            cache: self.cache,
            retry: self.retry,
            timeouts: self.timeouts,
            limits: self.limits,
        };
        Ok(GatewayClient::new(config, self.sleeper))
    }
}
