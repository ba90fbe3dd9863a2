//! An open gateway session: the connection pool plus the response cache.

use std::time::{Duration, Instant};

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, error};

use super::builder::GatewayConfig;
use crate::cache::ResponseCache;
use crate::decode::decode_body;
use crate::telemetry;
use crate::{GatewayError, Request, Result};

/// A completed HTTP exchange with a success status.
#[derive(Debug)]
pub(crate) struct Exchange {
    pub status: u16,
    pub payload: Value,
}

/// Build the `Authorization` header value for an API key.
pub(crate) fn bearer(api_key: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
        GatewayError::Configuration("API key contains characters not allowed in a header".into())
    })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Resources owned between `open()` and `close()`.
pub(crate) struct Session {
    http: Client,
    base_url: String,
    permits: Semaphore,
    pub(crate) cache: ResponseCache,
}

impl Session {
    pub(crate) fn open(config: &GatewayConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer(&config.api_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .user_agent(crate::version::user_agent())
            .connect_timeout(config.timeouts.connect_timeout)
            .timeout(config.timeouts.default_timeout)
            .pool_max_idle_per_host(config.limits.max_per_host)
            .pool_idle_timeout(config.limits.keepalive)
            .tcp_keepalive(config.limits.keepalive)
            .gzip(true)
            .build()
            .map_err(|e| GatewayError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            permits: Semaphore::new(config.limits.concurrent_requests()),
            cache: ResponseCache::new(&config.cache),
        })
    }

    /// Stop admitting new requests; queued callers observe `NotOpen`.
    pub(crate) async fn shutdown(&self) {
        self.permits.close();
        self.cache.clear().await;
    }

    /// Issue one attempt of `request` with the given total timeout.
    pub(crate) async fn send(&self, request: &Request, timeout: Duration) -> Result<Exchange> {
        let endpoint = request.endpoint();
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| GatewayError::NotOpen)?;

        let start = Instant::now();
        let result = self.exchange(request, timeout).await;

        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(telemetry::REQUESTS_TOTAL, "endpoint" => endpoint, "status" => status)
            .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS, "endpoint" => endpoint)
            .record(start.elapsed().as_secs_f64());

        result
    }

    async fn exchange(&self, request: &Request, timeout: Duration) -> Result<Exchange> {
        let path = request.path();
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %request.method(), %url, timeout_secs = timeout.as_secs_f64(), "sending request");

        let mut builder = self.http.request(request.method(), &url).timeout(timeout);
        if let Some(body) = request.body() {
            builder = builder.json(&body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::from_transport(e, &path, timeout))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::from_transport(e, &path, timeout))?;

        if status >= 400 {
            error!(status, endpoint = %path, body = %text, "API error");
            return Err(GatewayError::Api { status, body: text });
        }

        let payload = decode_body(content_type.as_deref(), &text)?;
        Ok(Exchange { status, payload })
    }
}
