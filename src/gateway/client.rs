//! GatewayClient - caching, retrying client for the upstream API

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use super::builder::GatewayConfig;
use super::retry::{Sleeper, with_retry};
use super::session::Session;
use crate::cache::CacheKey;
use crate::{ApiGateway, GatewayError, Request, Result};

/// Client for the upstream generative AI API.
///
/// Built unopened by [`Straico::builder()`](crate::Straico::builder). Call
/// [`open()`](Self::open) before the first request and
/// [`close()`](Self::close) at shutdown; requests outside that window fail
/// with [`GatewayError::NotOpen`]. Each open session owns exactly one
/// connection pool and one response cache, both dropped on close.
///
/// The client is `Send + Sync`; share it behind an `Arc` to issue calls
/// from many tasks at once.
pub struct GatewayClient {
    config: GatewayConfig,
    sleeper: Arc<dyn Sleeper>,
    session: RwLock<Option<Arc<Session>>>,
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GatewayClient {
    pub(crate) fn new(config: GatewayConfig, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            config,
            sleeper,
            session: RwLock::new(None),
        }
    }

    /// The validated configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Open the connection pool and an empty response cache.
    pub fn open(&self) -> Result<()> {
        let mut slot = self.session.write().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(GatewayError::AlreadyOpen);
        }
        *slot = Some(Arc::new(Session::open(&self.config)?));
        info!(base_url = %self.config.base_url, "gateway session opened");
        Ok(())
    }

    /// Close the session, dropping the pool and the cache.
    ///
    /// Calls already on the wire run to completion; calls still waiting
    /// for a connection slot fail with [`GatewayError::NotOpen`].
    pub async fn close(&self) -> Result<()> {
        let session = self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(GatewayError::NotOpen)?;
        session.shutdown().await;
        info!("gateway session closed");
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Number of entries in the open session's response cache.
    pub fn cached_entries(&self) -> Result<u64> {
        Ok(self.session()?.cache.len())
    }

    fn session(&self) -> Result<Arc<Session>> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(GatewayError::NotOpen)
    }
}

#[async_trait]
impl ApiGateway for GatewayClient {
    /// Validate, consult the cache, send with the request's timeout
    /// (retrying where the request allows it), and cache 200 answers
    /// for cacheable requests.
    async fn execute(&self, request: &Request) -> Result<Value> {
        request.validate()?;
        let session = self.session()?;
        let endpoint = request.endpoint();

        let cache_key = request.is_cacheable().then(|| {
            CacheKey::derive(
                request.method().as_str(),
                &request.path(),
                request.body().as_ref(),
            )
        });
        if let Some(key) = &cache_key
            && let Some(payload) = session.cache.get(key, endpoint).await
        {
            return Ok(payload);
        }

        let timeout = self.config.timeouts.timeout_for(request);
        let exchange = if request.is_retryable() {
            with_retry(&self.config.retry, self.sleeper.as_ref(), endpoint, || {
                session.send(request, timeout)
            })
            .await?
        } else {
            session.send(request, timeout).await?
        };

        if let Some(key) = cache_key
            && exchange.status == 200
        {
            session.cache.insert(key, exchange.payload.clone()).await;
            debug!(endpoint, "cached response");
        }

        Ok(exchange.payload)
    }
}
