//! Per-request timeouts and connection pool limits.

use std::time::Duration;

use crate::Request;

/// Timeouts applied to each request class.
///
/// Image generation scales with the number of requested variations,
/// capped so the worst case stays bounded:
///
/// ```rust
/// # use straico_gateway::TimeoutPolicy;
/// # use std::time::Duration;
/// let policy = TimeoutPolicy::default();
/// assert_eq!(policy.image_timeout(1), Duration::from_secs(80));
/// assert_eq!(policy.image_timeout(4), Duration::from_secs(120));
/// ```
#[derive(Debug, Clone)]
pub struct TimeoutPolicy {
    /// Total timeout for ordinary calls. Default: 30s.
    pub default_timeout: Duration,
    /// Connection establishment timeout for every call. Default: 10s.
    pub connect_timeout: Duration,
    /// Image generation base allowance. Default: 60s.
    pub image_base: Duration,
    /// Extra allowance per requested image. Default: 20s.
    pub image_per_variation: Duration,
    /// Ceiling for image generation. Default: 120s.
    pub image_cap: Duration,
    /// Video generation timeout. Default: 90s.
    pub video_timeout: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            image_base: Duration::from_secs(60),
            image_per_variation: Duration::from_secs(20),
            image_cap: Duration::from_secs(120),
            video_timeout: Duration::from_secs(90),
        }
    }
}

impl TimeoutPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn video_timeout(mut self, timeout: Duration) -> Self {
        self.video_timeout = timeout;
        self
    }

    /// `min(cap, base + per_variation * max(variations, 1))`
    pub fn image_timeout(&self, variations: u8) -> Duration {
        let scaled = self.image_base + self.image_per_variation * u32::from(variations.max(1));
        scaled.min(self.image_cap)
    }

    /// Total timeout for a request.
    pub fn timeout_for(&self, request: &Request) -> Duration {
        match request {
            Request::ImageGeneration {
                variation_count, ..
            } => self.image_timeout(*variation_count),
            Request::VideoGeneration { .. } => self.video_timeout,
            _ => self.default_timeout,
        }
    }
}

/// Bounds on the shared connection pool.
///
/// Calls beyond the limit queue for a free slot rather than failing.
#[derive(Debug, Clone)]
pub struct ConnectionLimits {
    /// Maximum simultaneous connections overall. Default: 10.
    pub max_connections: usize,
    /// Maximum simultaneous connections to one host. Default: 5.
    pub max_per_host: usize,
    /// Idle keep-alive for pooled connections. Default: 30s.
    pub keepalive: Duration,
}

impl Default for ConnectionLimits {
    fn default() -> Self {
        Self {
            max_connections: 10,
            max_per_host: 5,
            keepalive: Duration::from_secs(30),
        }
    }
}

impl ConnectionLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_connections(mut self, n: usize) -> Self {
        self.max_connections = n;
        self
    }

    pub fn max_per_host(mut self, n: usize) -> Self {
        self.max_per_host = n;
        self
    }

    pub fn keepalive(mut self, keepalive: Duration) -> Self {
        self.keepalive = keepalive;
        self
    }

    /// In-flight request slots for a session. A session only ever talks to
    /// its base host, so the per-host bound applies on top of the total.
    pub fn concurrent_requests(&self) -> usize {
        self.max_connections.min(self.max_per_host)
    }
}
