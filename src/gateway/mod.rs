//! Gateway client, its builder and call policies

mod builder;
mod client;
pub mod policy;
pub mod retry;
mod session;

pub use builder::{DEFAULT_BASE_URL, GatewayConfig, Straico, StraicoBuilder};
pub use client::GatewayClient;
pub use policy::{ConnectionLimits, TimeoutPolicy};
pub use retry::{RetryConfig, RetryStep, Sleeper, TokioSleeper};
