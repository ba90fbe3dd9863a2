//! Caching subsystem.
//!
//! - [`response::ResponseCache`]: TTL cache for read-mostly endpoints
//!   (model list, user info, generation status). One instance lives inside
//!   each open gateway session and is dropped when the session closes.

pub mod response;

pub use response::{CacheConfig, CacheKey, ResponseCache};
