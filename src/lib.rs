//! straico-gateway - caching, retrying HTTP gateway for the Straico API
//!
//! This crate turns typed requests (chat turns, image and video
//! generation, status polls, account queries) into completed or failed
//! remote calls. It owns one connection pool per open session, caches
//! read-mostly answers for five minutes, retries upstream 500s on chat
//! completions with exponential backoff, and widens timeouts for slow
//! media generation.
//!
//! A bounded per-channel [`ConversationStore`] keeps the dialogue context
//! a chat front end feeds into [`ApiGateway::chat`].
//!
//! # Example
//!
//! ```rust,no_run
//! use straico_gateway::{ApiGateway, ConversationStore, ConversationTurn, Straico};
//!
//! #[tokio::main]
//! async fn main() -> straico_gateway::Result<()> {
//!     let gateway = Straico::builder().api_key("sk-your-key").build()?;
//!     gateway.open()?;
//!
//!     let history = ConversationStore::new(50)?;
//!     history.append(1, ConversationTurn::user("What is the capital of France?"));
//!
//!     let reply = gateway.chat("openai/gpt-5", &history.read(1), Some(1000)).await?;
//!     history.append(1, ConversationTurn::assistant(&reply.content));
//!     println!("{}", reply.content);
//!
//!     gateway.close().await
//! }
//! ```

pub mod cache;
pub mod config;
pub mod conversation;
mod decode;
pub mod error;
pub mod gateway;
pub mod telemetry;
pub mod traits;
pub mod types;
mod version;

// Re-export main types at crate root
pub use cache::{CacheConfig, CacheKey, ResponseCache};
pub use conversation::{ChannelId, ConversationStore};
pub use error::{GatewayError, Result};
pub use gateway::{
    ConnectionLimits, GatewayClient, GatewayConfig, RetryConfig, RetryStep, Sleeper, Straico,
    StraicoBuilder, TimeoutPolicy, TokioSleeper,
};
pub use traits::ApiGateway;
pub use version::{GIT_BRANCH, GIT_SHA, PKG_VERSION, git_dirty, user_agent, version_string};

pub use types::{ChatReply, ConversationTurn, GenerationResult, ImageSize, Request, Role};
