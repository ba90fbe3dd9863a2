//! Typed requests and their mapping onto the upstream HTTP API.

use std::fmt;
use std::str::FromStr;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::conversation::ConversationTurn;
use super::validation::{
    validate_generation_id, validate_model_name, validate_prompt, validate_variations,
};
use crate::{GatewayError, Result};

/// Default model for chat completions.
pub const DEFAULT_CHAT_MODEL: &str = "openai/gpt-5";
/// Default model for image generation.
pub const DEFAULT_IMAGE_MODEL: &str = "openai/dall-e-3";
/// Default model for video generation.
pub const DEFAULT_VIDEO_MODEL: &str = "runway-gen3";

/// Sent as the chat message when the conversation has no turns yet.
pub const EMPTY_CHAT_FALLBACK: &str = "Hello";

/// Output aspect of a generated image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    #[default]
    Square,
    Portrait,
    Landscape,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Square => "square",
            ImageSize::Portrait => "portrait",
            ImageSize::Landscape => "landscape",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "square" => Ok(ImageSize::Square),
            "portrait" => Ok(ImageSize::Portrait),
            "landscape" => Ok(ImageSize::Landscape),
            other => Err(GatewayError::Validation(format!(
                "image size must be one of: square, portrait, landscape (got '{other}')"
            ))),
        }
    }
}

/// A call the gateway knows how to make.
///
/// Each variant maps to a fixed HTTP method, path and optional JSON body.
/// Whether a variant may be served from the response cache, and whether a
/// failed attempt may be repeated, are properties of the variant itself
/// rather than of the HTTP method it happens to use.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    ChatCompletion {
        model: String,
        messages: Vec<ConversationTurn>,
        max_tokens: Option<u32>,
    },
    ImageGeneration {
        model: String,
        prompt: String,
        size: ImageSize,
        variation_count: u8,
    },
    VideoGeneration {
        prompt: String,
        model: String,
    },
    StatusQuery {
        generation_id: String,
    },
    ModelList,
    UserInfo,
}

impl Request {
    /// Chat completion over the given turns.
    pub fn chat(model: impl Into<String>, messages: Vec<ConversationTurn>) -> Self {
        Request::ChatCompletion {
            model: model.into(),
            messages,
            max_tokens: None,
        }
    }

    /// Image generation with the default model, square output and one variation.
    pub fn image(prompt: impl Into<String>) -> Self {
        Request::ImageGeneration {
            model: DEFAULT_IMAGE_MODEL.to_string(),
            prompt: prompt.into(),
            size: ImageSize::default(),
            variation_count: 1,
        }
    }

    /// Video generation with the default model.
    pub fn video(prompt: impl Into<String>) -> Self {
        Request::VideoGeneration {
            prompt: prompt.into(),
            model: DEFAULT_VIDEO_MODEL.to_string(),
        }
    }

    pub fn status(generation_id: impl Into<String>) -> Self {
        Request::StatusQuery {
            generation_id: generation_id.into(),
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Request::ChatCompletion { .. }
            | Request::ImageGeneration { .. }
            | Request::VideoGeneration { .. } => Method::POST,
            Request::StatusQuery { .. } | Request::ModelList | Request::UserInfo => Method::GET,
        }
    }

    /// Concrete request path, relative to the base address.
    pub fn path(&self) -> String {
        match self {
            Request::StatusQuery { generation_id } => {
                format!("/generations/{}", generation_id.trim())
            }
            other => other.endpoint().to_string(),
        }
    }

    /// Path template, used as a low-cardinality label for logs and metrics.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Request::ChatCompletion { .. } => "/v1/prompt/completion",
            Request::ImageGeneration { .. } => "/v1/image/generation",
            Request::VideoGeneration { .. } => "/videos/generations",
            Request::StatusQuery { .. } => "/generations/{id}",
            Request::ModelList => "/v1/models",
            Request::UserInfo => "/v1/user",
        }
    }

    /// JSON body, if the endpoint takes one.
    ///
    /// Chat sends only the last turn: the upstream completion endpoint
    /// takes a single `message`, and the model is picked by its
    /// `smart_llm_selector` rather than by name.
    pub fn body(&self) -> Option<Value> {
        match self {
            Request::ChatCompletion {
                messages,
                max_tokens,
                ..
            } => {
                let message = messages
                    .last()
                    .map(|turn| turn.content.as_str())
                    .unwrap_or(EMPTY_CHAT_FALLBACK);
                let mut body = json!({
                    "smart_llm_selector": {
                        "quantity": 1,
                        "pricing_method": "quality",
                    },
                    "message": message,
                });
                if let Some(max_tokens) = max_tokens {
                    body["max_tokens"] = json!(max_tokens);
                }
                Some(body)
            }
            Request::ImageGeneration {
                model,
                prompt,
                size,
                variation_count,
            } => Some(json!({
                "model": model.trim(),
                "description": prompt.trim(),
                "size": size.as_str(),
                "variations": variation_count,
            })),
            Request::VideoGeneration { prompt, model } => Some(json!({
                "prompt": prompt.trim(),
                "model": model.trim(),
            })),
            Request::StatusQuery { .. } | Request::ModelList | Request::UserInfo => None,
        }
    }

    /// Read-mostly endpoints whose answers may be reused within the cache TTL.
    pub fn is_cacheable(&self) -> bool {
        matches!(
            self,
            Request::ModelList | Request::UserInfo | Request::StatusQuery { .. }
        )
    }

    /// Only chat completions are retried on upstream 500s.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Request::ChatCompletion { .. })
    }

    /// Reject malformed input before any network call.
    pub fn validate(&self) -> Result<()> {
        match self {
            Request::ChatCompletion { model, .. } => {
                validate_model_name(model)?;
            }
            Request::ImageGeneration {
                model,
                prompt,
                variation_count,
                ..
            } => {
                validate_model_name(model)?;
                validate_prompt(prompt)?;
                validate_variations(*variation_count)?;
            }
            Request::VideoGeneration { prompt, model } => {
                validate_prompt(prompt)?;
                validate_model_name(model)?;
            }
            Request::StatusQuery { generation_id } => {
                validate_generation_id(generation_id)?;
            }
            Request::ModelList | Request::UserInfo => {}
        }
        Ok(())
    }
}
