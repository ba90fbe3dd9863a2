//! Public types for the gateway API.

mod conversation;
mod request;
mod response;
mod validation;

pub use conversation::{ConversationTurn, Role};
pub use request::{
    DEFAULT_CHAT_MODEL, DEFAULT_IMAGE_MODEL, DEFAULT_VIDEO_MODEL, EMPTY_CHAT_FALLBACK, ImageSize,
    Request,
};
pub use response::{ChatReply, GenerationResult};
pub use validation::{
    MAX_PROMPT_CHARS, MAX_VARIATIONS, MIN_VARIATIONS, validate_generation_id, validate_model_name,
    validate_prompt, validate_variations,
};
