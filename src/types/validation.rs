//! Input checks applied before a request leaves the process.

use crate::{GatewayError, Result};

/// Longest prompt accepted for image and video generation, in characters.
pub const MAX_PROMPT_CHARS: usize = 1000;

/// Inclusive bounds on the number of images per generation request.
pub const MIN_VARIATIONS: u8 = 1;
pub const MAX_VARIATIONS: u8 = 4;

/// Trim a prompt and check it is non-empty and within [`MAX_PROMPT_CHARS`].
pub fn validate_prompt(prompt: &str) -> Result<&str> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(GatewayError::Validation("prompt cannot be empty".into()));
    }
    let chars = prompt.chars().count();
    if chars > MAX_PROMPT_CHARS {
        return Err(GatewayError::Validation(format!(
            "prompt must be no more than {MAX_PROMPT_CHARS} characters long (got {chars})"
        )));
    }
    Ok(prompt)
}

pub fn validate_model_name(model: &str) -> Result<&str> {
    let model = model.trim();
    if model.is_empty() {
        return Err(GatewayError::Validation("model name cannot be empty".into()));
    }
    Ok(model)
}

pub fn validate_variations(variations: u8) -> Result<u8> {
    if !(MIN_VARIATIONS..=MAX_VARIATIONS).contains(&variations) {
        return Err(GatewayError::Validation(format!(
            "variations must be between {MIN_VARIATIONS} and {MAX_VARIATIONS} (got {variations})"
        )));
    }
    Ok(variations)
}

/// Generation ids are interpolated into a path segment, so only ASCII
/// letters, digits, `-` and `_` are accepted.
pub fn validate_generation_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(GatewayError::Validation(
            "generation id cannot be empty".into(),
        ));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(GatewayError::Validation(format!(
            "generation id may only contain letters, digits, '-' and '_': {id:?}"
        )));
    }
    Ok(id)
}
