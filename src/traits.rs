//! Core ApiGateway trait

use async_trait::async_trait;
use serde_json::Value;

use crate::{ChatReply, ConversationTurn, GenerationResult, ImageSize, Request, Result};

/// One call per upstream operation.
///
/// Implementors only need [`execute`](ApiGateway::execute); the typed
/// operations build a [`Request`], execute it and decode the payload.
/// Hosts can implement this trait with canned payloads to test their own
/// command handling without a network.
#[async_trait]
pub trait ApiGateway: Send + Sync {
    /// Turn a typed request into a decoded payload or a typed error.
    async fn execute(&self, request: &Request) -> Result<Value>;

    /// Chat completion over a channel's turns.
    async fn chat(
        &self,
        model: &str,
        turns: &[ConversationTurn],
        max_tokens: Option<u32>,
    ) -> Result<ChatReply> {
        let request = Request::ChatCompletion {
            model: model.to_string(),
            messages: turns.to_vec(),
            max_tokens,
        };
        ChatReply::from_payload(self.execute(&request).await?)
    }

    /// Generate `variations` images for `prompt`.
    async fn generate_image(
        &self,
        model: &str,
        prompt: &str,
        size: ImageSize,
        variations: u8,
    ) -> Result<GenerationResult> {
        let request = Request::ImageGeneration {
            model: model.to_string(),
            prompt: prompt.to_string(),
            size,
            variation_count: variations,
        };
        GenerationResult::from_payload(self.execute(&request).await?)
    }

    /// Start a video generation; `None` selects the default model.
    async fn generate_video(&self, prompt: &str, model: Option<&str>) -> Result<GenerationResult> {
        let mut request = Request::video(prompt);
        if let (Some(model), Request::VideoGeneration { model: slot, .. }) = (model, &mut request) {
            *slot = model.to_string();
        }
        GenerationResult::from_payload(self.execute(&request).await?)
    }

    /// Poll an asynchronous generation job.
    async fn generation_status(&self, generation_id: &str) -> Result<GenerationResult> {
        GenerationResult::from_payload(self.execute(&Request::status(generation_id)).await?)
    }

    /// Models available to the account (raw payload).
    async fn models(&self) -> Result<Value> {
        self.execute(&Request::ModelList).await
    }

    /// Account details (raw payload).
    async fn user_info(&self) -> Result<Value> {
        self.execute(&Request::UserInfo).await
    }
}
