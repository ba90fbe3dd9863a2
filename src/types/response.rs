//! Typed results decoded from upstream payloads.
//!
//! Decoding is strict: a payload whose fields have the wrong JSON type is a
//! [`GatewayError::Decode`] rather than an empty result, so API contract
//! drift shows up as an error instead of a silent "no images".

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decode::TEXT_BODY_FIELD;
use crate::{GatewayError, Result};

/// Reply text from a chat completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub content: String,
    /// Model the upstream selector picked, when reported.
    pub model: Option<String>,
    pub raw: Value,
}

#[derive(Deserialize)]
struct ChatEnvelope {
    data: ChatData,
}

#[derive(Deserialize)]
struct ChatData {
    completions: BTreeMap<String, ModelCompletion>,
}

#[derive(Deserialize)]
struct ModelCompletion {
    completion: Completion,
}

#[derive(Deserialize)]
struct Completion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatReply {
    /// Decode `data.completions.<model>.completion.choices[0].message.content`.
    ///
    /// Returns [`GatewayError::EmptyResponse`] if every completion is blank.
    pub fn from_payload(raw: Value) -> Result<Self> {
        let envelope: ChatEnvelope = serde_json::from_value(raw.clone())
            .map_err(|e| GatewayError::Decode(format!("chat completion: {e}")))?;

        let (model, content) = envelope
            .data
            .completions
            .into_iter()
            .find_map(|(model, completion)| {
                let content = completion
                    .completion
                    .choices
                    .into_iter()
                    .next()?
                    .message
                    .content?;
                let content = content.trim();
                (!content.is_empty()).then(|| (model, content.to_string()))
            })
            .ok_or(GatewayError::EmptyResponse)?;

        Ok(Self {
            content,
            model: Some(model),
            raw,
        })
    }
}

/// Normalised result of an image/video generation or a status poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    /// Media URLs, possibly empty while a job is still running.
    pub urls: Vec<String>,
    /// Identifier of an asynchronous job, to be polled via a status query.
    pub generation_id: Option<String>,
    /// Job state as reported by upstream (e.g. "processing", "completed").
    pub status: Option<String>,
    /// Full decoded payload, for display fallback.
    pub raw: Value,
}

/// A field upstream sends either as a single value or as a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JobId {
    Text(String),
    Number(u64),
}

impl JobId {
    fn into_string(self) -> String {
        match self {
            JobId::Text(s) => s,
            JobId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct MediaEnvelope {
    #[serde(default)]
    data: Option<MediaData>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    images: Option<OneOrMany>,
    #[serde(default)]
    id: Option<JobId>,
    #[serde(default)]
    generation_id: Option<JobId>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "response")]
    text: Option<String>,
}

#[derive(Deserialize)]
struct MediaData {
    #[serde(default)]
    images: Option<OneOrMany>,
}

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s'"<>]+"#).expect("URL pattern is valid"));

/// Pull http(s) URLs out of free text, dropping trailing punctuation.
fn urls_in_text(text: &str) -> Vec<String> {
    URL_PATTERN
        .find_iter(text)
        .map(|m| {
            m.as_str()
                .trim_end_matches(['.', ',', ';', '!', '?', ')'])
                .to_string()
        })
        .collect()
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl GenerationResult {
    /// Decode the media envelope shared by generation and status endpoints.
    ///
    /// URLs are taken from the first non-empty of `data.images`, `url`,
    /// `image_url`, `images`, or URLs embedded in a wrapped text body.
    pub fn from_payload(raw: Value) -> Result<Self> {
        let envelope: MediaEnvelope = serde_json::from_value(raw.clone())
            .map_err(|e| GatewayError::Decode(format!("generation payload: {e}")))?;

        let candidates = [
            envelope
                .data
                .and_then(|d| d.images)
                .map(OneOrMany::into_vec),
            envelope.url.map(|u| vec![u]),
            envelope.image_url.map(|u| vec![u]),
            envelope.images.map(OneOrMany::into_vec),
            envelope.text.as_deref().map(urls_in_text),
        ];

        let urls = candidates
            .into_iter()
            .flatten()
            .map(|urls| -> Vec<String> {
                urls.iter()
                    .map(|u| u.trim())
                    .filter(|u| is_http_url(u))
                    .map(str::to_string)
                    .collect()
            })
            .find(|urls| !urls.is_empty())
            .unwrap_or_default();

        let generation_id = envelope
            .id
            .or(envelope.generation_id)
            .map(JobId::into_string);

        Ok(Self {
            urls,
            generation_id,
            status: envelope.status,
            raw,
        })
    }

    /// Whether the payload was wrapped from a non-JSON text body.
    pub fn is_text_fallback(&self) -> bool {
        self.raw
            .as_object()
            .is_some_and(|o| o.len() == 1 && o.contains_key(TEXT_BODY_FIELD))
    }
}
