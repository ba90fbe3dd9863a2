//! Conversation turn types

use serde::{Deserialize, Serialize};

/// Who spoke a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a channel's dialogue context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    /// Display name of the speaker, when the host knows one.
    #[serde(rename = "name", skip_serializing_if = "Option::is_none")]
    pub speaker_name: Option<String>,
}

impl ConversationTurn {
    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            speaker_name: None,
        }
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            speaker_name: None,
        }
    }

    /// Attach the speaker's display name
    pub fn with_speaker(mut self, name: impl Into<String>) -> Self {
        self.speaker_name = Some(name.into());
        self
    }
}
