use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAttachment {
    pub fallback: String,
    pub text: String,
    pub color: String,
}

impl ChatAttachment {
    pub fn new(
        fallback: impl Into<String>,
        text: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            fallback: fallback.into(),
            text: text.into(),
            color: color.into(),
        }
    }
}

/// Incoming-webhook message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub channel: String,
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<ChatAttachment>,
    pub icon_emoji: String,
    pub username: String,
}
