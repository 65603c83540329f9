//! Type definitions for the [OpenAI Chat Completions API](https://platform.openai.com/docs/api-reference/chat).
//!
//! Only the fields the gateway forwards or reads are modelled. Response fields are
//! optional or raw JSON so partial or oddly typed upstream payloads still translate.

use super::anthropic_types::ChatMessage;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Request types (what we send TO the upstream)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenAIChatRequest {
    pub model: serde_json::Value,
    pub max_tokens: serde_json::Value,
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Response types (what the upstream sends back)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenAIChatResponse {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub model: serde_json::Value,
    #[serde(default)]
    pub choices: Option<Vec<Choice>>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
    #[serde(default)]
    pub finish_reason: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub role: serde_json::Value,
    #[serde(default)]
    pub content: serde_json::Value,
}

impl ChoiceMessage {
    /// The message text; anything other than a string reads as empty.
    pub fn text(&self) -> &str {
        self.content.as_str().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatUsage {
    #[serde(default)]
    pub prompt_tokens: serde_json::Value,
    #[serde(default)]
    pub completion_tokens: serde_json::Value,
}

impl ChatUsage {
    /// Usage with neither count is treated like no usage at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompt_tokens.is_null() && self.completion_tokens.is_null()
    }
}
