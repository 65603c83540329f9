//! Type definitions for the Anthropic Messages API, as far as the gateway reads them.
//!
//! Fields the gateway copies without reading are raw JSON: a missing value becomes
//! `null` and anything else is passed on unchanged instead of being rejected.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Request types (what the client sends TO us)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnthropicRequest {
    #[serde(default)]
    pub model: serde_json::Value,
    #[serde(default)]
    pub max_tokens: serde_json::Value,
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

/// A single conversation turn, kept as raw JSON so unknown roles, block arrays
/// and other shapes reach the upstream untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: serde_json::Value,
    #[serde(default)]
    pub content: serde_json::Value,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: serde_json::Value::String(role.into()),
            content: serde_json::Value::String(content.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SystemContent {
    Text(String),
    Blocks(Vec<SystemBlock>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemBlock {
    #[serde(rename = "type", default)]
    pub block_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl SystemContent {
    /// Flatten to plain text; text blocks are joined with newlines.
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Blocks(blocks) => blocks
                .iter()
                .filter(|b| b.block_type.as_deref().map_or(true, |t| t == "text"))
                .filter_map(|b| b.text.as_deref())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

// ---------------------------------------------------------------------------
// Response types (what we send BACK to the client)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicResponse {
    pub id: serde_json::Value,
    #[serde(rename = "type")]
    pub response_type: String,
    pub role: String,
    pub model: serde_json::Value,
    pub content: Vec<ResponseContentBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<AnthropicUsage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResponseContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnthropicUsage {
    pub input_tokens: serde_json::Value,
    pub output_tokens: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_fields_deserialize() {
        let req: AnthropicRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.model.is_null());
        assert!(req.max_tokens.is_null());
        assert!(req.messages.is_none());

        let msg: ChatMessage = serde_json::from_value(json!({"content": "hi"})).unwrap();
        assert!(msg.role.is_null());
        assert_eq!(msg.content, json!("hi"));
    }

    #[test]
    fn test_odd_field_types_are_accepted() {
        let req: AnthropicRequest = serde_json::from_value(json!({
            "model": 7,
            "max_tokens": -1,
            "messages": [{"role": 1, "content": "hi"}]
        }))
        .unwrap();
        assert_eq!(req.model, json!(7));
        assert_eq!(req.max_tokens, json!(-1));
        assert_eq!(req.messages.unwrap()[0].role, json!(1));
    }

    #[test]
    fn test_block_content_is_kept_raw() {
        let msg: ChatMessage = serde_json::from_value(json!({
            "role": "user",
            "content": [{"type": "text", "text": "hi"}]
        }))
        .unwrap();
        assert_eq!(msg.content[0]["text"], "hi");
    }

    #[test]
    fn test_system_blocks_as_text() {
        let system: SystemContent = serde_json::from_value(json!([
            {"type": "text", "text": "one"},
            {"type": "text", "text": "two"}
        ]))
        .unwrap();
        assert_eq!(system.as_text(), "one\ntwo");
    }

    #[test]
    fn test_response_omits_absent_usage() {
        let resp = AnthropicResponse {
            id: json!("1"),
            response_type: "message".to_string(),
            role: "assistant".to_string(),
            model: json!("qwen"),
            content: vec![ResponseContentBlock::Text {
                text: "hello".to_string(),
            }],
            stop_reason: None,
            usage: None,
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert!(value.get("usage").is_none());
        assert!(value.get("stop_reason").is_none());
        assert_eq!(value["type"], "message");
        assert_eq!(value["content"], json!([{"type": "text", "text": "hello"}]));
    }
}
