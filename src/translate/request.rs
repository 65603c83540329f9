//! Translate Anthropic Messages API requests into `OpenAI` Chat Completions requests.

use super::anthropic_types::{AnthropicRequest, ChatMessage};
use super::openai_types::OpenAIChatRequest;

/// Translate an Anthropic Messages API request into an `OpenAI` Chat Completions request.
///
/// `model` and `max_tokens` are copied as-is, including when absent or oddly typed.
/// Messages keep their order, role and content; nothing about them is validated. A `system`
/// prompt becomes a leading system-role message.
pub fn anthropic_to_openai(req: &AnthropicRequest) -> OpenAIChatRequest {
    let mut messages = Vec::new();

    if let Some(ref system) = req.system {
        messages.push(ChatMessage::new("system", system.as_text()));
    }

    if let Some(ref source) = req.messages {
        messages.extend(source.iter().map(|m| ChatMessage {
            role: m.role.clone(),
            content: m.content.clone(),
        }));
    }

    OpenAIChatRequest {
        model: req.model.clone(),
        max_tokens: req.max_tokens.clone(),
        messages,
        temperature: req.temperature,
        top_p: req.top_p,
        stop: req.stop_sequences.clone(),
    }
}
