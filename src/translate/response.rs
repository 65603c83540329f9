use super::anthropic_types::{AnthropicResponse, AnthropicUsage, ResponseContentBlock};
use super::openai_types::OpenAIChatResponse;

/// Translate an OpenAI Chat Completion response into an Anthropic Messages response.
/// Only the first choice is read; a missing choice or non-text content yields a
/// single empty text block. `id` and `model` are copied whatever their shape.
pub fn openai_to_anthropic(resp: &OpenAIChatResponse) -> AnthropicResponse {
    let choice = resp.choices.as_deref().and_then(|c| c.first());

    let text = choice
        .and_then(|c| c.message.as_ref())
        .map(|m| m.text().to_string())
        .unwrap_or_default();

    let stop_reason = choice
        .and_then(|c| c.finish_reason.as_str())
        .map(map_finish_reason);

    let usage = resp
        .usage
        .as_ref()
        .filter(|u| !u.is_empty())
        .map(|u| AnthropicUsage {
            input_tokens: u.prompt_tokens.clone(),
            output_tokens: u.completion_tokens.clone(),
        });

    AnthropicResponse {
        id: resp.id.clone(),
        response_type: "message".to_string(),
        role: "assistant".to_string(),
        model: resp.model.clone(),
        content: vec![ResponseContentBlock::Text { text }],
        stop_reason,
        usage,
    }
}

/// Map OpenAI finish_reason to Anthropic stop_reason
pub fn map_finish_reason(reason: &str) -> String {
    match reason {
        "stop" | "content_filter" => "end_turn".to_string(),
        "length" => "max_tokens".to_string(),
        "tool_calls" | "function_call" => "tool_use".to_string(),
        other => other.to_string(),
    }
}
