//! Mapping between abstraction types and OpenAI wire types

use crate::llm::core::error::LlmError;
use crate::llm::core::types::{ChatMessage, CompletionRequest, MessageRole};

use super::types::{ChatCompletionRequest, ChatCompletionResponse, ErrorEnvelope, OpenAiMessage};

/// Convert our abstraction request to the OpenAI request format
///
/// The system prompt, when present, becomes the first message.
pub fn to_openai_request(model: &str, request: CompletionRequest) -> ChatCompletionRequest {
    let system = request.system.map(ChatMessage::system);
    let messages = system
        .into_iter()
        .chain(request.messages)
        .map(to_openai_message)
        .collect();

    ChatCompletionRequest {
        model: model.to_string(),
        messages,
        max_tokens: request.config.max_tokens,
        temperature: request.config.temperature,
    }
}

fn to_openai_message(message: ChatMessage) -> OpenAiMessage {
    let role = match message.role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    };

    OpenAiMessage {
        role: role.to_string(),
        content: Some(message.content),
    }
}

/// Pull the reply text out of a successful response
pub fn from_openai_response(response: ChatCompletionResponse) -> Result<String, LlmError> {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(text)
}

/// Turn a non-2xx answer into an error, preferring the provider's own envelope
pub fn from_error_body(status: u16, body: String) -> LlmError {
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => LlmError::ProviderError {
            code: envelope
                .error
                .code
                .or(envelope.error.error_type)
                .unwrap_or_else(|| status.to_string()),
            message: envelope.error.message,
        },
        Err(_) => LlmError::HttpError { status, body },
    }
}
