//! Chat-completion layer
//!
//! `core` holds the provider-agnostic types; `ReplyGenerator` applies the bot
//! persona on top of any `CompletionProvider` and falls back on failure.

pub mod core;
pub mod openai;
pub mod reply;

// Re-export commonly used types
pub use self::core::{
    config::GenerationConfig,
    error::LlmError,
    provider::CompletionProvider,
    types::{ChatMessage, CompletionRequest, MessageRole},
};
pub use openai::OpenAiClient;
pub use reply::{ReplyGenerator, DEFAULT_FALLBACK_REPLY, DEFAULT_SYSTEM_PROMPT};
