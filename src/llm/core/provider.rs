//! Provider trait for chat-completion implementations

use async_trait::async_trait;

use super::{error::LlmError, types::CompletionRequest};

/// Main interface that all completion providers must satisfy
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a complete (non-streamed) answer for the request
    ///
    /// # Returns
    /// The text of the first choice, or an error if the call fails or
    /// the provider answers without any text
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}
