//! OpenAI chat-completions client implementation

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::config::OpenAiConfig;
use crate::llm::core::{error::LlmError, provider::CompletionProvider, types::CompletionRequest};

use super::mapper::{from_error_body, from_openai_response, to_openai_request};
use super::types::ChatCompletionResponse;

/// Client for any endpoint speaking the OpenAI `/chat/completions` protocol
pub struct OpenAiClient {
    /// HTTP client for making requests
    http_client: Client,
    api_key: SecretString,
    /// Base URL without trailing slash, e.g. `https://api.openai.com/v1`
    base_url: String,
    model: String,
}

impl OpenAiClient {
    /// Create a new client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &OpenAiConfig) -> Result<Self, LlmError> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::HttpError {
                status: 0,
                body: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn build_endpoint_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        if request.messages.is_empty() {
            return Err(LlmError::InvalidRequest(
                "at least one message is required".to_string(),
            ));
        }

        let body = to_openai_request(&self.model, request);
        let url = self.build_endpoint_url();

        tracing::debug!(model = %self.model, url = %url, "requesting chat completion");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(from_error_body(status.as_u16(), body));
        }

        let completion: ChatCompletionResponse = response.json().await?;
        if let Some(usage) = &completion.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion usage"
            );
        }

        from_openai_response(completion)
    }
}
