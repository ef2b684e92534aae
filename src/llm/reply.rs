//! Reply generation with a fixed persona and a fallback apology

use std::sync::Arc;

use super::core::{config::GenerationConfig, provider::CompletionProvider, types::CompletionRequest};

/// Persona used when no `SYSTEM_PROMPT` is configured
pub const DEFAULT_SYSTEM_PROMPT: &str = "Você é Luiza, assistente digital da equipe Evelyn Liu. \
Responda de forma acolhedora e humanizada, sem se passar pela Evelyn, e guie os leads para o \
VIP 21D ou consultas na Table Clinic.";

/// Sent to the lead whenever the completion call fails
pub const DEFAULT_FALLBACK_REPLY: &str =
    "Desculpe, não consegui processar sua mensagem agora. Tente novamente em instantes.";

/// Turns an inbound message into reply text
///
/// Failures of the underlying provider never escape: they are logged and
/// replaced by the fallback text.
#[derive(Clone)]
pub struct ReplyGenerator {
    provider: Arc<dyn CompletionProvider>,
    system_prompt: String,
    fallback: String,
    generation: GenerationConfig,
}

impl ReplyGenerator {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            fallback: DEFAULT_FALLBACK_REPLY.to_string(),
            generation: GenerationConfig::default(),
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn with_generation_config(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Generate the reply for one user message
    pub async fn generate_reply(&self, message: &str) -> String {
        let request = CompletionRequest::single_turn(Some(self.system_prompt.clone()), message)
            .with_config(self.generation.clone());

        match self.provider.complete(request).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(error = %e, "chat completion failed, sending fallback reply");
                self.fallback.clone()
            }
        }
    }
}
