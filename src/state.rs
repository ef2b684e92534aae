// Shared per-process state handed to every request

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::config::AppConfig;
use crate::crm::{CrmError, CrmNotifier, DispatchMode, KommoClient};
use crate::llm::{CompletionProvider, LlmError, OpenAiClient, ReplyGenerator};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Crm(#[from] CrmError),
}

#[derive(Clone)]
pub struct AppState {
    pub generator: ReplyGenerator,
    pub notifier: Arc<dyn CrmNotifier>,
    pub dispatch_mode: DispatchMode,
    pub webhook_token: Option<SecretString>,
}

impl AppState {
    pub fn new(generator: ReplyGenerator, notifier: Arc<dyn CrmNotifier>) -> Self {
        Self {
            generator,
            notifier,
            dispatch_mode: DispatchMode::default(),
            webhook_token: None,
        }
    }

    pub fn with_dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.dispatch_mode = mode;
        self
    }

    pub fn with_webhook_token(mut self, token: impl Into<String>) -> Self {
        self.webhook_token = Some(SecretString::from(token.into()));
        self
    }

    /// Wire the real OpenAI and Kommo clients from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, StateError> {
        let provider: Arc<dyn CompletionProvider> = Arc::new(OpenAiClient::new(&config.openai)?);
        let notifier: Arc<dyn CrmNotifier> = Arc::new(KommoClient::new(&config.kommo)?);

        let generator = ReplyGenerator::new(provider)
            .with_system_prompt(config.bot.system_prompt.clone())
            .with_fallback(config.bot.fallback_reply.clone())
            .with_generation_config(config.openai.generation.clone());

        Ok(Self {
            generator,
            notifier,
            dispatch_mode: config.bot.dispatch_mode,
            webhook_token: config.bot.webhook_token.clone(),
        })
    }

    /// Check a presented token against the configured one
    ///
    /// Always true when no token is configured.
    pub fn token_matches(&self, presented: Option<&str>) -> bool {
        match &self.webhook_token {
            None => true,
            Some(expected) => presented.is_some_and(|token| {
                bool::from(token.as_bytes().ct_eq(expected.expose_secret().as_bytes()))
            }),
        }
    }
}
