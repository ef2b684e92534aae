//! Kommo notifier implementation

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::config::KommoConfig;

use super::error::CrmError;
use super::payload::{build_payload, CrmMessage, PayloadFormat};

/// Outcome of a request the CRM actually answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrmDelivery {
    pub status: u16,
    /// 2xx status
    pub accepted: bool,
}

/// Something that can hand a reply to the CRM
#[async_trait]
pub trait CrmNotifier: Send + Sync {
    async fn notify(&self, message: &CrmMessage) -> Result<CrmDelivery, CrmError>;
}

/// Posts replies to the configured Kommo endpoint
pub struct KommoClient {
    http_client: Client,
    url: String,
    token: Option<SecretString>,
    format: PayloadFormat,
}

impl KommoClient {
    pub fn new(config: &KommoConfig) -> Result<Self, CrmError> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CrmError::Configuration(e.to_string()))?;

        Ok(Self {
            http_client,
            url: config.api_url.clone(),
            token: config.token.clone(),
            format: config.payload_format,
        })
    }
}

#[async_trait]
impl CrmNotifier for KommoClient {
    async fn notify(&self, message: &CrmMessage) -> Result<CrmDelivery, CrmError> {
        let payload = build_payload(self.format, message);

        let mut request = self.http_client.post(&self.url).json(&payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = CrmError::from(e);
                tracing::error!(url = %self.url, error = %err, "CRM request failed");
                return Err(err);
            }
        };

        let status = response.status();
        let delivery = CrmDelivery {
            status: status.as_u16(),
            accepted: status.is_success(),
        };

        if delivery.accepted {
            tracing::info!(
                status = delivery.status,
                lead_id = message.ids.lead_id.as_deref().unwrap_or("-"),
                "reply delivered to CRM"
            );
        } else {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = delivery.status, body = %body, "CRM rejected reply");
        }

        Ok(delivery)
    }
}
