//! Inline or fire-and-forget delivery of CRM replies

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use super::client::{CrmDelivery, CrmNotifier};
use super::error::CrmError;
use super::payload::CrmMessage;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Await the CRM before answering the webhook
    Inline,
    /// Spawn the CRM call and answer the webhook right away
    #[default]
    Background,
}

impl FromStr for DispatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" | "sync" => Ok(DispatchMode::Inline),
            "background" | "async" => Ok(DispatchMode::Background),
            other => Err(format!("unknown dispatch mode `{}`", other)),
        }
    }
}

/// Hand `message` to the CRM according to `mode`
///
/// Returns `Ok(None)` in background mode: the spawned task is never joined
/// and only logs its outcome.
pub async fn deliver(
    notifier: Arc<dyn CrmNotifier>,
    mode: DispatchMode,
    message: CrmMessage,
) -> Result<Option<CrmDelivery>, CrmError> {
    match mode {
        DispatchMode::Inline => notifier.notify(&message).await.map(Some),
        DispatchMode::Background => {
            tokio::spawn(async move {
                if let Err(e) = notifier.notify(&message).await {
                    tracing::error!(error = %e, "background CRM delivery failed");
                }
            });
            Ok(None)
        }
    }
}
