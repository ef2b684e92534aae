//! Error types for CRM delivery

use thiserror::Error;

/// Failures that prevented the CRM from receiving a reply
///
/// A non-2xx answer is not an error: the CRM received the request and said
/// no, which is logged and reported through `CrmDelivery`.
#[derive(Debug, Error)]
pub enum CrmError {
    /// No answer within the configured timeout
    #[error("CRM request timed out")]
    Timeout,

    /// Connection refused, DNS failure, TLS failure, ...
    #[error("CRM transport error: {0}")]
    Transport(String),

    /// HTTP client could not be constructed
    #[error("CRM client configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for CrmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CrmError::Timeout
        } else {
            CrmError::Transport(err.to_string())
        }
    }
}
