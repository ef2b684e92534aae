//! Request-level errors and their HTTP rendering

use std::convert::Infallible;
use thiserror::Error;
use warp::http::StatusCode;

use crate::crm::CrmError;
use crate::models::ErrorResponse;

/// Everything that can turn a webhook call into a non-200 answer
#[derive(Debug, Error)]
pub enum AppError {
    #[error("message is required")]
    MissingMessage,

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("payload too large")]
    PayloadTooLarge,

    #[error("invalid or missing webhook token")]
    Unauthorized,

    #[error("timed out delivering reply to CRM")]
    CrmTimeout,

    #[error("failed to deliver reply to CRM: {0}")]
    Crm(String),
}

impl From<CrmError> for AppError {
    fn from(err: CrmError) -> Self {
        match err {
            CrmError::Timeout => AppError::CrmTimeout,
            other => AppError::Crm(other.to_string()),
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingMessage | AppError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::CrmTimeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::Crm(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render as `{"error": ...}` with the matching status
    pub fn to_reply(&self) -> warp::reply::WithStatus<warp::reply::Json> {
        error_reply(self.status_code(), self.to_string())
    }
}

// Raised from filters that run before the handler, e.g. the body size check
impl warp::reject::Reject for AppError {}

pub fn error_reply(
    status: StatusCode,
    message: impl Into<String>,
) -> warp::reply::WithStatus<warp::reply::Json> {
    let body = ErrorResponse {
        error: message.into(),
    };
    warp::reply::with_status(warp::reply::json(&body), status)
}

/// Turn warp's own rejections (unknown path, wrong method, ...) into JSON
pub async fn handle_rejection(
    err: warp::Rejection,
) -> Result<warp::reply::WithStatus<warp::reply::Json>, Infallible> {
    if err.is_not_found() {
        return Ok(error_reply(StatusCode::NOT_FOUND, "not found"));
    }
    if let Some(app_err) = err.find::<AppError>() {
        return Ok(app_err.to_reply());
    }
    if err.find::<warp::reject::InvalidHeader>().is_some() {
        return Ok(error_reply(StatusCode::BAD_REQUEST, "invalid header"));
    }
    if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(error_reply(StatusCode::METHOD_NOT_ALLOWED, "method not allowed"));
    }

    tracing::error!(rejection = ?err, "unhandled rejection");
    Ok(error_reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal server error",
    ))
}
