// POST /kommo-webhook handler

use bytes::Bytes;
use std::collections::HashMap;
use std::convert::Infallible;
use warp::http::StatusCode;

use crate::crm::{deliver, CrmMessage};
use crate::error::AppError;
use crate::inbound::parse_inbound;
use crate::models::{InboundMessage, ReplyResponse};
use crate::routes::MAX_BODY_BYTES;
use crate::state::AppState;

/// Header and query values a webhook call can carry
#[derive(Debug, Clone, Default)]
pub struct WebhookMeta {
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub query: HashMap<String, String>,
}

impl WebhookMeta {
    // `Authorization: Bearer <t>` wins over `?token=<t>`
    fn presented_token(&self) -> Option<&str> {
        self.authorization
            .as_deref()
            .and_then(bearer_token)
            .or_else(|| self.query.get("token").map(String::as_str))
    }
}

// Auth schemes are case-insensitive
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim())
    } else {
        None
    }
}

pub async fn webhook_handler(
    authorization: Option<String>,
    content_type: Option<String>,
    query: HashMap<String, String>,
    body: Bytes,
    state: AppState,
) -> Result<warp::reply::WithStatus<warp::reply::Json>, Infallible> {
    let meta = WebhookMeta {
        authorization,
        content_type,
        query,
    };

    match process_webhook(&state, &meta, &body).await {
        Ok(response) => Ok(warp::reply::with_status(
            warp::reply::json(&response),
            StatusCode::OK,
        )),
        Err(e) => {
            tracing::warn!(status = e.status_code().as_u16(), error = %e, "webhook rejected");
            Ok(e.to_reply())
        }
    }
}

/// Authorize, parse, then answer one webhook call
pub async fn process_webhook(
    state: &AppState,
    meta: &WebhookMeta,
    body: &[u8],
) -> Result<ReplyResponse, AppError> {
    if !state.token_matches(meta.presented_token()) {
        return Err(AppError::Unauthorized);
    }

    if body.len() as u64 > MAX_BODY_BYTES {
        return Err(AppError::PayloadTooLarge);
    }

    let inbound = parse_inbound(meta.content_type.as_deref(), body)?;
    answer(state, inbound).await
}

/// Generate the reply and hand it to the CRM
pub async fn answer(state: &AppState, inbound: InboundMessage) -> Result<ReplyResponse, AppError> {
    tracing::info!(
        lead_id = inbound.ids.lead_id.as_deref().unwrap_or("-"),
        chat_id = inbound.ids.chat_id.as_deref().unwrap_or("-"),
        chars = inbound.text.chars().count(),
        "webhook message received"
    );

    let reply = state.generator.generate_reply(&inbound.text).await;

    let message = CrmMessage {
        ids: inbound.ids,
        reply: reply.clone(),
    };
    deliver(state.notifier.clone(), state.dispatch_mode, message).await?;

    Ok(ReplyResponse { reply })
}
