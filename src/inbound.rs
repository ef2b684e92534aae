//! Webhook body parsing
//!
//! Kommo delivers chat events form-encoded with bracketed keys such as
//! `message[add][0][text]`. Direct integrations post a flat JSON object
//! `{"message": "...", "lead_id": ...}`. Both end up as an `InboundMessage`.

use serde_json::{Map, Value};

use crate::error::AppError;
use crate::models::{ConversationIds, InboundMessage};

const FORM_PREFIX: &str = "message[add][0]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
}

/// Parse a webhook body according to its `Content-Type`
///
/// Without a content type the body is sniffed: a leading `{` means JSON,
/// anything else is treated as form data.
pub fn parse_inbound(content_type: Option<&str>, body: &[u8]) -> Result<InboundMessage, AppError> {
    match body_kind(content_type, body)? {
        BodyKind::Json => parse_json(body),
        BodyKind::Form => parse_form(body),
    }
}

fn body_kind(content_type: Option<&str>, body: &[u8]) -> Result<BodyKind, AppError> {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|m| m.trim().to_ascii_lowercase())
        .filter(|m| !m.is_empty());

    match mime.as_deref() {
        Some("application/json") => Ok(BodyKind::Json),
        Some(m) if m.ends_with("+json") => Ok(BodyKind::Json),
        Some("application/x-www-form-urlencoded") => Ok(BodyKind::Form),
        Some(other) => Err(AppError::UnsupportedContentType(other.to_string())),
        None => {
            let first = body.iter().find(|b| !b.is_ascii_whitespace());
            if first == Some(&b'{') {
                Ok(BodyKind::Json)
            } else {
                Ok(BodyKind::Form)
            }
        }
    }
}

fn parse_json(body: &[u8]) -> Result<InboundMessage, AppError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| AppError::InvalidPayload(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| AppError::InvalidPayload("expected a JSON object".to_string()))?;

    let text = object
        .get("message")
        .and_then(Value::as_str)
        .and_then(non_blank)
        .ok_or(AppError::MissingMessage)?;

    Ok(InboundMessage {
        text,
        ids: ConversationIds {
            lead_id: json_id(object, "lead_id"),
            chat_id: json_id(object, "chat_id"),
            contact_id: json_id(object, "contact_id"),
            talk_id: json_id(object, "talk_id"),
        },
    })
}

// Identifiers arrive as strings or numbers depending on the sender
fn json_id(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) => non_blank(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_form(body: &[u8]) -> Result<InboundMessage, AppError> {
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_bytes(body).map_err(|e| AppError::InvalidPayload(e.to_string()))?;

    let field = |name: &str| -> Option<String> {
        let key = format!("{}[{}]", FORM_PREFIX, name);
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .and_then(|(_, v)| non_blank(v))
    };
    let flat = |name: &str| -> Option<String> {
        pairs
            .iter()
            .find(|(k, _)| k == name)
            .and_then(|(_, v)| non_blank(v))
    };

    let text = field("text")
        .or_else(|| flat("message"))
        .ok_or(AppError::MissingMessage)?;

    Ok(InboundMessage {
        text,
        ids: ConversationIds {
            lead_id: field("entity_id").or_else(|| flat("lead_id")),
            chat_id: field("chat_id"),
            contact_id: field("contact_id"),
            talk_id: field("talk_id"),
        },
    })
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: Option<&str> = Some("application/json");
    const FORM: Option<&str> = Some("application/x-www-form-urlencoded");

    #[test]
    fn test_json_message_and_lead() {
        let body = r#"{"message": "Olá, quero agendar", "lead_id": "123"}"#.as_bytes();
        let inbound = parse_inbound(JSON, body).unwrap();
        assert_eq!(inbound.text, "Olá, quero agendar");
        assert_eq!(inbound.ids.lead_id.as_deref(), Some("123"));
        assert!(inbound.ids.chat_id.is_none());
    }

    #[test]
    fn test_json_numeric_lead_id() {
        let body = br#"{"message": "oi", "lead_id": 98765}"#;
        let inbound = parse_inbound(Some("application/json; charset=utf-8"), body).unwrap();
        assert_eq!(inbound.ids.lead_id.as_deref(), Some("98765"));
    }

    #[test]
    fn test_json_missing_message() {
        let err = parse_inbound(JSON, br#"{"lead_id": "1"}"#).unwrap_err();
        assert!(matches!(err, AppError::MissingMessage));
    }

    #[test]
    fn test_json_blank_message_is_missing() {
        let err = parse_inbound(JSON, br#"{"message": "   "}"#).unwrap_err();
        assert!(matches!(err, AppError::MissingMessage));
    }

    #[test]
    fn test_json_non_string_message_is_missing() {
        let err = parse_inbound(JSON, br#"{"message": 5}"#).unwrap_err();
        assert!(matches!(err, AppError::MissingMessage));
    }

    #[test]
    fn test_json_malformed() {
        let err = parse_inbound(JSON, b"{not json").unwrap_err();
        assert!(matches!(err, AppError::InvalidPayload(_)));
    }

    #[test]
    fn test_json_array_rejected() {
        let err = parse_inbound(JSON, b"[1,2]").unwrap_err();
        assert!(matches!(err, AppError::InvalidPayload(_)));
    }

    #[test]
    fn test_kommo_form_payload() {
        let body = b"message%5Badd%5D%5B0%5D%5Btext%5D=Quero+saber+do+VIP&\
message%5Badd%5D%5B0%5D%5Bchat_id%5D=abc-123&\
message%5Badd%5D%5B0%5D%5Bcontact_id%5D=555&\
message%5Badd%5D%5B0%5D%5Btalk_id%5D=77&\
message%5Badd%5D%5B0%5D%5Bentity_id%5D=9001&\
account%5Bsubdomain%5D=clinic";
        let inbound = parse_inbound(FORM, body).unwrap();
        assert_eq!(inbound.text, "Quero saber do VIP");
        assert_eq!(inbound.ids.chat_id.as_deref(), Some("abc-123"));
        assert_eq!(inbound.ids.contact_id.as_deref(), Some("555"));
        assert_eq!(inbound.ids.talk_id.as_deref(), Some("77"));
        assert_eq!(inbound.ids.lead_id.as_deref(), Some("9001"));
    }

    #[test]
    fn test_form_unencoded_brackets() {
        let body = b"message[add][0][text]=oi&message[add][0][chat_id]=c1";
        let inbound = parse_inbound(FORM, body).unwrap();
        assert_eq!(inbound.text, "oi");
        assert_eq!(inbound.ids.chat_id.as_deref(), Some("c1"));
    }

    #[test]
    fn test_form_missing_text() {
        let body = b"message[add][0][chat_id]=c1";
        let err = parse_inbound(FORM, body).unwrap_err();
        assert!(matches!(err, AppError::MissingMessage));
    }

    #[test]
    fn test_form_flat_keys() {
        let inbound = parse_inbound(FORM, b"message=oi&lead_id=7").unwrap();
        assert_eq!(inbound.text, "oi");
        assert_eq!(inbound.ids.lead_id.as_deref(), Some("7"));
    }

    #[test]
    fn test_sniffing_without_content_type() {
        let json = parse_inbound(None, b"  {\"message\": \"oi\"}").unwrap();
        assert_eq!(json.text, "oi");

        let form = parse_inbound(None, b"message[add][0][text]=ola").unwrap();
        assert_eq!(form.text, "ola");
    }

    #[test]
    fn test_unsupported_content_type() {
        let err = parse_inbound(Some("text/plain"), b"oi").unwrap_err();
        assert!(matches!(err, AppError::UnsupportedContentType(ref ct) if ct == "text/plain"));
    }
}
