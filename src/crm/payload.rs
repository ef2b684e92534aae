//! Outbound CRM payload shapes

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::ConversationIds;

/// Which JSON body the CRM endpoint expects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    /// `{"lead_id": .., "message": ..}`
    #[default]
    Lead,
    /// `{"message": [{.., "text": ..}]}`
    MessageList,
    /// `{"messages": [{"id": <uuid>, .., "type": "text", "text": ..}]}`
    Messages,
}

impl PayloadFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadFormat::Lead => "lead",
            PayloadFormat::MessageList => "message_list",
            PayloadFormat::Messages => "messages",
        }
    }
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayloadFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lead" => Ok(PayloadFormat::Lead),
            "message_list" | "message" => Ok(PayloadFormat::MessageList),
            "messages" => Ok(PayloadFormat::Messages),
            other => Err(format!("unknown payload format `{}`", other)),
        }
    }
}

/// A reply addressed to one conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrmMessage {
    pub ids: ConversationIds,
    pub reply: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CrmPayload {
    Lead {
        #[serde(skip_serializing_if = "Option::is_none")]
        lead_id: Option<String>,
        message: String,
    },
    MessageList {
        message: Vec<OutboundMessage>,
    },
    Messages {
        messages: Vec<OutboundMessage>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(flatten)]
    pub ids: ConversationIds,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

// Chat-level entries address the conversation, not the lead
fn chat_ids(ids: &ConversationIds) -> ConversationIds {
    ConversationIds {
        lead_id: None,
        ..ids.clone()
    }
}

/// Build the body for `format`; the reply is the only text that leaves
pub fn build_payload(format: PayloadFormat, message: &CrmMessage) -> CrmPayload {
    match format {
        PayloadFormat::Lead => CrmPayload::Lead {
            lead_id: message.ids.lead_id.clone(),
            message: message.reply.clone(),
        },
        PayloadFormat::MessageList => CrmPayload::MessageList {
            message: vec![OutboundMessage {
                id: None,
                ids: chat_ids(&message.ids),
                message_type: None,
                text: message.reply.clone(),
                created_at: None,
            }],
        },
        PayloadFormat::Messages => CrmPayload::Messages {
            messages: vec![OutboundMessage {
                id: Some(Uuid::new_v4()),
                ids: chat_ids(&message.ids),
                message_type: Some("text".to_string()),
                text: message.reply.clone(),
                created_at: Some(Utc::now().timestamp()),
            }],
        },
    }
}
