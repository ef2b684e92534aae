//! Delivery of generated replies back to the Kommo CRM

pub mod client;
pub mod dispatch;
pub mod error;
pub mod payload;

pub use client::{CrmDelivery, CrmNotifier, KommoClient};
pub use dispatch::{deliver, DispatchMode};
pub use error::CrmError;
pub use payload::{build_payload, CrmMessage, CrmPayload, PayloadFormat};
