// Handlers module

pub mod health;
pub mod webhook;

pub use health::health_handler;
pub use webhook::{answer, process_webhook, webhook_handler, WebhookMeta};
