// HTTP server modules
pub mod config;
pub mod error;
pub mod handlers;
pub mod inbound;
pub mod models;
pub mod routes;
pub mod state;

// Kommo CRM delivery
pub mod crm;

// Chat-completion layer
pub mod llm;
