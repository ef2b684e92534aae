//! OpenAI provider implementation
//!
//! Works against api.openai.com and any compatible gateway that exposes
//! `/chat/completions`.

pub mod client;
pub mod mapper;
pub mod types;

pub use client::OpenAiClient;
