//! OpenAiClient against a local server speaking the chat-completions protocol

mod common;

use common::FakeUpstream;
use kommo_bridge::config::OpenAiConfig;
use kommo_bridge::llm::{
    CompletionProvider, CompletionRequest, GenerationConfig, LlmError, OpenAiClient,
};
use secrecy::SecretString;
use serde_json::json;

fn client(url: &str) -> OpenAiClient {
    OpenAiClient::new(&OpenAiConfig {
        api_key: SecretString::from("sk-test".to_string()),
        base_url: format!("{}/v1/", url),
        model: "gpt-4".to_string(),
        timeout_secs: 2,
        generation: GenerationConfig::default(),
    })
    .unwrap()
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": "gpt-4",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 20, "completion_tokens": 5, "total_tokens": 25}
    })
}

#[tokio::test]
async fn test_completion_text_returned() {
    let mut api = FakeUpstream::start(200, completion("  Olá! Sou a Luiza.  ")).await;

    let request = CompletionRequest::single_turn(Some("Você é a Luiza.".to_string()), "Oi")
        .with_config(GenerationConfig::new().with_max_tokens(150));
    let text = client(&api.url).complete(request).await.unwrap();
    assert_eq!(text, "Olá! Sou a Luiza.");

    let seen = api.next_request().await;
    assert_eq!(seen.path, "/v1/chat/completions");
    assert_eq!(seen.authorization.as_deref(), Some("Bearer sk-test"));
    assert_eq!(seen.body["model"], "gpt-4");
    assert_eq!(seen.body["max_tokens"], 150);
    assert!(seen.body.get("temperature").is_none());
    assert_eq!(
        seen.body["messages"],
        json!([
            {"role": "system", "content": "Você é a Luiza."},
            {"role": "user", "content": "Oi"}
        ])
    );
}

#[tokio::test]
async fn test_error_envelope_becomes_provider_error() {
    let api = FakeUpstream::start(
        401,
        json!({"error": {
            "message": "Incorrect API key provided",
            "type": "invalid_request_error",
            "code": "invalid_api_key"
        }}),
    )
    .await;

    let err = client(&api.url)
        .complete(CompletionRequest::single_turn(None, "Oi"))
        .await
        .unwrap_err();

    match err {
        LlmError::ProviderError { code, message } => {
            assert_eq!(code, "invalid_api_key");
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("expected ProviderError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unstructured_error_keeps_status() {
    let api = FakeUpstream::start(503, json!("overloaded")).await;

    let err = client(&api.url)
        .complete(CompletionRequest::single_turn(None, "Oi"))
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::HttpError { status: 503, .. }));
}

#[tokio::test]
async fn test_no_choices_is_empty_response() {
    let api = FakeUpstream::start(200, json!({"id": "chatcmpl-2", "choices": []})).await;

    let err = client(&api.url)
        .complete(CompletionRequest::single_turn(None, "Oi"))
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::EmptyResponse));
}
