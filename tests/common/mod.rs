#![allow(dead_code)]

use async_trait::async_trait;
use kommo_bridge::crm::{CrmDelivery, CrmError, CrmMessage, CrmNotifier, DispatchMode};
use kommo_bridge::llm::{CompletionProvider, CompletionRequest, LlmError, ReplyGenerator};
use kommo_bridge::state::AppState;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use warp::http::StatusCode;
use warp::path::FullPath;
use warp::Filter;

/// Completion provider that answers from a script and records every request
pub struct ScriptedProvider {
    answer: Option<String>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn answering(text: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Some(text.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            answer: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request);
        match &self.answer {
            Some(text) => Ok(text.clone()),
            None => Err(LlmError::HttpError {
                status: 500,
                body: "upstream exploded".to_string(),
            }),
        }
    }
}

/// What the fake CRM does with each notification
#[derive(Clone, Copy)]
pub enum CrmBehavior {
    Status(u16),
    Timeout,
    Refused,
}

/// CRM notifier that forwards every message to a channel
pub struct RecordingNotifier {
    behavior: CrmBehavior,
    tx: mpsc::UnboundedSender<CrmMessage>,
}

impl RecordingNotifier {
    pub fn new(behavior: CrmBehavior) -> (Arc<Self>, mpsc::UnboundedReceiver<CrmMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { behavior, tx }), rx)
    }
}

#[async_trait]
impl CrmNotifier for RecordingNotifier {
    async fn notify(&self, message: &CrmMessage) -> Result<CrmDelivery, CrmError> {
        let _ = self.tx.send(message.clone());
        match self.behavior {
            CrmBehavior::Status(status) => Ok(CrmDelivery {
                status,
                accepted: (200..300).contains(&status),
            }),
            CrmBehavior::Timeout => Err(CrmError::Timeout),
            CrmBehavior::Refused => Err(CrmError::Transport("connection refused".to_string())),
        }
    }
}

/// State wired to the fakes, CRM called inline
pub fn inline_state(
    provider: Arc<ScriptedProvider>,
    behavior: CrmBehavior,
) -> (AppState, mpsc::UnboundedReceiver<CrmMessage>) {
    let (notifier, rx) = RecordingNotifier::new(behavior);
    let state = AppState::new(ReplyGenerator::new(provider).with_fallback(FALLBACK), notifier)
        .with_dispatch_mode(DispatchMode::Inline);
    (state, rx)
}

pub const FALLBACK: &str = "Desculpe, tente novamente.";

/// A request received by a `FakeUpstream`
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

/// Local HTTP server standing in for the completion API or the CRM
pub struct FakeUpstream {
    /// `http://127.0.0.1:<port>`
    pub url: String,
    pub requests: mpsc::UnboundedReceiver<SeenRequest>,
}

impl FakeUpstream {
    /// Answer every POST with `status` and the JSON `response`
    pub async fn start(status: u16, response: Value) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let status = StatusCode::from_u16(status).unwrap();

        let route = warp::post()
            .and(warp::path::full())
            .and(warp::header::optional::<String>("authorization"))
            .and(warp::body::json::<Value>())
            .map(move |path: FullPath, authorization: Option<String>, body: Value| {
                let _ = tx.send(SeenRequest {
                    path: path.as_str().to_string(),
                    authorization,
                    body,
                });
                warp::reply::with_status(warp::reply::json(&response), status)
            });

        let addr = free_local_addr();
        tokio::spawn(warp::serve(route).run(addr));
        wait_until_listening(addr).await;

        Self {
            url: format!("http://{}", addr),
            requests: rx,
        }
    }

    /// Next request, failing the test if none arrives within two seconds
    pub async fn next_request(&mut self) -> SeenRequest {
        tokio::time::timeout(Duration::from_secs(2), self.requests.recv())
            .await
            .expect("no request reached the upstream")
            .expect("upstream channel closed")
    }
}

/// Accepts connections and never answers
pub async fn silent_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{}", addr)
}

fn free_local_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

async fn wait_until_listening(addr: SocketAddr) {
    for _ in 0..100 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("fake upstream did not start on {}", addr);
}
