//! WebSocket mock of the OpenAI Realtime API.
//!
//! Accepts one connection, records the handshake, forwards every client
//! frame to the test and plays a scripted list of server events once the
//! client sends a frame of the trigger type (by default the session
//! configuration).

use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;

/// What the client sent during the upgrade.
#[derive(Debug, Clone, Default)]
pub struct CapturedHandshake {
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub openai_beta: Option<String>,
}

/// How the mock behaves after playing its script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptEnd {
    /// Keep reading until the client closes
    StayOpen,
    /// Send a close frame
    Close,
}

pub struct MockRealtimeServer {
    /// `ws://127.0.0.1:<port>` base URL
    pub url: String,
    /// Client frames as JSON, in arrival order
    pub received: mpsc::UnboundedReceiver<Value>,
    handshake: Arc<Mutex<Option<CapturedHandshake>>>,
}

impl MockRealtimeServer {
    /// Accept one client and play `script` after its `session.update`.
    pub async fn start(script: Vec<Value>, end: ScriptEnd) -> Self {
        Self::spawn("session.update", script, end, None).await
    }

    /// Accept one client and play `script` after the first frame of type `trigger`.
    pub async fn start_on(trigger: &'static str, script: Vec<Value>, end: ScriptEnd) -> Self {
        Self::spawn(trigger, script, end, None).await
    }

    /// Refuse the upgrade with `status`.
    pub async fn rejecting(status: StatusCode) -> Self {
        Self::spawn("session.update", Vec::new(), ScriptEnd::Close, Some(status)).await
    }

    pub fn handshake(&self) -> Option<CapturedHandshake> {
        self.handshake.lock().unwrap().clone()
    }

    async fn spawn(
        trigger: &'static str,
        script: Vec<Value>,
        end: ScriptEnd,
        reject: Option<StatusCode>,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (received_tx, received) = mpsc::unbounded_channel();
        let handshake = Arc::new(Mutex::new(None));
        let captured = handshake.clone();

        tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };

            let callback = move |request: &Request, response: Response| {
                let header = |name: &str| {
                    request
                        .headers()
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string)
                };
                *captured.lock().unwrap() = Some(CapturedHandshake {
                    path: request.uri().path().to_string(),
                    query: request.uri().query().map(str::to_string),
                    authorization: header("authorization"),
                    openai_beta: header("openai-beta"),
                });

                match reject {
                    Some(status) => {
                        let mut error = ErrorResponse::new(Some("rejected".to_string()));
                        *error.status_mut() = status;
                        Err(error)
                    }
                    None => Ok(response),
                }
            };

            let Ok(ws) = accept_hdr_async(stream, callback).await else {
                return;
            };
            let (mut write, mut read) = ws.split();
            let mut script = Some(script);

            while let Some(Ok(msg)) = read.next().await {
                match msg {
                    Message::Text(text) => {
                        let Ok(value) = serde_json::from_str::<Value>(text.as_str()) else {
                            continue;
                        };
                        let triggered = value["type"] == trigger;
                        let _ = received_tx.send(value);
                        if !triggered {
                            continue;
                        }
                        if let Some(events) = script.take() {
                            for event in events {
                                if write
                                    .send(Message::Text(event.to_string().into()))
                                    .await
                                    .is_err()
                                {
                                    return;
                                }
                            }
                            if end == ScriptEnd::Close {
                                let _ = write.send(Message::Close(None)).await;
                                return;
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        });

        Self {
            url: format!("ws://{addr}"),
            received,
            handshake,
        }
    }
}
