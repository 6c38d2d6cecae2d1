//! OpenAI Realtime API client implementation.
//!
//! Opens one WebSocket per call, then runs a single task that both writes
//! queued [`ClientEvent`]s and decodes server frames into
//! [`RealtimeEvent`]s on the call's event queue.
//!
//! # API Reference
//!
//! - Endpoint: `wss://api.openai.com/v1/realtime?model=<model>`
//! - Protocol: WebSocket with JSON events, `OpenAI-Beta: realtime=v1`
//! - Audio: G.711 u-law passthrough, base64 encoded

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderValue, Request, StatusCode, header};
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use super::config::{
    Modality, OPENAI_BETA_HEADER, OPENAI_REALTIME_URL, OpenAIRealtimeAudioFormat, OpenAIRealtimeModel,
    OpenAIRealtimeVoice,
};
use super::messages::{
    ClientEvent, InputAudioTranscription, ServerEvent, SessionConfig, TurnDetection,
    is_logged_event_type,
};
use crate::core::channel::{MessageRoute, OutboundChannel};
use crate::core::events::{SessionEvent, SessionEventSender};
use crate::core::realtime::base::{
    RealtimeConfig, RealtimeConnector, RealtimeError, RealtimeEvent, RealtimeResult,
    TurnDetectionConfig,
};

// =============================================================================
// OpenAI Realtime Client
// =============================================================================

/// OpenAI Realtime API connector.
///
/// Holds only immutable configuration, so one instance is shared by every
/// call; each [`connect`](RealtimeConnector::connect) opens a fresh socket.
#[derive(Debug, Clone)]
pub struct OpenAIRealtime {
    /// Configuration
    config: RealtimeConfig,
    /// Parsed model
    model: OpenAIRealtimeModel,
    /// Parsed voice
    voice: OpenAIRealtimeVoice,
    /// Input audio format
    input_format: OpenAIRealtimeAudioFormat,
    /// Output audio format
    output_format: OpenAIRealtimeAudioFormat,
}

impl OpenAIRealtime {
    pub fn new(config: RealtimeConfig) -> RealtimeResult<Self> {
        if config.api_key.is_empty() {
            return Err(RealtimeError::AuthenticationFailed(
                "API key is required".to_string(),
            ));
        }

        let model = if config.model.is_empty() {
            OpenAIRealtimeModel::default()
        } else {
            OpenAIRealtimeModel::parse(&config.model).ok_or_else(|| {
                RealtimeError::InvalidConfiguration(format!(
                    "Unsupported realtime model: {}",
                    config.model
                ))
            })?
        };

        let voice = match config.voice.as_deref() {
            Some(name) => OpenAIRealtimeVoice::parse(name).ok_or_else(|| {
                RealtimeError::InvalidConfiguration(format!("Unsupported voice: {name}"))
            })?,
            None => OpenAIRealtimeVoice::default(),
        };

        let input_format = match config.input_audio_format.as_deref() {
            Some(name) => parse_audio_format(name)?,
            None => OpenAIRealtimeAudioFormat::default(),
        };

        let output_format = match config.output_audio_format.as_deref() {
            Some(name) => parse_audio_format(name)?,
            None => input_format,
        };

        let client = Self {
            config,
            model,
            voice,
            input_format,
            output_format,
        };
        // Fail at startup rather than on the first call.
        client.build_ws_url()?;
        Ok(client)
    }

    /// Get the configured model.
    pub fn model(&self) -> OpenAIRealtimeModel {
        self.model
    }

    /// Get the configured voice.
    pub fn voice(&self) -> OpenAIRealtimeVoice {
        self.voice
    }

    /// Build the WebSocket URL with model parameter.
    pub fn build_ws_url(&self) -> RealtimeResult<Url> {
        let base = if self.config.url.is_empty() {
            OPENAI_REALTIME_URL
        } else {
            self.config.url.as_str()
        };

        let mut url = Url::parse(base).map_err(|e| {
            RealtimeError::InvalidConfiguration(format!("Invalid realtime URL '{base}': {e}"))
        })?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(RealtimeError::InvalidConfiguration(format!(
                "Realtime URL must use ws or wss, got: {}",
                url.scheme()
            )));
        }

        url.query_pairs_mut().append_pair("model", self.model.as_str());
        Ok(url)
    }

    /// Build the session configuration sent once per connection.
    pub fn build_session_config(&self) -> SessionConfig {
        SessionConfig {
            modalities: Some(
                self.config
                    .modalities
                    .clone()
                    .unwrap_or_else(|| {
                        [Modality::Text, Modality::Audio]
                            .iter()
                            .map(|m| m.as_str().to_string())
                            .collect()
                    }),
            ),
            voice: Some(self.voice.as_str().to_string()),
            instructions: self.config.instructions.clone(),
            input_audio_format: Some(self.input_format.as_str().to_string()),
            output_audio_format: Some(self.output_format.as_str().to_string()),
            input_audio_transcription: self
                .config
                .input_audio_transcription
                .as_ref()
                .filter(|t| !t.model.is_empty())
                .map(|t| InputAudioTranscription {
                    model: t.model.clone(),
                }),
            turn_detection: match self.config.turn_detection.clone().unwrap_or_default() {
                TurnDetectionConfig::ServerVad {
                    threshold,
                    prefix_padding_ms,
                    silence_duration_ms,
                } => Some(TurnDetection::ServerVad {
                    threshold,
                    prefix_padding_ms,
                    silence_duration_ms,
                }),
                TurnDetectionConfig::None => None,
            },
            temperature: self.config.temperature,
        }
    }

    /// The `session.update` event for this configuration.
    pub fn session_update(&self) -> ClientEvent {
        ClientEvent::SessionUpdate {
            session: self.build_session_config(),
        }
    }

    fn build_request(&self) -> RealtimeResult<Request<()>> {
        let url = self.build_ws_url()?;
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| RealtimeError::InvalidConfiguration(e.to_string()))?;

        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.config.api_key))
            .map_err(|e| RealtimeError::InvalidConfiguration(format!("Invalid API key: {e}")))?;
        let headers = request.headers_mut();
        headers.insert(header::AUTHORIZATION, bearer);
        headers.insert("OpenAI-Beta", HeaderValue::from_static(OPENAI_BETA_HEADER));

        Ok(request)
    }
}

#[async_trait]
impl RealtimeConnector for OpenAIRealtime {
    async fn connect(
        &self,
        call_id: &str,
        events: SessionEventSender,
    ) -> RealtimeResult<OutboundChannel<ClientEvent>> {
        let request = self.build_request()?;

        let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| match e {
                tungstenite::Error::Http(response)
                    if response.status() == StatusCode::UNAUTHORIZED =>
                {
                    RealtimeError::AuthenticationFailed("API key rejected".to_string())
                }
                other => RealtimeError::ConnectionFailed(other.to_string()),
            })?;

        info!(call_id = %call_id, model = %self.model, "Connected to OpenAI Realtime API");

        let (mut ws_sink, mut ws_stream) = ws_stream.split();
        let (channel, mut rx) = OutboundChannel::new("openai");

        events
            .send(SessionEvent::AiConnected(channel.clone()))
            .await
            .map_err(|_| RealtimeError::SessionClosed)?;

        let task_channel = channel.clone();
        let call_id = call_id.to_string();

        tokio::spawn(async move {
            let reason = loop {
                tokio::select! {
                    route = rx.recv() => match route {
                        Some(MessageRoute::Frame(event)) => {
                            let json = match serde_json::to_string(&event) {
                                Ok(j) => j,
                                Err(e) => {
                                    error!(call_id = %call_id, "Failed to serialize {}: {}", event.event_type(), e);
                                    continue;
                                }
                            };

                            if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                                error!(call_id = %call_id, "Failed to send WebSocket message: {}", e);
                                break format!("send failed: {e}");
                            }
                        }
                        Some(MessageRoute::Close) | None => {
                            debug!(call_id = %call_id, "Closing OpenAI Realtime connection");
                            let _ = ws_sink.send(Message::Close(None)).await;
                            break "closed by relay".to_string();
                        }
                    },

                    msg = ws_stream.next() => match msg {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(event) = decode_server_event(&call_id, text.as_str())
                                && events.send(SessionEvent::Ai(event)).await.is_err()
                            {
                                break "call session ended".to_string();
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            info!(call_id = %call_id, ?frame, "WebSocket closed by server");
                            break "closed by provider".to_string();
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = ws_sink.send(Message::Pong(data)).await {
                                warn!(call_id = %call_id, "Failed to send pong: {}", e);
                            }
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            error!(call_id = %call_id, "WebSocket error: {}", e);
                            break format!("websocket error: {e}");
                        }
                        None => break "stream ended".to_string(),
                    },
                }
            };

            task_channel.mark_closed();
            info!(call_id = %call_id, reason = %reason, "Disconnected from OpenAI Realtime API");
            let _ = events.send(SessionEvent::AiClosed { reason }).await;
        });

        Ok(channel)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

fn parse_audio_format(name: &str) -> RealtimeResult<OpenAIRealtimeAudioFormat> {
    OpenAIRealtimeAudioFormat::parse(name).ok_or_else(|| {
        RealtimeError::InvalidConfiguration(format!("Unsupported audio format: {name}"))
    })
}

// =============================================================================
// Event Classification
// =============================================================================

/// Decode one server frame. Malformed frames are logged and dropped.
pub fn decode_server_event(call_id: &str, text: &str) -> Option<RealtimeEvent> {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!(call_id = %call_id, "Dropping unparseable server frame: {}", e);
            return None;
        }
    };

    let event_type = value
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or_default()
        .to_string();

    if is_logged_event_type(&event_type) {
        info!(call_id = %call_id, event_type = %event_type, "Received event");
    } else {
        trace!(call_id = %call_id, event_type = %event_type, "Received event");
    }

    match serde_json::from_value::<ServerEvent>(value) {
        Ok(event) => classify(event),
        Err(e) => {
            warn!(call_id = %call_id, event_type = %event_type, "Dropping malformed server event: {}", e);
            None
        }
    }
}

/// Map a wire event onto what the call session cares about.
pub fn classify(event: ServerEvent) -> Option<RealtimeEvent> {
    match event {
        ServerEvent::SessionCreated { session } => Some(RealtimeEvent::SessionCreated {
            session_id: session.and_then(|s| s.id),
        }),
        ServerEvent::SessionUpdated => Some(RealtimeEvent::SessionUpdated),
        ServerEvent::AudioDelta { item_id, delta } if !delta.is_empty() => {
            Some(RealtimeEvent::AudioDelta { delta, item_id })
        }
        ServerEvent::ContentDone { item_id, content } => {
            let segments: Vec<String> = content
                .into_iter()
                .filter(|part| part.content_type == "text")
                .filter_map(|part| part.text)
                .filter(|text| !text.is_empty())
                .collect();
            (!segments.is_empty()).then_some(RealtimeEvent::TurnContentDone { item_id, segments })
        }
        ServerEvent::AudioTranscriptDone {
            item_id,
            transcript,
        } if !transcript.is_empty() => {
            Some(RealtimeEvent::TurnContentDone {
                item_id,
                segments: vec![transcript],
            })
        }
        ServerEvent::TranscriptionCompleted { transcript, .. } if !transcript.is_empty() => {
            Some(RealtimeEvent::CallerTranscript { text: transcript })
        }
        ServerEvent::SpeechStarted { audio_start_ms, .. } => {
            Some(RealtimeEvent::SpeechStarted { audio_start_ms })
        }
        ServerEvent::SpeechStopped { .. } => Some(RealtimeEvent::SpeechStopped),
        ServerEvent::ResponseDone { response } => Some(RealtimeEvent::ResponseDone {
            response_id: response.and_then(|r| r.id),
        }),
        ServerEvent::Error { error } => Some(RealtimeEvent::Error {
            message: error
                .map(|e| e.message)
                .unwrap_or_else(|| "unknown error".to_string()),
        }),
        ServerEvent::TranscriptionFailed { item_id, error } => {
            warn!(
                item_id = ?item_id,
                "Caller transcription failed: {}",
                error.map(|e| e.message).unwrap_or_default()
            );
            None
        }
        ServerEvent::RateLimitsUpdated { rate_limits } => {
            for limit in rate_limits {
                debug!(
                    name = %limit.name,
                    remaining = limit.remaining,
                    limit = limit.limit,
                    reset_seconds = limit.reset_seconds,
                    "Rate limit"
                );
            }
            None
        }
        _ => None,
    }
}

// =============================================================================
// Tests
// =============================================================================
