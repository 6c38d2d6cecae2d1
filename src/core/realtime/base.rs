//! Base types for the speech-to-speech AI connection.
//!
//! A provider opens one outbound socket per call, configures the session, and
//! turns the provider's wire events into [`RealtimeEvent`]s on the call's
//! event queue. The call session never sees provider JSON.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::channel::OutboundChannel;
use crate::core::events::SessionEventSender;

use super::openai::ClientEvent;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur on the AI connection.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Connection to the provider failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The call session stopped listening before the connection was handed over
    #[error("Call session closed")]
    SessionClosed,
}

/// Result type for realtime operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;

// =============================================================================
// Configuration Types
// =============================================================================

/// Configuration for a realtime provider connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// API key for authentication
    pub api_key: String,

    /// WebSocket endpoint; the provider default is used when empty
    #[serde(default)]
    pub url: String,

    /// Model to use (e.g., "gpt-4o-realtime-preview-2024-10-01")
    #[serde(default)]
    pub model: String,

    /// Voice ID for audio output
    #[serde(default)]
    pub voice: Option<String>,

    /// System instructions for the assistant
    #[serde(default)]
    pub instructions: Option<String>,

    /// Temperature for response generation
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Input audio format
    #[serde(default)]
    pub input_audio_format: Option<String>,

    /// Output audio format
    #[serde(default)]
    pub output_audio_format: Option<String>,

    /// Enable caller transcription
    #[serde(default)]
    pub input_audio_transcription: Option<InputTranscriptionConfig>,

    /// Turn detection configuration
    #[serde(default)]
    pub turn_detection: Option<TurnDetectionConfig>,

    /// Response modalities (text, audio, or both)
    #[serde(default)]
    pub modalities: Option<Vec<String>>,
}

/// Configuration for input audio transcription.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputTranscriptionConfig {
    /// Model to use for transcription (e.g., "whisper-1")
    pub model: String,
}

/// Configuration for turn detection (VAD).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TurnDetectionConfig {
    /// Server-side VAD
    #[serde(rename = "server_vad")]
    ServerVad {
        /// Activation threshold (0.0 to 1.0)
        #[serde(default)]
        threshold: Option<f32>,
        /// Amount of audio to include before voice detection (ms)
        #[serde(default)]
        prefix_padding_ms: Option<u32>,
        /// Silence duration before end of turn (ms)
        #[serde(default)]
        silence_duration_ms: Option<u32>,
    },
    /// No automatic turn detection
    #[serde(rename = "none")]
    None,
}

impl Default for TurnDetectionConfig {
    fn default() -> Self {
        TurnDetectionConfig::ServerVad {
            threshold: Some(0.5),
            prefix_padding_ms: Some(300),
            silence_duration_ms: Some(500),
        }
    }
}

// =============================================================================
// Events
// =============================================================================

/// Provider event after classification, as seen by the call session.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    /// Session exists on the provider side
    SessionCreated { session_id: Option<String> },
    /// Provider acknowledged the session configuration
    SessionUpdated,
    /// AI speech chunk; `delta` is opaque audio in the telephony codec
    AudioDelta { delta: String, item_id: Option<String> },
    /// Final text of an AI turn, one entry per content segment
    TurnContentDone {
        item_id: Option<String>,
        segments: Vec<String>,
    },
    /// Caller's turn, transcribed
    CallerTranscript { text: String },
    /// Caller began talking
    SpeechStarted { audio_start_ms: Option<u64> },
    /// Caller stopped talking
    SpeechStopped,
    /// Provider finished generating a response
    ResponseDone { response_id: Option<String> },
    /// Provider reported an error; not fatal by itself
    Error { message: String },
}

impl RealtimeEvent {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionCreated { .. } => "session_created",
            Self::SessionUpdated => "session_updated",
            Self::AudioDelta { .. } => "audio_delta",
            Self::TurnContentDone { .. } => "turn_content_done",
            Self::CallerTranscript { .. } => "caller_transcript",
            Self::SpeechStarted { .. } => "speech_started",
            Self::SpeechStopped => "speech_stopped",
            Self::ResponseDone { .. } => "response_done",
            Self::Error { .. } => "error",
        }
    }
}

// =============================================================================
// Connector Trait
// =============================================================================

/// Opens the AI side of a call.
///
/// On success the implementation must have queued
/// [`SessionEvent::AiConnected`](crate::core::events::SessionEvent::AiConnected)
/// before any provider event, and must report `AiClosed` exactly once when
/// the connection ends. Connections are never retried mid-call.
#[async_trait]
pub trait RealtimeConnector: Send + Sync {
    async fn connect(
        &self,
        call_id: &str,
        events: SessionEventSender,
    ) -> RealtimeResult<OutboundChannel<ClientEvent>>;

    /// Provider name for logs and status output.
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_detection_default() {
        match TurnDetectionConfig::default() {
            TurnDetectionConfig::ServerVad {
                threshold,
                prefix_padding_ms,
                silence_duration_ms,
            } => {
                assert_eq!(threshold, Some(0.5));
                assert_eq!(prefix_padding_ms, Some(300));
                assert_eq!(silence_duration_ms, Some(500));
            }
            _ => panic!("Expected server VAD"),
        }
    }

    #[test]
    fn test_turn_detection_deserialize() {
        let td: TurnDetectionConfig = serde_json::from_str(r#"{"type":"none"}"#).unwrap();
        assert!(matches!(td, TurnDetectionConfig::None));

        let td: TurnDetectionConfig =
            serde_json::from_str(r#"{"type":"server_vad","threshold":0.7}"#).unwrap();
        match td {
            TurnDetectionConfig::ServerVad {
                threshold,
                silence_duration_ms,
                ..
            } => {
                assert_eq!(threshold, Some(0.7));
                assert_eq!(silence_duration_ms, None);
            }
            _ => panic!("Expected server VAD"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = RealtimeError::ConnectionFailed("refused".to_string());
        assert_eq!(err.to_string(), "Connection failed: refused");
    }
}
