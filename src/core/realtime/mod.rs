//! Speech-to-speech AI connection.
//!
//! # Architecture
//!
//! - [`RealtimeConnector`] opens one provider socket per call
//! - Provider frames are classified into [`RealtimeEvent`]s and pushed onto
//!   the call's event queue; the call session never sees provider JSON
//! - Outbound [`ClientEvent`]s go through an unbounded, non-blocking channel
//!
//! Connections are not retried mid-call; a lost connection ends the call.

mod base;
pub mod openai;

pub use base::{
    InputTranscriptionConfig, RealtimeConfig, RealtimeConnector, RealtimeError, RealtimeEvent,
    RealtimeResult, TurnDetectionConfig,
};
pub use openai::{
    ClientEvent, DEFAULT_TEMPERATURE, DEFAULT_TRANSCRIPTION_MODEL, OPENAI_REALTIME_URL,
    OpenAIRealtime, OpenAIRealtimeAudioFormat, OpenAIRealtimeModel, OpenAIRealtimeVoice,
    ServerEvent, SessionConfig,
};
