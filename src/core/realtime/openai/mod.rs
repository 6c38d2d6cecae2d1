//! OpenAI Realtime API module.
//!
//! # Supported Models
//!
//! - `gpt-4o-realtime-preview-2024-10-01` - October 2024 version (default)
//! - `gpt-4o-realtime-preview` - GPT-4o Realtime Preview
//! - `gpt-4o-realtime-preview-2024-12-17` - December 2024 version
//! - `gpt-4o-mini-realtime-preview` - Mini model for lower latency
//!
//! # Supported Voices
//!
//! alloy, ash, ballad, coral, echo, sage, shimmer, verse
//!
//! # Audio Format
//!
//! Telephony audio is G.711 u-law at 8kHz and is passed through untouched in
//! both directions. PCM16 and a-law are accepted for other deployments.

mod client;
mod config;
mod messages;

pub use client::{OpenAIRealtime, classify, decode_server_event};
pub use config::{
    DEFAULT_TEMPERATURE, DEFAULT_TRANSCRIPTION_MODEL, Modality, OPENAI_BETA_HEADER,
    OPENAI_REALTIME_URL, OpenAIRealtimeAudioFormat, OpenAIRealtimeModel, OpenAIRealtimeVoice,
};
pub use messages::{
    ApiError, ClientEvent, ContentPart, ConversationItem, InputAudioTranscription,
    LOGGED_EVENT_TYPES, ServerEvent, SessionConfig, TurnDetection, is_logged_event_type,
};
