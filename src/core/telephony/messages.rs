//! Telephony media-stream wire messages.
//!
//! Inbound frames arrive as JSON objects tagged by an `event` field:
//! - connected - socket handshake completed
//! - start - stream established, carries `streamSid`
//! - media - caller audio chunk with a playback timestamp
//! - mark - a previously sent mark has been played
//! - stop - the stream ended
//!
//! Outbound frames use the same envelope: `media`, `mark` and `clear`.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

// =============================================================================
// Errors
// =============================================================================

/// Errors raised while decoding or encoding telephony frames.
#[derive(Debug, Error)]
pub enum TelephonyError {
    /// Frame was not valid JSON or did not match the event schema
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Frame had no `event` field
    #[error("Frame is missing the event field")]
    MissingEvent,

    /// Binary frames are not part of the protocol
    #[error("Unexpected binary frame ({0} bytes)")]
    UnexpectedBinary(usize),

    /// Outbound frame could not be serialized
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type for telephony operations.
pub type TelephonyResult<T> = Result<T, TelephonyError>;

// =============================================================================
// Inbound
// =============================================================================

/// Raw inbound envelope as sent by the provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum InboundFrame {
    Connected,
    Start {
        start: StartPayload,
        #[serde(rename = "streamSid", default)]
        stream_sid: Option<String>,
    },
    Media {
        media: MediaPayload,
    },
    Mark {
        #[serde(default)]
        mark: Option<MarkPayload>,
    },
    Stop,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartPayload {
    #[serde(default)]
    stream_sid: Option<String>,
    #[serde(default)]
    call_sid: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct MediaPayload {
    #[serde(default, deserialize_with = "timestamp_ms")]
    timestamp: u64,
    payload: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct MarkPayload {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct EventName {
    event: Option<String>,
}

/// The provider encodes media timestamps as decimal strings; accept numbers too.
fn timestamp_ms<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Typed notification handed to the call session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelephonyEvent {
    /// Socket-level handshake, no stream yet
    Connected,
    /// Stream established
    Start {
        stream_sid: String,
        call_sid: Option<String>,
    },
    /// Caller audio chunk; `payload` is opaque provider-encoded audio
    Media { timestamp_ms: u64, payload: String },
    /// Playback acknowledgment for a previously sent mark
    Mark { name: Option<String> },
    /// Stream ended
    Stop,
    /// Event type this relay does not handle
    Unknown { event: String },
}

/// Decode one inbound text frame.
pub fn parse_frame(text: &str) -> TelephonyResult<TelephonyEvent> {
    let frame: InboundFrame = serde_json::from_str(text).map_err(|e| {
        if e.to_string().contains("missing field `event`") {
            TelephonyError::MissingEvent
        } else {
            TelephonyError::MalformedFrame(e.to_string())
        }
    })?;

    let event = match frame {
        InboundFrame::Connected => TelephonyEvent::Connected,
        InboundFrame::Start { start, stream_sid } => {
            let stream_sid = start.stream_sid.or(stream_sid).ok_or_else(|| {
                TelephonyError::MalformedFrame("start event without streamSid".to_string())
            })?;
            TelephonyEvent::Start {
                stream_sid,
                call_sid: start.call_sid,
            }
        }
        InboundFrame::Media { media } => TelephonyEvent::Media {
            timestamp_ms: media.timestamp,
            payload: media.payload,
        },
        InboundFrame::Mark { mark } => TelephonyEvent::Mark {
            name: mark.map(|m| m.name),
        },
        InboundFrame::Stop => TelephonyEvent::Stop,
        InboundFrame::Unknown => {
            let name = serde_json::from_str::<EventName>(text)
                .ok()
                .and_then(|n| n.event)
                .unwrap_or_default();
            TelephonyEvent::Unknown { event: name }
        }
    };

    Ok(event)
}

// =============================================================================
// Outbound
// =============================================================================

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OutboundMedia {
    pub payload: String,
}

/// Frames sent back to the telephony provider.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyOutbound {
    /// Audio chunk to play to the caller
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: OutboundMedia,
    },
    /// Ask for an acknowledgment once playback reaches this point
    Mark {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        mark: MarkPayload,
    },
    /// Discard buffered, unplayed audio
    Clear {
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },
}

impl TelephonyOutbound {
    pub fn media(stream_sid: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::Media {
            stream_sid: stream_sid.into(),
            media: OutboundMedia {
                payload: payload.into(),
            },
        }
    }

    pub fn mark(stream_sid: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Mark {
            stream_sid: stream_sid.into(),
            mark: MarkPayload { name: name.into() },
        }
    }

    pub fn clear(stream_sid: impl Into<String>) -> Self {
        Self::Clear {
            stream_sid: stream_sid.into(),
        }
    }

    /// Event name on the wire.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Media { .. } => "media",
            Self::Mark { .. } => "mark",
            Self::Clear { .. } => "clear",
        }
    }

    pub fn encode(&self) -> TelephonyResult<String> {
        serde_json::to_string(self).map_err(|e| TelephonyError::SerializationError(e.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
