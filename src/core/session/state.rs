//! Per-call state owned by the call session.

use std::fmt;

use crate::core::playback::PlaybackTracker;
use crate::core::transcript::TranscriptLog;

/// Lifecycle of one call session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// AI connection being established
    Connecting,
    /// Session configuration sent, greeting pending
    Initializing,
    /// Audio flowing both directions
    Active,
    /// Teardown triggered by either side
    Closing,
    /// Terminal; resources released
    Closed,
}

impl SessionState {
    pub fn is_terminating(&self) -> bool {
        matches!(self, SessionState::Closing | SessionState::Closed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Connecting => "connecting",
            SessionState::Initializing => "initializing",
            SessionState::Active => "active",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Why a call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Telephony socket closed or failed
    TelephonyClosed(String),
    /// AI connection closed, failed, or could not be opened
    AiClosed(String),
    /// Every event source went away
    EventsExhausted,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::TelephonyClosed(reason) => write!(f, "telephony closed: {reason}"),
            CloseReason::AiClosed(reason) => write!(f, "ai closed: {reason}"),
            CloseReason::EventsExhausted => write!(f, "event sources exhausted"),
        }
    }
}

/// Mutable record of one call.
///
/// `response_start_timestamp_ms` is set only while an AI turn is in flight
/// with at least one unacknowledged mark; it is cleared on interruption, on
/// a new stream, or once the response is done and every mark is back.
#[derive(Debug, Clone)]
pub struct CallState {
    /// Provider stream id; absent until `start`
    pub stream_sid: Option<String>,
    /// Provider call id, for logs
    pub call_sid: Option<String>,
    /// Last caller-audio timestamp on the current stream
    pub latest_media_timestamp_ms: u64,
    /// Caller-clock time at which the current AI turn started playing
    pub response_start_timestamp_ms: Option<u64>,
    /// In-flight assistant item, target for truncation
    pub last_assistant_item: Option<String>,
    /// Outstanding playback marks
    pub marks: PlaybackTracker,
    pub transcript: TranscriptLog,
    /// The AI finished generating the current response
    pub response_done: bool,
}

impl CallState {
    pub fn new(max_transcript_entries: usize, max_pending_marks: usize) -> Self {
        Self {
            stream_sid: None,
            call_sid: None,
            latest_media_timestamp_ms: 0,
            response_start_timestamp_ms: None,
            last_assistant_item: None,
            marks: PlaybackTracker::new(max_pending_marks),
            transcript: TranscriptLog::with_capacity_limit(max_transcript_entries),
            response_done: false,
        }
    }

    /// A new stream supersedes all timing and playback state of the old one.
    pub fn start_stream(&mut self, stream_sid: String, call_sid: Option<String>) {
        self.stream_sid = Some(stream_sid);
        self.call_sid = call_sid;
        self.latest_media_timestamp_ms = 0;
        self.reset_turn();
    }

    /// True when a barge-in would have something to cut.
    pub fn has_unplayed_response(&self) -> bool {
        self.response_start_timestamp_ms.is_some() && !self.marks.is_empty()
    }

    /// Forget the current AI turn.
    pub fn reset_turn(&mut self) {
        self.marks.clear();
        self.last_assistant_item = None;
        self.response_start_timestamp_ms = None;
        self.response_done = false;
    }
}
