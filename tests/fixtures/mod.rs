//! Shared test fixtures: telephony frames, recording collaborators and a
//! call-session harness with in-memory channels.

// Each test binary uses a different subset of these helpers
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use callbridge::core::notify::{Notifier, NotifyResult};
use callbridge::core::summary::{CallSummary, Language, Summarizer, SummaryResult};
use callbridge::core::telephony::parse_frame;
use callbridge::{
    CallSession, ClientEvent, MessageRoute, OutboundChannel, OutboundReceiver, SessionEvent,
    SessionSettings, SummaryHandoff, TelephonyEvent, TelephonyOutbound, TranscriptEntry,
};

pub const STREAM_SID: &str = "CA123";

// -----------------------------------------------------------------------------
// Telephony frames
// -----------------------------------------------------------------------------

pub fn start_frame(stream_sid: &str) -> String {
    json!({
        "event": "start",
        "sequenceNumber": "1",
        "start": {
            "streamSid": stream_sid,
            "callSid": "CAfeed",
            "accountSid": "ACbeef",
            "tracks": ["inbound"],
            "mediaFormat": {"encoding": "audio/x-mulaw", "sampleRate": 8000, "channels": 1}
        },
        "streamSid": stream_sid
    })
    .to_string()
}

pub fn media_frame(timestamp_ms: u64, payload: &str) -> String {
    json!({
        "event": "media",
        "streamSid": STREAM_SID,
        "media": {"track": "inbound", "chunk": "1", "timestamp": timestamp_ms.to_string(), "payload": payload}
    })
    .to_string()
}

pub fn mark_frame(name: &str) -> String {
    json!({"event": "mark", "streamSid": STREAM_SID, "mark": {"name": name}}).to_string()
}

pub fn stop_frame() -> String {
    json!({"event": "stop", "streamSid": STREAM_SID}).to_string()
}

pub fn telephony(frame: &str) -> SessionEvent {
    SessionEvent::Telephony(parse_frame(frame).expect("fixture frame parses"))
}

pub fn media(timestamp_ms: u64, payload: &str) -> SessionEvent {
    SessionEvent::Telephony(TelephonyEvent::Media {
        timestamp_ms,
        payload: payload.to_string(),
    })
}

// -----------------------------------------------------------------------------
// Recording collaborators
// -----------------------------------------------------------------------------

/// Summarizer that records every transcript it is given.
#[derive(Default)]
pub struct RecordingSummarizer {
    pub calls: Mutex<Vec<Vec<TranscriptEntry>>>,
}

impl RecordingSummarizer {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Summarizer for RecordingSummarizer {
    async fn summarize(&self, transcript: &[TranscriptEntry]) -> SummaryResult<CallSummary> {
        self.calls.lock().unwrap().push(transcript.to_vec());
        Ok(CallSummary {
            summary: format!("{} entries", transcript.len()),
            language: Language::English,
            turns: transcript.len(),
            generated_at: time::OffsetDateTime::now_utc(),
        })
    }
}

/// Notifier that records every summary it is given.
#[derive(Default)]
pub struct RecordingNotifier {
    pub summaries: Mutex<Vec<CallSummary>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, summary: &CallSummary) -> NotifyResult<()> {
        self.summaries.lock().unwrap().push(summary.clone());
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Session harness
// -----------------------------------------------------------------------------

pub fn test_settings() -> SessionSettings {
    SessionSettings {
        greeting: "Hello! Welcome to Rolling Feast.".to_string(),
        greeting_fallback_delay: Duration::from_millis(20),
        ..SessionSettings::default()
    }
}

/// A call session wired to in-memory outbound queues.
pub struct SessionHarness {
    pub session: CallSession,
    pub telephony_rx: OutboundReceiver<TelephonyOutbound>,
    pub ai_rx: Option<OutboundReceiver<ClientEvent>>,
    pub summarizer: Arc<RecordingSummarizer>,
    pub notifier: Arc<RecordingNotifier>,
}

impl SessionHarness {
    pub fn new() -> Self {
        Self::with_settings(test_settings())
    }

    pub fn with_settings(settings: SessionSettings) -> Self {
        let (telephony, telephony_rx) = OutboundChannel::new("telephony");
        let summarizer = Arc::new(RecordingSummarizer::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let handoff = SummaryHandoff::new(summarizer.clone(), notifier.clone());

        Self {
            session: CallSession::new("call-test", settings, telephony, Some(handoff)),
            telephony_rx,
            ai_rx: None,
            summarizer,
            notifier,
        }
    }

    /// Deliver an AI connection; outbound AI frames land in `ai_rx`.
    pub fn connect_ai(&mut self) {
        let (channel, rx) = OutboundChannel::new("openai");
        self.ai_rx = Some(rx);
        self.session.handle_event(SessionEvent::AiConnected(channel));
    }

    /// Stream started, AI connected and acknowledged, greeting sent; all
    /// setup traffic drained.
    pub fn active(stream_sid: &str) -> Self {
        let mut harness = Self::new();
        harness.session.handle_event(telephony(&start_frame(stream_sid)));
        harness.connect_ai();
        harness
            .session
            .handle_event(SessionEvent::Ai(callbridge::RealtimeEvent::SessionUpdated));
        harness.drain_ai();
        harness.drain_telephony();
        harness
    }

    pub fn send(&mut self, event: SessionEvent) {
        self.session.handle_event(event);
    }

    pub fn drain_ai(&mut self) -> Vec<MessageRoute<ClientEvent>> {
        self.ai_rx.as_mut().map(drain).unwrap_or_default()
    }

    pub fn drain_telephony(&mut self) -> Vec<MessageRoute<TelephonyOutbound>> {
        drain(&mut self.telephony_rx)
    }
}

/// Everything currently queued on a receiver.
pub fn drain<T>(rx: &mut OutboundReceiver<T>) -> Vec<MessageRoute<T>> {
    let mut out = Vec::new();
    while let Ok(item) = rx.try_recv() {
        out.push(item);
    }
    out
}

/// Only the frames, without close markers.
pub fn frames<T>(routes: Vec<MessageRoute<T>>) -> Vec<T> {
    routes
        .into_iter()
        .filter_map(|r| match r {
            MessageRoute::Frame(frame) => Some(frame),
            MessageRoute::Close => None,
        })
        .collect()
}
