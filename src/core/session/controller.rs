//! Call session actor.
//!
//! One [`CallSession`] owns everything about a call. It consumes the merged
//! event queue fed by the two socket readers, so every state change happens
//! on one task in arrival order and no locks are needed. Outbound traffic goes
//! through unbounded per-socket queues; the session never waits on either
//! socket.

use std::collections::HashSet;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::handoff::SummaryHandoff;
use super::state::{CallState, CloseReason, SessionState};
use crate::core::channel::OutboundChannel;
use crate::core::events::{SessionEvent, SessionEventReceiver};
use crate::core::playback::DEFAULT_MAX_PENDING_MARKS;
use crate::core::realtime::{ClientEvent, RealtimeEvent, SessionConfig};
use crate::core::telephony::{TelephonyEvent, TelephonyOutbound};
use crate::core::transcript::{DEFAULT_MAX_TRANSCRIPT_ENTRIES, Speaker, TranscriptEntry};

/// Default wait for `session.updated` before greeting anyway.
pub const DEFAULT_GREETING_FALLBACK_DELAY: Duration = Duration::from_millis(250);

/// Per-call behaviour, shared by every call.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Sent as `session.update` when the AI connection opens
    pub session: SessionConfig,
    /// Scripted opening line; empty disables the greeting
    pub greeting: String,
    /// Greet anyway if the session ack has not arrived by then
    pub greeting_fallback_delay: Duration,
    pub max_transcript_entries: usize,
    pub max_pending_marks: usize,
    /// Log truncation arithmetic at info instead of debug
    pub show_timing_math: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            greeting: crate::config::DEFAULT_GREETING.to_string(),
            greeting_fallback_delay: DEFAULT_GREETING_FALLBACK_DELAY,
            max_transcript_entries: DEFAULT_MAX_TRANSCRIPT_ENTRIES,
            max_pending_marks: DEFAULT_MAX_PENDING_MARKS,
            show_timing_math: false,
        }
    }
}

/// Outcome of a finished call.
#[derive(Debug)]
pub struct CallReport {
    pub call_id: String,
    pub transcript: Vec<TranscriptEntry>,
    pub close_reason: Option<CloseReason>,
    /// Summary task, if one was dispatched; nothing needs to await it
    pub summary_task: Option<JoinHandle<()>>,
    pub duration: Duration,
}

macro_rules! timing {
    ($enabled:expr, $($arg:tt)+) => {
        if $enabled {
            tracing::info!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}

/// The relay between one telephony stream and one AI session.
#[derive(Debug)]
pub struct CallSession {
    call_id: String,
    settings: SessionSettings,
    state: SessionState,
    call: CallState,
    telephony: OutboundChannel<TelephonyOutbound>,
    ai: Option<OutboundChannel<ClientEvent>>,
    greeting_sent: bool,
    greeting_deadline: Option<Instant>,
    recorded_items: HashSet<String>,
    handoff: Option<SummaryHandoff>,
    handoff_dispatched: bool,
    summary_task: Option<JoinHandle<()>>,
    close_reason: Option<CloseReason>,
    started_at: Instant,
}

impl CallSession {
    pub fn new(
        call_id: impl Into<String>,
        settings: SessionSettings,
        telephony: OutboundChannel<TelephonyOutbound>,
        handoff: Option<SummaryHandoff>,
    ) -> Self {
        let call = CallState::new(settings.max_transcript_entries, settings.max_pending_marks);
        Self {
            call_id: call_id.into(),
            settings,
            state: SessionState::Connecting,
            call,
            telephony,
            ai: None,
            greeting_sent: false,
            greeting_deadline: None,
            recorded_items: HashSet::new(),
            handoff,
            handoff_dispatched: false,
            summary_task: None,
            close_reason: None,
            started_at: Instant::now(),
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn call_state(&self) -> &CallState {
        &self.call
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        self.call.transcript.entries()
    }

    pub fn close_reason(&self) -> Option<&CloseReason> {
        self.close_reason.as_ref()
    }

    pub fn handoff_dispatched(&self) -> bool {
        self.handoff_dispatched
    }

    /// When the greeting fallback fires, if it is armed.
    pub fn greeting_deadline(&self) -> Option<Instant> {
        self.greeting_deadline
    }

    /// Take the summary task handle, if a summary was dispatched.
    pub fn take_summary_task(&mut self) -> Option<JoinHandle<()>> {
        self.summary_task.take()
    }

    /// Drive the session until it closes.
    pub async fn run(mut self, mut events: SessionEventReceiver) -> CallReport {
        info!(call_id = %self.call_id, "Call session started");

        while self.state != SessionState::Closed {
            let deadline = self.greeting_deadline;
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => self.close(CloseReason::EventsExhausted),
                },
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.greeting_timer_elapsed();
                }
            }
        }

        let report = CallReport {
            call_id: self.call_id.clone(),
            transcript: self.call.transcript.entries().to_vec(),
            close_reason: self.close_reason.clone(),
            summary_task: self.summary_task.take(),
            duration: self.started_at.elapsed(),
        };

        info!(
            call_id = %report.call_id,
            duration_ms = report.duration.as_millis() as u64,
            transcript_entries = report.transcript.len(),
            "Call session finished"
        );

        report
    }

    /// Apply one event.
    pub fn handle_event(&mut self, event: SessionEvent) {
        if self.state == SessionState::Closed {
            let kind = event.kind();
            match event {
                SessionEvent::AiConnected(channel) => channel.close(),
                _ => debug!(call_id = %self.call_id, kind, "Ignoring event after close"),
            }
            return;
        }

        match event {
            SessionEvent::AiConnected(channel) => self.on_ai_connected(channel),
            SessionEvent::Ai(event) => self.on_ai_event(event),
            SessionEvent::AiClosed { reason } => self.close(CloseReason::AiClosed(reason)),
            SessionEvent::Telephony(event) => self.on_telephony_event(event),
            SessionEvent::TelephonyClosed { reason } => {
                self.close(CloseReason::TelephonyClosed(reason))
            }
        }
    }

    /// The greeting fallback timer fired.
    pub fn greeting_timer_elapsed(&mut self) {
        self.greeting_deadline = None;
        if self.state == SessionState::Initializing && !self.greeting_sent {
            debug!(call_id = %self.call_id, "No session acknowledgment yet, greeting anyway");
            self.send_greeting();
        }
    }

    // -------------------------------------------------------------------------
    // AI side
    // -------------------------------------------------------------------------

    fn on_ai_connected(&mut self, channel: OutboundChannel<ClientEvent>) {
        info!(call_id = %self.call_id, "AI session connected, configuring");

        channel.send(ClientEvent::SessionUpdate {
            session: self.settings.session.clone(),
        });
        self.ai = Some(channel);
        self.state = SessionState::Initializing;
        self.greeting_deadline = Some(Instant::now() + self.settings.greeting_fallback_delay);
    }

    fn on_ai_event(&mut self, event: RealtimeEvent) {
        match event {
            RealtimeEvent::SessionCreated { session_id } => {
                debug!(call_id = %self.call_id, session_id = ?session_id, "AI session created");
            }
            RealtimeEvent::SessionUpdated => {
                if self.state == SessionState::Initializing && !self.greeting_sent {
                    self.send_greeting();
                }
            }
            RealtimeEvent::AudioDelta { delta, item_id } => self.on_audio_delta(delta, item_id),
            RealtimeEvent::TurnContentDone { item_id, segments } => {
                let text = segments.join(" ");
                if text.trim().is_empty() {
                    return;
                }
                // Providers may report the same item as content and as transcript
                if let Some(id) = item_id
                    && !self.recorded_items.insert(id.clone())
                {
                    debug!(call_id = %self.call_id, item_id = %id, "Turn already recorded");
                    return;
                }
                self.call
                    .transcript
                    .append(TranscriptEntry::now(Speaker::Assistant, text));
            }
            RealtimeEvent::CallerTranscript { text } => {
                self.call
                    .transcript
                    .append(TranscriptEntry::now(Speaker::Caller, text));
            }
            RealtimeEvent::SpeechStarted { .. } => {
                self.interrupt();
            }
            RealtimeEvent::SpeechStopped => {
                debug!(call_id = %self.call_id, "Caller stopped speaking");
            }
            RealtimeEvent::ResponseDone { response_id } => {
                debug!(call_id = %self.call_id, response_id = ?response_id, "Response done");
                self.call.response_done = true;
                self.settle_finished_turn();
            }
            RealtimeEvent::Error { message } => {
                warn!(call_id = %self.call_id, "AI service error: {}", message);
            }
        }
    }

    fn send_greeting(&mut self) {
        self.greeting_sent = true;
        self.greeting_deadline = None;
        self.state = SessionState::Active;

        if self.settings.greeting.is_empty() {
            return;
        }

        info!(call_id = %self.call_id, "Sending greeting");
        self.send_ai(ClientEvent::greeting(&self.settings.greeting));
        self.send_ai(ClientEvent::ResponseCreate);
        self.call.transcript.append(TranscriptEntry::now(
            Speaker::Assistant,
            self.settings.greeting.clone(),
        ));
    }

    fn on_audio_delta(&mut self, delta: String, item_id: Option<String>) {
        let Some(stream_sid) = self.call.stream_sid.clone() else {
            debug!(call_id = %self.call_id, "No stream yet, dropping AI audio");
            return;
        };

        self.telephony.send(TelephonyOutbound::media(&stream_sid, delta));

        if self.call.response_start_timestamp_ms.is_none() {
            self.call.response_start_timestamp_ms = Some(self.call.latest_media_timestamp_ms);
            timing!(
                self.settings.show_timing_math,
                call_id = %self.call_id,
                "Setting start timestamp for new response: {}ms",
                self.call.latest_media_timestamp_ms
            );
        }

        if item_id.is_some() {
            self.call.last_assistant_item = item_id;
        }
        self.call.response_done = false;

        let mark = self.call.marks.next_mark();
        self.telephony
            .send(TelephonyOutbound::mark(&stream_sid, mark.name()));
    }

    /// Barge-in: cut the AI turn at what the caller actually heard.
    fn interrupt(&mut self) -> bool {
        if !self.call.has_unplayed_response() {
            return false;
        }
        let Some(start) = self.call.response_start_timestamp_ms else {
            return false;
        };

        let latest = self.call.latest_media_timestamp_ms;
        let elapsed = latest.saturating_sub(start);
        timing!(
            self.settings.show_timing_math,
            call_id = %self.call_id,
            "Calculating elapsed time for truncation: {} - {} = {}ms",
            latest,
            start,
            elapsed
        );

        if let Some(item_id) = self.call.last_assistant_item.take() {
            info!(call_id = %self.call_id, item_id = %item_id, audio_end_ms = elapsed, "Caller interrupted, truncating");
            self.send_ai(ClientEvent::truncate(item_id, elapsed));
        }

        if let Some(stream_sid) = &self.call.stream_sid {
            self.telephony.send(TelephonyOutbound::clear(stream_sid));
        }

        self.call.reset_turn();
        true
    }

    /// Clear the turn anchor once the response is done and fully played.
    fn settle_finished_turn(&mut self) {
        if self.call.response_done && self.call.marks.is_empty() {
            self.call.response_start_timestamp_ms = None;
            self.call.last_assistant_item = None;
        }
    }

    fn send_ai(&self, event: ClientEvent) {
        match &self.ai {
            Some(ai) => {
                ai.send(event);
            }
            None => {
                debug!(call_id = %self.call_id, event = event.event_type(), "AI not connected, dropping");
            }
        }
    }

    // -------------------------------------------------------------------------
    // Telephony side
    // -------------------------------------------------------------------------

    fn on_telephony_event(&mut self, event: TelephonyEvent) {
        match event {
            TelephonyEvent::Connected => {
                debug!(call_id = %self.call_id, "Telephony socket connected");
            }
            TelephonyEvent::Start {
                stream_sid,
                call_sid,
            } => {
                info!(call_id = %self.call_id, stream_sid = %stream_sid, call_sid = ?call_sid, "Incoming stream has started");
                self.call.start_stream(stream_sid, call_sid);
            }
            TelephonyEvent::Media {
                timestamp_ms,
                payload,
            } => {
                self.call.latest_media_timestamp_ms = timestamp_ms;
                if let Some(ai) = self.ai.as_ref().filter(|ai| ai.is_open()) {
                    ai.send(ClientEvent::audio_append(payload));
                }
            }
            TelephonyEvent::Mark { .. } => {
                if self.call.marks.pop().is_some() {
                    self.settle_finished_turn();
                }
            }
            TelephonyEvent::Stop => {
                info!(call_id = %self.call_id, stream_sid = ?self.call.stream_sid, "Stream stopped");
            }
            TelephonyEvent::Unknown { event } => {
                debug!(call_id = %self.call_id, event = %event, "Received non-media event");
            }
        }
    }

    // -------------------------------------------------------------------------
    // Teardown
    // -------------------------------------------------------------------------

    /// Tear the call down. Safe to call more than once.
    fn close(&mut self, reason: CloseReason) {
        if self.state.is_terminating() {
            return;
        }

        info!(call_id = %self.call_id, reason = %reason, "Closing call session");
        self.state = SessionState::Closing;
        self.greeting_deadline = None;
        self.close_reason = Some(reason);

        if let Some(ai) = &self.ai {
            ai.close();
        }
        self.telephony.close();

        if self.call.transcript.has_conversation() {
            if let Some(handoff) = &self.handoff
                && !self.handoff_dispatched
            {
                self.handoff_dispatched = true;
                let task = handoff.dispatch(
                    self.call_id.clone(),
                    self.call.transcript.entries().to_vec(),
                );
                self.summary_task = Some(task);
            }
        } else {
            info!(call_id = %self.call_id, "No meaningful conversation to summarize");
        }

        self.state = SessionState::Closed;
    }
}
