pub mod channel;
pub mod events;
pub mod notify;
pub mod playback;
pub mod realtime;
pub mod session;
pub mod summary;
pub mod telephony;
pub mod transcript;

// Re-export commonly used types for convenience
pub use channel::{MessageRoute, OutboundChannel, OutboundReceiver};
pub use events::{SessionEvent, SessionEventReceiver, SessionEventSender, session_queue};
pub use notify::{LogNotifier, Notifier, NotifyError, NotifyResult, ResendNotifier};
pub use playback::{PlaybackMark, PlaybackTracker};
pub use realtime::{
    ClientEvent, OpenAIRealtime, RealtimeConfig, RealtimeConnector, RealtimeError, RealtimeEvent,
    RealtimeResult,
};
pub use session::{
    CallReport, CallSession, CallState, CloseReason, SessionSettings, SessionState, SummaryHandoff,
};
pub use summary::{CallSummary, KeywordSummarizer, Language, Summarizer, SummaryError};
pub use telephony::{TelephonyError, TelephonyEvent, TelephonyOutbound};
pub use transcript::{Speaker, TranscriptEntry, TranscriptLog};
