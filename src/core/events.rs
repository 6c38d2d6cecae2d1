//! Merged event queue feeding one call session.
//!
//! Both socket readers decode their frames and push them onto a single
//! ordered queue. The call session is the only consumer, so every state
//! mutation for a call happens on one task in arrival order.

use tokio::sync::mpsc;

use crate::core::channel::OutboundChannel;
use crate::core::realtime::{ClientEvent, RealtimeEvent};
use crate::core::telephony::TelephonyEvent;

/// Queue depth between the socket readers and the call session.
pub const SESSION_EVENT_CAPACITY: usize = 1024;

/// Everything a call session reacts to.
#[derive(Debug)]
pub enum SessionEvent {
    /// The AI connection is open; frames for it go through this channel
    AiConnected(OutboundChannel<ClientEvent>),
    /// Classified event from the AI service
    Ai(RealtimeEvent),
    /// AI connection failed or closed
    AiClosed { reason: String },
    /// Decoded telephony frame
    Telephony(TelephonyEvent),
    /// Telephony socket closed (caller hung up or socket error)
    TelephonyClosed { reason: String },
}

impl SessionEvent {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AiConnected(_) => "ai_connected",
            Self::Ai(_) => "ai",
            Self::AiClosed { .. } => "ai_closed",
            Self::Telephony(_) => "telephony",
            Self::TelephonyClosed { .. } => "telephony_closed",
        }
    }
}

pub type SessionEventSender = mpsc::Sender<SessionEvent>;
pub type SessionEventReceiver = mpsc::Receiver<SessionEvent>;

/// Create the queue for one call.
pub fn session_queue() -> (SessionEventSender, SessionEventReceiver) {
    mpsc::channel(SESSION_EVENT_CAPACITY)
}
