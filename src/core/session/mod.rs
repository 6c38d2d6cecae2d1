//! Call session: the relay between one phone call and one AI session.

mod controller;
mod handoff;
mod state;

pub use controller::{CallReport, CallSession, DEFAULT_GREETING_FALLBACK_DELAY, SessionSettings};
pub use handoff::SummaryHandoff;
pub use state::{CallState, CloseReason, SessionState};
