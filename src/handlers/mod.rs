//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check and status endpoints
//! - `incoming_call` - Twilio voice webhook answering with TwiML
//! - `media_stream` - Twilio media stream WebSocket, one call session per socket

pub mod api;
pub mod incoming_call;
pub mod media_stream;

pub use incoming_call::incoming_call;
pub use media_stream::media_stream_handler;
