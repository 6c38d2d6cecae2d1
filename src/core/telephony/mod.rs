//! Telephony media-stream endpoint.
//!
//! Decodes the provider's inbound `start`/`media`/`mark`/`stop` envelope into
//! [`TelephonyEvent`]s and encodes outbound `media`/`mark`/`clear` frames.

pub mod messages;
pub mod stream;

pub use messages::{
    MarkPayload, OutboundMedia, TelephonyError, TelephonyEvent, TelephonyOutbound,
    TelephonyResult, parse_frame,
};
pub use stream::{spawn_reader, spawn_writer};
