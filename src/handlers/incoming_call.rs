//! Twilio voice webhook.
//!
//! Answers an incoming call with TwiML that connects the call audio to this
//! server's media stream endpoint.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{error, info};

use crate::state::AppState;

/// Path Twilio streams call audio to.
pub const MEDIA_STREAM_PATH: &str = "/media-stream";

const TWIML_CONTENT_TYPE: &str = "text/xml";

/// Spoken when the stream URL cannot be built.
const APOLOGY_TWIML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
    <Say language="hi-IN">क्षमा कीजिए, अभी तकनीकी समस्या आ रही है।</Say>
</Response>"#;

/// `ANY /incoming-call`
pub async fn incoming_call(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let host = state.config.public_host.clone().or_else(|| {
        headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    });

    let body = match host.as_deref().filter(|h| is_valid_host(h)) {
        Some(host) => {
            info!(host = %host, "Incoming call, connecting media stream");
            stream_twiml(host)
        }
        None => {
            error!(host = ?host, "Cannot build media stream URL for incoming call");
            APOLOGY_TWIML.to_string()
        }
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, TWIML_CONTENT_TYPE)],
        body,
    )
        .into_response()
}

/// TwiML connecting the call to `wss://{host}/media-stream`.
pub fn stream_twiml(host: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
    <Connect>
        <Stream url="wss://{host}{MEDIA_STREAM_PATH}" />
    </Connect>
</Response>"#
    )
}

/// The apology TwiML.
pub fn apology_twiml() -> &'static str {
    APOLOGY_TWIML
}

/// A host[:port] safe to embed in a URL attribute.
fn is_valid_host(host: &str) -> bool {
    !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '[' | ']'))
}
