//! Media stream WebSocket route configuration

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::incoming_call::MEDIA_STREAM_PATH;
use crate::handlers::media_stream::media_stream_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the media stream WebSocket router
///
/// # Endpoint
///
/// `GET /media-stream` - WebSocket upgrade for one phone call
///
/// # Protocol
///
/// Twilio sends JSON text frames tagged by `event`: `connected`, `start`
/// (carrying the `streamSid`), `media` (base64 mu-law audio with a
/// timestamp), `mark` and `stop`. The server answers with `media`, `mark`
/// and `clear` frames for the same stream.
pub fn create_media_stream_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(MEDIA_STREAM_PATH, get(media_stream_handler))
        .layer(TraceLayer::new_for_http())
}
