//! Twilio media stream WebSocket handler.
//!
//! Each accepted socket becomes one call: the socket halves get a reader and
//! a writer task, the AI session is opened in the background, and the call
//! session actor runs on the upgrade task until either side goes away.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::channel::OutboundChannel;
use crate::core::events::{SessionEvent, session_queue};
use crate::core::session::CallSession;
use crate::core::telephony::{spawn_reader, spawn_writer};
use crate::errors::AppError;
use crate::state::{AppState, CallGuard};

/// Maximum WebSocket frame size (1 MB); media frames are a few hundred bytes
const MAX_WS_FRAME_SIZE: usize = 1024 * 1024;

/// Maximum WebSocket message size (1 MB)
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// `GET /media-stream`
///
/// Refuses with 503 before the upgrade when the call limit is reached.
pub async fn media_stream_handler(
    State(state): State<Arc<AppState>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let guard = match state.try_acquire_call() {
        Ok(guard) => guard,
        Err(e) => {
            warn!(
                active_calls = state.active_calls(),
                "Rejecting media stream: {:?}", e
            );
            return AppError::AtCapacity.into_response();
        }
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_media_stream(socket, state, guard))
}

async fn handle_media_stream(socket: WebSocket, state: Arc<AppState>, guard: CallGuard) {
    let call_id = Uuid::new_v4().to_string();
    info!(call_id = %call_id, active_calls = state.active_calls(), "Media stream connected");

    let (sink, stream) = socket.split();
    let (events_tx, events_rx) = session_queue();
    let (telephony, telephony_rx) = OutboundChannel::new("telephony");

    let reader = spawn_reader(call_id.clone(), stream, events_tx.clone());
    let writer = spawn_writer(call_id.clone(), sink, telephony_rx);

    let connector = state.realtime.clone();
    let connect_call_id = call_id.clone();
    let connect_task = tokio::spawn(async move {
        if let Err(e) = connector.connect(&connect_call_id, events_tx.clone()).await {
            warn!(
                call_id = %connect_call_id,
                provider = connector.provider_name(),
                "Failed to open AI session: {}", e
            );
            let _ = events_tx
                .send(SessionEvent::AiClosed {
                    reason: e.to_string(),
                })
                .await;
        }
    });

    let session = CallSession::new(
        call_id.clone(),
        state.settings.clone(),
        telephony,
        state.handoff.clone(),
    );
    let report = session.run(events_rx).await;

    connect_task.abort();
    // The writer exits after flushing the close frame.
    let _ = writer.await;
    reader.abort();
    drop(guard);

    info!(
        call_id = %call_id,
        reason = ?report.close_reason,
        summarized = report.summary_task.is_some(),
        "Media stream closed"
    );
}
