//! Telephony media-stream socket tasks.
//!
//! The inbound socket is split in two: a reader that decodes frames and feeds
//! the call's event queue, and a writer that drains the outbound channel.
//! Neither half touches call state.

use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::messages::{TelephonyError, TelephonyOutbound, parse_frame};
use crate::core::channel::{MessageRoute, OutboundReceiver};
use crate::core::events::{SessionEvent, SessionEventSender};

/// Spawn the reader half.
///
/// Malformed frames are logged and skipped. The task always finishes by
/// reporting `TelephonyClosed`, whether the caller hung up or the socket failed.
pub fn spawn_reader<S, E>(call_id: String, mut stream: S, events: SessionEventSender) -> JoinHandle<()>
where
    S: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    tokio::spawn(async move {
        let reason = loop {
            let Some(msg) = stream.next().await else {
                break "telephony stream ended".to_string();
            };

            let text = match msg {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(frame)) => {
                    info!(call_id = %call_id, ?frame, "Telephony socket closed by peer");
                    break "caller hung up".to_string();
                }
                Ok(Message::Binary(data)) => {
                    warn!(
                        call_id = %call_id,
                        "Dropping frame: {}",
                        TelephonyError::UnexpectedBinary(data.len())
                    );
                    continue;
                }
                Ok(_) => continue,
                Err(e) => {
                    warn!(call_id = %call_id, "Telephony socket error: {}", e);
                    break format!("telephony socket error: {e}");
                }
            };

            match parse_frame(text.as_str()) {
                Ok(event) => {
                    if events.send(SessionEvent::Telephony(event)).await.is_err() {
                        debug!(call_id = %call_id, "Call session gone, stopping telephony reader");
                        return;
                    }
                }
                Err(e) => {
                    warn!(call_id = %call_id, "Dropping telephony frame: {}", e);
                }
            }
        };

        let _ = events.send(SessionEvent::TelephonyClosed { reason }).await;
    })
}

/// Spawn the writer half.
pub fn spawn_writer<S>(
    call_id: String,
    mut sink: S,
    mut outbound: OutboundReceiver<TelephonyOutbound>,
) -> JoinHandle<()>
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: std::fmt::Display,
{
    tokio::spawn(async move {
        while let Some(route) = outbound.recv().await {
            let result = match route {
                MessageRoute::Frame(frame) => match frame.encode() {
                    Ok(json) => sink.send(Message::Text(json.into())).await,
                    Err(e) => {
                        error!(call_id = %call_id, "Failed to encode {} frame: {}", frame.event_name(), e);
                        continue;
                    }
                },
                MessageRoute::Close => {
                    debug!(call_id = %call_id, "Closing telephony socket");
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            };

            if let Err(e) = result {
                warn!(call_id = %call_id, "Failed to write telephony frame: {}", e);
                break;
            }
        }
    })
}
