//! Outbound half of a bidirectional message channel.
//!
//! Each socket owns a writer task that drains an [`OutboundReceiver`]. The
//! call session only ever holds the sending side, so it never touches a socket
//! directly and never blocks on one. The queue is unbounded, like a socket's
//! own send buffer: a frame accepted while the channel is open is always
//! handed to the writer. Closing is signalled on a [`CancellationToken`], not
//! through the queue, so a close can never be lost behind a backlog.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio_util::sync::CancellationToken;

/// Item routed to a socket writer task.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageRoute<T> {
    /// Serialize and write a frame
    Frame(T),
    /// Send a close frame and stop the writer
    Close,
}

/// Cloneable, non-blocking sender for one socket.
#[derive(Debug)]
pub struct OutboundChannel<T> {
    tx: mpsc::UnboundedSender<T>,
    shutdown: CancellationToken,
    label: &'static str,
}

impl<T> Clone for OutboundChannel<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            shutdown: self.shutdown.clone(),
            label: self.label,
        }
    }
}

impl<T> OutboundChannel<T> {
    /// Create a channel and the receiver its writer task drains.
    pub fn new(label: &'static str) -> (Self, OutboundReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        (
            Self {
                tx,
                shutdown: shutdown.clone(),
                label,
            },
            OutboundReceiver {
                rx,
                shutdown,
                close_delivered: false,
            },
        )
    }

    /// Whether the channel still accepts frames.
    pub fn is_open(&self) -> bool {
        !self.shutdown.is_cancelled() && !self.tx.is_closed()
    }

    /// Queue a frame without waiting. Returns `false` if it was not queued.
    pub fn send(&self, frame: T) -> bool {
        if !self.is_open() {
            tracing::debug!(channel = self.label, "Dropping frame for closed channel");
            return false;
        }
        if self.tx.send(frame).is_err() {
            self.shutdown.cancel();
            return false;
        }
        true
    }

    /// Ask the writer to close its socket. Safe to call more than once.
    pub fn close(&self) {
        if !self.shutdown.is_cancelled() {
            tracing::debug!(channel = self.label, "Closing outbound channel");
            self.shutdown.cancel();
        }
    }

    /// Mark the channel closed from the writer side (socket failure).
    pub fn mark_closed(&self) {
        self.shutdown.cancel();
    }
}

/// Receiving side drained by a socket writer.
///
/// Frames queued before a close are yielded first, then a single
/// [`MessageRoute::Close`].
#[derive(Debug)]
pub struct OutboundReceiver<T> {
    rx: mpsc::UnboundedReceiver<T>,
    shutdown: CancellationToken,
    close_delivered: bool,
}

impl<T> OutboundReceiver<T> {
    /// Wait for the next route. `None` once the close has been delivered or
    /// every sender is gone.
    pub async fn recv(&mut self) -> Option<MessageRoute<T>> {
        if self.close_delivered {
            return None;
        }
        tokio::select! {
            biased;
            frame = self.rx.recv() => frame.map(MessageRoute::Frame),
            _ = self.shutdown.cancelled() => {
                self.close_delivered = true;
                Some(MessageRoute::Close)
            }
        }
    }

    /// Take the next route if one is ready.
    pub fn try_recv(&mut self) -> Result<MessageRoute<T>, TryRecvError> {
        if self.close_delivered {
            return Err(TryRecvError::Disconnected);
        }
        match self.rx.try_recv() {
            Ok(frame) => Ok(MessageRoute::Frame(frame)),
            Err(_) if self.shutdown.is_cancelled() => {
                self.close_delivered = true;
                Ok(MessageRoute::Close)
            }
            Err(e) => Err(e),
        }
    }
}
