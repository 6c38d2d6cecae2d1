//! Playback acknowledgment tracking.
//!
//! Every outbound audio chunk is followed by a mark; the telephony side echoes
//! the mark once that audio has actually been played to the caller. The queue
//! depth therefore tells us whether any AI speech is still unacknowledged.

use std::collections::VecDeque;

/// Default upper bound on unacknowledged marks per call.
pub const DEFAULT_MAX_PENDING_MARKS: usize = 4096;

/// Prefix used for outbound mark names.
pub const MARK_NAME_PREFIX: &str = "responsePart";

/// Opaque playback acknowledgment token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackMark(String);

impl PlaybackMark {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// FIFO of marks awaiting acknowledgment.
///
/// When the queue is full the oldest mark is coalesced away; the tracker only
/// answers "is anything still outstanding", so losing the oldest token never
/// changes that answer.
#[derive(Debug, Clone)]
pub struct PlaybackTracker {
    queue: VecDeque<PlaybackMark>,
    max_pending: usize,
    sequence: u64,
}

impl Default for PlaybackTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PENDING_MARKS)
    }
}

impl PlaybackTracker {
    pub fn new(max_pending: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            max_pending: max_pending.max(1),
            sequence: 0,
        }
    }

    /// Mint the next mark name and enqueue it.
    pub fn next_mark(&mut self) -> PlaybackMark {
        self.sequence += 1;
        let mark = PlaybackMark::new(format!("{MARK_NAME_PREFIX}-{}", self.sequence));
        self.push(mark.clone());
        mark
    }

    pub fn push(&mut self, mark: PlaybackMark) {
        if self.queue.len() >= self.max_pending {
            self.queue.pop_front();
            tracing::debug!(max_pending = self.max_pending, "Mark queue full, coalescing oldest");
        }
        self.queue.push_back(mark);
    }

    pub fn pop(&mut self) -> Option<PlaybackMark> {
        self.queue.pop_front()
    }

    pub fn peek(&self) -> Option<&PlaybackMark> {
        self.queue.front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
