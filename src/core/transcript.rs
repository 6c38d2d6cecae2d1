//! Append-only transcript of a single call.
//!
//! Entries are kept in arrival order and never reordered or removed while the
//! call is live. The log is bounded: once `max_entries` is reached further
//! entries are dropped (and logged) rather than evicting earlier turns.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Default upper bound on transcript entries per call.
pub const DEFAULT_MAX_TRANSCRIPT_ENTRIES: usize = 1000;

/// Who produced an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The person on the phone
    Caller,
    /// The speech AI
    Assistant,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::Caller => write!(f, "caller"),
            Speaker::Assistant => write!(f, "assistant"),
        }
    }
}

/// One attributed utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Speaker,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl TranscriptEntry {
    /// Create an entry stamped with the current UTC time.
    pub fn now(role: Speaker, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// Ordered, bounded, append-only transcript.
#[derive(Debug, Clone)]
pub struct TranscriptLog {
    entries: Vec<TranscriptEntry>,
    max_entries: usize,
    dropped: usize,
}

impl Default for TranscriptLog {
    fn default() -> Self {
        Self::with_capacity_limit(DEFAULT_MAX_TRANSCRIPT_ENTRIES)
    }
}

impl TranscriptLog {
    pub fn with_capacity_limit(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries: max_entries.max(1),
            dropped: 0,
        }
    }

    /// Append an entry. Returns `false` when the log is full and the entry was dropped.
    pub fn append(&mut self, entry: TranscriptEntry) -> bool {
        if self.entries.len() >= self.max_entries {
            self.dropped += 1;
            tracing::warn!(
                max_entries = self.max_entries,
                dropped = self.dropped,
                "Transcript full, dropping {} entry",
                entry.role
            );
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries rejected because the log was full.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// True when the call produced anything beyond the scripted greeting.
    pub fn has_conversation(&self) -> bool {
        self.entries.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut log = TranscriptLog::default();
        log.append(TranscriptEntry::now(Speaker::Assistant, "hello"));
        log.append(TranscriptEntry::now(Speaker::Caller, "hi, a table for two"));
        log.append(TranscriptEntry::now(Speaker::Assistant, "sure"));

        let texts: Vec<_> = log.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", "hi, a table for two", "sure"]);
        assert_eq!(log.entries()[1].role, Speaker::Caller);
    }

    #[test]
    fn test_greeting_only_is_not_a_conversation() {
        let mut log = TranscriptLog::default();
        assert!(!log.has_conversation());
        log.append(TranscriptEntry::now(Speaker::Assistant, "welcome"));
        assert!(!log.has_conversation());
        log.append(TranscriptEntry::now(Speaker::Caller, "hello"));
        assert!(log.has_conversation());
    }

    #[test]
    fn test_bounded_log_drops_new_entries() {
        let mut log = TranscriptLog::with_capacity_limit(2);
        assert!(log.append(TranscriptEntry::now(Speaker::Assistant, "one")));
        assert!(log.append(TranscriptEntry::now(Speaker::Caller, "two")));
        assert!(!log.append(TranscriptEntry::now(Speaker::Assistant, "three")));

        assert_eq!(log.len(), 2);
        assert_eq!(log.dropped(), 1);
        assert_eq!(log.entries()[1].text, "two");
    }

    #[test]
    fn test_entry_serializes_rfc3339_timestamp() {
        let entry = TranscriptEntry::now(Speaker::Caller, "namaste");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["role"], "caller");
        assert_eq!(json["text"], "namaste");
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }
}
