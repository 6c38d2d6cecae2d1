//! Post-call transcript summarization.
//!
//! Runs after a call ends, off the call path. Implementations see the full
//! ordered transcript and return a short summary plus the detected language,
//! which the notifier uses to pick its wording.

mod keyword;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use time::OffsetDateTime;

use crate::core::transcript::TranscriptEntry;

pub use keyword::{KeywordSummarizer, Topic, detect_language, extract_topics};

/// Errors raised by a summarizer.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Backing service could not be reached
    #[error("Summarizer unavailable: {0}")]
    Unavailable(String),

    /// Summarization ran but produced no usable result
    #[error("Summarization failed: {0}")]
    Failed(String),
}

/// Result type for summarization.
pub type SummaryResult<T> = Result<T, SummaryError>;

/// Dominant language of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Hindi,
    English,
    /// Hinglish or alternating languages
    Mixed,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Hindi => write!(f, "hindi"),
            Language::English => write!(f, "english"),
            Language::Mixed => write!(f, "mixed"),
        }
    }
}

/// Result of summarizing one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSummary {
    pub summary: String,
    pub language: Language,
    /// Number of transcript entries summarized
    pub turns: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}

/// Turns a finished call's transcript into a summary.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, transcript: &[TranscriptEntry]) -> SummaryResult<CallSummary>;
}
