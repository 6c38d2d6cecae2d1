//! Fire-and-forget post-call summary and notification.

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::core::notify::Notifier;
use crate::core::summary::Summarizer;
use crate::core::transcript::TranscriptEntry;

/// Collaborators run once a call with real conversation ends.
#[derive(Clone)]
pub struct SummaryHandoff {
    summarizer: Arc<dyn Summarizer>,
    notifier: Arc<dyn Notifier>,
}

impl fmt::Debug for SummaryHandoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryHandoff").finish_non_exhaustive()
    }
}

impl SummaryHandoff {
    pub fn new(summarizer: Arc<dyn Summarizer>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            summarizer,
            notifier,
        }
    }

    /// Summarize and notify on a separate task.
    ///
    /// Failures are logged here and never reach the caller.
    pub fn dispatch(&self, call_id: String, transcript: Vec<TranscriptEntry>) -> JoinHandle<()> {
        let summarizer = self.summarizer.clone();
        let notifier = self.notifier.clone();

        tokio::spawn(async move {
            let summary = match summarizer.summarize(&transcript).await {
                Ok(summary) => summary,
                Err(e) => {
                    warn!(call_id = %call_id, "Failed to summarize call: {}", e);
                    return;
                }
            };

            info!(
                call_id = %call_id,
                language = %summary.language,
                turns = summary.turns,
                "Call summarized"
            );

            // The log line is the only copy of the summary when delivery fails
            match notifier.notify(&summary).await {
                Ok(()) => info!(
                    call_id = %call_id,
                    summary = %summary.summary,
                    "Call summary delivered"
                ),
                Err(e) => warn!(
                    call_id = %call_id,
                    summary = %summary.summary,
                    "Failed to deliver call summary: {}", e
                ),
            }
        })
    }
}
