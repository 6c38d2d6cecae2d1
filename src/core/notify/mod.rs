//! Post-call notification delivery.
//!
//! A notifier receives the call summary once the summarizer is done. Delivery
//! is best-effort: errors come back as [`NotifyError`] and are only logged.

mod resend;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::core::summary::{CallSummary, Language};

pub use resend::{RESEND_API_URL, ResendNotifier};

/// Errors raised while delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Request could not be sent
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    /// Provider answered with a non-success status
    #[error("Provider rejected notification ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Result type for notification delivery.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Delivers a call summary somewhere a human will see it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, summary: &CallSummary) -> NotifyResult<()>;
}

/// Subject line for a summary in the given language.
pub fn summary_subject(business_name: &str, language: Language) -> String {
    match language {
        Language::English => format!("{business_name} - Call Summary"),
        Language::Hindi | Language::Mixed => format!("{business_name} - कॉल सारांश"),
    }
}

/// Notifier used when no email provider is configured: the summary goes to the log.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    business_name: String,
}

impl LogNotifier {
    pub fn new(business_name: impl Into<String>) -> Self {
        Self {
            business_name: business_name.into(),
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, summary: &CallSummary) -> NotifyResult<()> {
        info!(
            subject = %summary_subject(&self.business_name, summary.language),
            language = %summary.language,
            turns = summary.turns,
            "Call summary (email not configured): {}",
            summary.summary
        );
        Ok(())
    }
}
