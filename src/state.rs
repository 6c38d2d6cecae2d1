//! Shared application state.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::info;

use crate::config::ServerConfig;
use crate::core::notify::{LogNotifier, Notifier, ResendNotifier};
use crate::core::realtime::{OpenAIRealtime, RealtimeConnector, RealtimeResult};
use crate::core::session::{SessionSettings, SummaryHandoff};
use crate::core::summary::KeywordSummarizer;

/// Error returned when a new call cannot be admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionLimitError {
    GlobalLimitReached,
}

/// State shared by every request handler.
pub struct AppState {
    pub config: ServerConfig,
    /// Opens one AI session per call
    pub realtime: Arc<dyn RealtimeConnector>,
    /// Per-call behaviour handed to every call session
    pub settings: SessionSettings,
    /// Post-call summary and delivery
    pub handoff: Option<SummaryHandoff>,
    active_calls: Arc<AtomicUsize>,
}

impl AppState {
    /// Build the production state: OpenAI Realtime, keyword summaries and
    /// email delivery when it is configured.
    pub fn new(config: ServerConfig) -> RealtimeResult<Arc<Self>> {
        let client = OpenAIRealtime::new(config.realtime_config())?;
        let settings = config.session_settings(client.build_session_config());

        let notifier: Arc<dyn Notifier> = match (&config.resend_api_key, &config.orders_email_to) {
            (Some(key), Some(to)) if config.has_email_delivery() => {
                info!(recipient = %to, "Call summaries will be emailed");
                Arc::new(ResendNotifier::new(
                    key.clone(),
                    config.email_from.clone(),
                    to.clone(),
                    config.business_name.clone(),
                ))
            }
            _ => {
                info!("Email delivery not configured, call summaries will be logged");
                Arc::new(LogNotifier::new(config.business_name.clone()))
            }
        };
        let handoff = SummaryHandoff::new(
            Arc::new(KeywordSummarizer::new(config.business_name.clone())),
            notifier,
        );

        Ok(Self::with_parts(
            config,
            Arc::new(client),
            settings,
            Some(handoff),
        ))
    }

    /// Assemble state from explicit collaborators.
    pub fn with_parts(
        config: ServerConfig,
        realtime: Arc<dyn RealtimeConnector>,
        settings: SessionSettings,
        handoff: Option<SummaryHandoff>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            realtime,
            settings,
            handoff,
            active_calls: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Number of calls currently bridged.
    pub fn active_calls(&self) -> usize {
        self.active_calls.load(Ordering::Acquire)
    }

    /// Reserve a call slot; the slot is released when the guard drops.
    pub fn try_acquire_call(&self) -> Result<CallGuard, ConnectionLimitError> {
        let limit = self.config.max_concurrent_calls;
        self.active_calls
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| match limit {
                Some(max) if current >= max => None,
                _ => Some(current + 1),
            })
            .map(|_| CallGuard {
                counter: self.active_calls.clone(),
            })
            .map_err(|_| ConnectionLimitError::GlobalLimitReached)
    }
}

/// Holds one call slot.
#[derive(Debug)]
pub struct CallGuard {
    counter: Arc<AtomicUsize>,
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}
