//! Email delivery through the Resend HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use time::format_description::well_known::Rfc2822;
use tracing::{debug, info};
use zeroize::Zeroize;

use super::{Notifier, NotifyError, NotifyResult, summary_subject};
use crate::core::summary::CallSummary;

/// Resend emails endpoint.
pub const RESEND_API_URL: &str = "https://api.resend.com/emails";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

/// Sends call summaries as HTML email.
pub struct ResendNotifier {
    api_key: String,
    api_url: String,
    from: String,
    to: String,
    business_name: String,
    client: reqwest::Client,
}

impl ResendNotifier {
    pub fn new(
        api_key: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        business_name: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: RESEND_API_URL.to_string(),
            from: from.into(),
            to: to.into(),
            business_name: business_name.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Point at a different endpoint (tests, proxies).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Recipient address.
    pub fn recipient(&self) -> &str {
        &self.to
    }

    /// Render the HTML body for a summary.
    pub fn render_html(&self, summary: &CallSummary) -> String {
        let subject = summary_subject(&self.business_name, summary.language);
        let generated_at = summary
            .generated_at
            .format(&Rfc2822)
            .unwrap_or_else(|_| summary.generated_at.to_string());

        format!(
            "<h2>{}</h2>\n<p><strong>Call Summary:</strong></p>\n<p>{}</p>\n<p><em>Generated at: {}</em></p>\n",
            escape_html(&subject),
            escape_html(&summary.summary),
            generated_at
        )
    }
}

impl Drop for ResendNotifier {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[async_trait]
impl Notifier for ResendNotifier {
    async fn notify(&self, summary: &CallSummary) -> NotifyResult<()> {
        let subject = summary_subject(&self.business_name, summary.language);
        let html = self.render_html(summary);
        let body = SendEmailRequest {
            from: &self.from,
            to: vec![self.to.as_str()],
            subject: &subject,
            html: &html,
        };

        debug!(url = %self.api_url, language = %summary.language, "Sending call summary email");

        let response = self
            .client
            .post(&self.api_url)
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::DeliveryFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(status = %status, subject = %subject, "Call summary email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::summary::Language;
    use time::OffsetDateTime;

    fn summary() -> CallSummary {
        CallSummary {
            summary: "Customer asked about <b>tables</b> & prices".to_string(),
            language: Language::English,
            turns: 4,
            generated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_render_html_escapes_summary() {
        let notifier = ResendNotifier::new("re_key", "a@b.c", "orders@b.c", "Rolling Feast");
        let html = notifier.render_html(&summary());
        assert!(html.starts_with("<h2>Rolling Feast - Call Summary</h2>"));
        assert!(html.contains("&lt;b&gt;tables&lt;/b&gt; &amp; prices"));
        assert!(html.contains("Generated at: Thu, 01 Jan 1970 00:00:00 +0000"));
    }

    #[test]
    fn test_recipient() {
        let notifier = ResendNotifier::new("re_key", "a@b.c", "orders@b.c", "Rolling Feast");
        assert_eq!(notifier.recipient(), "orders@b.c");
    }
}
