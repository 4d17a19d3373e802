use anyhow::Context;
use digest_datastore::DataStore;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Serialize;

use crate::{
    outcome::RunResult,
    report::{render_html, render_text, subject, Notifier, DEFAULT_REPORT_TITLE},
};

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    subject: &'a str,
    status: String,
    html: &'a str,
    text: &'a str,
}

/// Saves the rendered digests, a JSON dump of the run and the per-video
/// summaries through a [`DataStore`], then optionally posts the digest to a webhook (for example
/// a mail relay).
#[derive(Debug, Clone)]
pub struct ReportNotifier<D> {
    store: D,
    title: String,
    webhook: Option<(ClientWithMiddleware, String)>,
}

impl<D> ReportNotifier<D> {
    pub fn new(store: D) -> Self {
        Self {
            store,
            title: DEFAULT_REPORT_TITLE.into(),
            webhook: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_webhook(mut self, url: impl Into<String>) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let client = ClientBuilder::new(reqwest::Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();
        self.webhook = Some((client, url.into()));
        self
    }
}

impl<D: DataStore + Sync> Notifier for ReportNotifier<D> {
    type Error = anyhow::Error;

    #[tracing::instrument(skip_all, fields(status = %result.status))]
    async fn deliver(&self, result: &RunResult) -> anyhow::Result<()> {
        for (task, summary) in result.summarized() {
            self.store
                .save_summary(task, summary)
                .await
                .with_context(|| format!("Failed to save summary for {}", task.video_id))?;
        }

        let subject = subject(result, &self.title);
        let html = render_html(result, &self.title);
        let text = render_text(result, &self.title);

        let stamp = result.started_at.format("%Y%m%d_%H%M%S").to_string();
        self.store
            .save_report(&format!("digest_{stamp}.html"), &html)
            .await
            .context("Failed to save HTML report")?;
        self.store
            .save_report(&format!("digest_{stamp}.txt"), &text)
            .await
            .context("Failed to save text report")?;

        let json = serde_json::to_string_pretty(result).context("Failed to serialize run result")?;
        self.store
            .save_report(&format!("digest_{stamp}.json"), &json)
            .await
            .context("Failed to save JSON report")?;

        let Some((client, url)) = &self.webhook else {
            return Ok(());
        };

        let payload = WebhookPayload {
            subject: &subject,
            status: result.status.to_string(),
            html: &html,
            text: &text,
        };
        let resp = client
            .post(url)
            .json(&payload)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to post report to webhook"))
            .context("Failed to post report to webhook")?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            anyhow::bail!("Webhook rejected report: {status} - {message}");
        }

        tracing::info!(%subject, "Report delivered to webhook");
        Ok(())
    }
}
