//! Owner notification for new leads.
//!
//! Accepted submissions are forwarded to the standalone email worker, which
//! renders and sends the "new inquiry" mail. Delivery is best-effort from
//! the pipeline's point of view, but a failure here means the owner will
//! not hear about the lead, so the dispatcher logs it loudly enough to
//! follow up by hand.
use anyhow::{Context, Result};
use async_trait::async_trait;
use brigade_core::model::Submission;

#[async_trait]
pub trait LeadNotifier: Send + Sync {
    async fn notify_new_lead(&self, submission: &Submission) -> Result<()>;
}

pub struct EmailWorkerNotifier {
    client: reqwest::Client,
    url: String,
}

impl EmailWorkerNotifier {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl LeadNotifier for EmailWorkerNotifier {
    async fn notify_new_lead(&self, submission: &Submission) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(submission)
            .send()
            .await
            .with_context(|| "send email worker request")?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("email worker rejected lead: {status} - {text}");
        }
        Ok(())
    }
}
