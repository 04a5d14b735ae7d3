//! Analytics lifecycle events via the GA4 Measurement Protocol.
//!
//! Events are keyed by the `ga_client_id` the tracking snippet captured at
//! submission time; without it the platform cannot stitch the event to the
//! original session, so the call is skipped with an error the caller logs.
use super::AnalyticsReporter;
use crate::config::Ga4Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use brigade_core::model::Lead;
use serde_json::{json, Value};

const COLLECT_URL: &str = "https://www.google-analytics.com/mp/collect";

pub struct Ga4Client {
    client: reqwest::Client,
    measurement_id: String,
    api_secret: String,
}

impl Ga4Client {
    pub fn new(client: reqwest::Client, config: &Ga4Config) -> Self {
        Self {
            client,
            measurement_id: config.measurement_id.clone(),
            api_secret: config.api_secret.clone(),
        }
    }
}

fn event_payload(lead: &Lead, client_id: &str, event: &str) -> Value {
    let mut params = json!({
        "value": lead.booking_value.unwrap_or(0.0),
        "currency": "USD",
        "event_category": "lead_lifecycle",
        "lead_status": event.trim_end_matches("_lead"),
    });
    if let Some(source) = &lead.lead_source {
        params["lead_source"] = json!(source);
    }
    if let Some(event_type) = &lead.event_type {
        params["event_type"] = json!(event_type);
    }
    json!({
        "client_id": client_id,
        "events": [{ "name": event, "params": params }]
    })
}

#[async_trait]
impl AnalyticsReporter for Ga4Client {
    async fn report_lifecycle_event(&self, lead: &Lead, event: &str) -> Result<()> {
        let client_id = lead
            .ga_client_id
            .as_deref()
            .context("lead has no analytics client id")?;

        let response = self
            .client
            .post(COLLECT_URL)
            .query(&[
                ("measurement_id", self.measurement_id.as_str()),
                ("api_secret", self.api_secret.as_str()),
            ])
            .json(&event_payload(lead, client_id, event))
            .send()
            .await
            .with_context(|| "send analytics event")?;

        // The collect endpoint answers 204 on success.
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("analytics event rejected: {status} - {text}");
        }
        Ok(())
    }
}
