//! Offline click-conversion upload to the Google Ads API.
//!
//! Conversions are matched to the original ad click through the stored
//! `gclid`, enhanced with hashed email/phone identifiers for cross-device
//! matching. Authentication is the OAuth refresh-token grant; access tokens
//! are reused through the same expiry-stamped cache the service-account
//! clients use.
use super::ConversionUploader;
use crate::config::AdsConfig;
use crate::google::TokenCache;
use anyhow::{Context, Result};
use async_trait::async_trait;
use brigade_core::model::{ConversionKind, Lead};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use std::time::Duration;

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const API_VERSION: &str = "v16";

pub struct AdsClient {
    client: reqwest::Client,
    config: AdsConfig,
    cache: TokenCache,
}

impl AdsClient {
    pub fn new(client: reqwest::Client, config: AdsConfig) -> Self {
        Self {
            client,
            config,
            cache: TokenCache::new(),
        }
    }

    async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.cache.get().await {
            return Ok(token);
        }

        let response = self
            .client
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", self.config.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .with_context(|| "refresh ad platform token")?;
        if !response.status().is_success() {
            anyhow::bail!("ad platform token refresh failed: {}", response.status());
        }

        #[derive(serde::Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: u64,
        }
        let token: TokenResponse = response
            .json()
            .await
            .with_context(|| "parse ad platform token response")?;
        self.cache
            .put(
                token.access_token.clone(),
                Duration::from_secs(token.expires_in),
            )
            .await;
        Ok(token.access_token)
    }

    fn conversion_action(&self, kind: ConversionKind) -> Result<String> {
        let action_id = match kind {
            ConversionKind::Qualified => self.config.qualified_conversion_id.as_deref(),
            ConversionKind::Booking => self.config.booking_conversion_id.as_deref(),
        }
        .with_context(|| format!("no conversion action configured for {kind:?}"))?;
        Ok(format!(
            "customers/{}/conversionActions/{}",
            self.config.customer_id, action_id
        ))
    }
}

fn conversion_payload(lead: &Lead, gclid: &str, action: &str, kind: ConversionKind) -> Value {
    let value = match kind {
        ConversionKind::Qualified => 0.0,
        ConversionKind::Booking => lead.booking_value.unwrap_or(0.0),
    };

    let mut identifiers = Vec::new();
    if let Some(hash) = &lead.email_hash {
        identifiers.push(json!({ "hashedEmail": hash }));
    }
    if let Some(hash) = &lead.phone_hash {
        identifiers.push(json!({ "hashedPhoneNumber": hash }));
    }

    json!({
        "conversions": [{
            "gclid": gclid,
            "conversionAction": action,
            "conversionDateTime": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "conversionValue": value,
            "currencyCode": "USD",
            "userIdentifiers": identifiers,
        }],
        "partialFailure": false
    })
}

#[async_trait]
impl ConversionUploader for AdsClient {
    async fn upload_click_conversion(&self, lead: &Lead, kind: ConversionKind) -> Result<()> {
        let gclid = lead
            .gclid
            .as_deref()
            .context("lead has no click id")?;
        let action = self.conversion_action(kind)?;
        let token = self.access_token().await?;

        let url = format!(
            "https://googleads.googleapis.com/{}/customers/{}:uploadClickConversions",
            API_VERSION, self.config.customer_id
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header("developer-token", &self.config.developer_token)
            .header("login-customer-id", &self.config.customer_id)
            .json(&conversion_payload(lead, gclid, &action, kind))
            .send()
            .await
            .with_context(|| "send click conversion")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("click conversion rejected: {status} - {text}");
        }
        Ok(())
    }
}
