//! Contact directory: one deduplicated person per identity.
//!
//! # Purpose
//! Every accepted lead is upserted into the directory keyed by its identity
//! (normalized email, digits-only phone as fallback). A hit marks the lead
//! as a returning customer; a miss creates the contact with first-touch
//! attribution frozen. Directory failures are reported to the dispatcher
//! but never fail the submission.
//!
//! The production implementation talks to the CRM's PostgREST interface
//! with the service-role key; the in-memory one backs tests and local runs.
use crate::config::RelationalConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use brigade_core::model::{Contact, Lead};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// What the directory learned about the submitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactOutcome {
    pub returning_customer: bool,
}

#[async_trait]
pub trait ContactDirectory: Send + Sync {
    /// Find-or-create the contact behind this lead. Returns whether the
    /// identity was already known.
    async fn upsert_from_lead(&self, lead: &Lead) -> Result<ContactOutcome>;
}

#[derive(Default)]
pub struct InMemoryDirectory {
    contacts: RwLock<HashMap<String, Contact>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contact(&self, identity: &str) -> Option<Contact> {
        self.contacts.read().await.get(identity).cloned()
    }
}

#[async_trait]
impl ContactDirectory for InMemoryDirectory {
    async fn upsert_from_lead(&self, lead: &Lead) -> Result<ContactOutcome> {
        let Some(identity) = lead.identity_key() else {
            return Ok(ContactOutcome {
                returning_customer: false,
            });
        };

        let mut contacts = self.contacts.write().await;
        let now = Utc::now();
        if let Some(existing) = contacts.get_mut(&identity) {
            existing.lead_count += 1;
            existing.last_seen_at = now;
            // Fill gaps, never overwrite what we already know.
            if existing.first_name.is_none() {
                existing.first_name = lead.first_name.clone();
            }
            if existing.last_name.is_none() {
                existing.last_name = lead.last_name.clone();
            }
            if existing.phone.is_none() {
                existing.phone = lead.phone.clone();
            }
            return Ok(ContactOutcome {
                returning_customer: true,
            });
        }

        contacts.insert(
            identity.clone(),
            Contact {
                contact_id: Uuid::new_v4().to_string(),
                identity,
                first_name: lead.first_name.clone(),
                last_name: lead.last_name.clone(),
                email: lead.email.clone(),
                phone: lead.phone.clone(),
                first_source: lead
                    .lead_source
                    .clone()
                    .or_else(|| Some("website_form".to_string())),
                lead_count: 1,
                created_at: now,
                last_seen_at: now,
            },
        );
        Ok(ContactOutcome {
            returning_customer: false,
        })
    }
}

/// PostgREST-backed directory.
pub struct RelationalDirectory {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
    tenant_id: i64,
}

impl RelationalDirectory {
    pub fn new(client: reqwest::Client, config: &RelationalConfig) -> Self {
        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
            tenant_id: config.tenant_id,
        }
    }

    fn contacts_url(&self) -> String {
        format!("{}/rest/v1/contacts", self.base_url)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Value>> {
        let response = self
            .authed(self.client.get(self.contacts_url()))
            .query(&[
                ("tenant_id", format!("eq.{}", self.tenant_id)),
                ("email", format!("eq.{email}")),
                ("select", "*".to_string()),
                ("limit", "1".to_string()),
            ])
            .send()
            .await
            .with_context(|| "query contact directory")?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("contact lookup failed: {status} - {text}");
        }
        let mut rows: Vec<Value> = response
            .json()
            .await
            .with_context(|| "parse contact lookup response")?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    async fn touch_existing(&self, existing: &Value, lead: &Lead) -> Result<()> {
        let id = existing
            .get("id")
            .and_then(Value::as_i64)
            .with_context(|| "contact row missing id")?;
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut patch = json!({
            "last_activity_at": now,
            "updated_at": now,
        });
        // Fill gaps only.
        if existing.get("phone").map_or(true, Value::is_null) {
            if let Some(phone) = &lead.phone {
                patch["phone"] = json!(phone);
            }
        }
        if existing.get("first_name").map_or(true, Value::is_null) {
            if let Some(first) = &lead.first_name {
                patch["first_name"] = json!(first);
            }
        }
        if existing.get("last_name").map_or(true, Value::is_null) {
            if let Some(last) = &lead.last_name {
                patch["last_name"] = json!(last);
            }
        }

        let response = self
            .authed(self.client.patch(self.contacts_url()))
            .query(&[("id", format!("eq.{id}"))])
            .json(&patch)
            .send()
            .await
            .with_context(|| "update contact activity")?;
        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("contact update failed: {status}");
        }
        Ok(())
    }

    async fn create(&self, lead: &Lead, email: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let row = json!({
            "tenant_id": self.tenant_id,
            "email": email,
            "phone": lead.phone,
            "first_name": lead.first_name,
            "last_name": lead.last_name,
            "contact_type": "individual",
            "lifecycle_stage": "lead",
            "original_source": lead.lead_source.as_deref().unwrap_or("website_form"),
            "lead_source": lead.lead_source,
            "utm_source": lead.utm_source,
            "utm_medium": lead.utm_medium,
            "utm_campaign": lead.utm_campaign,
            "gclid": lead.gclid,
            "last_activity_at": now,
            "email_status": "valid",
            "opt_in_marketing": true,
        });

        let response = self
            .authed(self.client.post(self.contacts_url()))
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await
            .with_context(|| "create contact")?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("contact create failed: {status} - {text}");
        }
        Ok(())
    }
}

#[async_trait]
impl ContactDirectory for RelationalDirectory {
    async fn upsert_from_lead(&self, lead: &Lead) -> Result<ContactOutcome> {
        // The CRM keys contacts by email; phone-only submitters are not
        // tracked there.
        let Some(email) = lead.email.as_deref() else {
            return Ok(ContactOutcome {
                returning_customer: false,
            });
        };

        if let Some(existing) = self.find_by_email(email).await? {
            if let Err(error) = self.touch_existing(&existing, lead).await {
                // The match already answered the returning question.
                tracing::warn!(%error, "contact activity update failed");
            }
            return Ok(ContactOutcome {
                returning_customer: true,
            });
        }

        self.create(lead, email).await?;
        Ok(ContactOutcome {
            returning_customer: false,
        })
    }
}
