//! Document-store mirror of accepted leads, backed by the Firestore REST
//! API.
//!
//! The mirror keeps a reduced, human-oriented document per lead (combined
//! name, contact details, event basics, triage fields) keyed by the lead id
//! so records join trivially against the warehouse. Admin edits patch the
//! same document with an explicit field mask.
use super::LeadSink;
use crate::config::DocstoreConfig;
use crate::google::{decode_credentials, GoogleAuth};
use anyhow::{Context, Result};
use async_trait::async_trait;
use brigade_core::model::{Lead, LeadUpdate};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};

const SCOPE: &str = "https://www.googleapis.com/auth/datastore";

pub struct DocstoreSink {
    client: reqwest::Client,
    auth: GoogleAuth,
    project_id: String,
    collection: String,
}

impl DocstoreSink {
    pub fn new(client: reqwest::Client, config: &DocstoreConfig) -> Result<Self> {
        let key = decode_credentials(&config.credentials)?;
        Ok(Self {
            auth: GoogleAuth::new(client.clone(), key, SCOPE),
            client,
            project_id: config.project_id.clone(),
            collection: config.collection.clone(),
        })
    }

    fn documents_url(&self) -> String {
        format!(
            "https://firestore.googleapis.com/v1/projects/{}/databases/(default)/documents/{}",
            self.project_id, self.collection
        )
    }
}

/// Encode a JSON value in the document API's typed-value envelope.
fn typed_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(flag) => json!({ "booleanValue": flag }),
        Value::Number(number) => {
            if number.is_i64() || number.is_u64() {
                json!({ "integerValue": number.to_string() })
            } else {
                json!({ "doubleValue": number })
            }
        }
        Value::String(text) => json!({ "stringValue": text }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(typed_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => {
            let fields: Map<String, Value> = map
                .iter()
                .map(|(key, value)| (key.clone(), typed_value(value)))
                .collect();
            json!({ "mapValue": { "fields": fields } })
        }
    }
}

fn typed_fields(values: &[(&str, Value)]) -> Map<String, Value> {
    values
        .iter()
        .map(|(key, value)| (key.to_string(), typed_value(value)))
        .collect()
}

fn opt_string(value: &Option<String>) -> Value {
    value.as_deref().map(Value::from).unwrap_or(Value::Null)
}

/// Reduced document written at intake.
fn lead_document(lead: &Lead) -> Map<String, Value> {
    let name = format!(
        "{} {}",
        lead.first_name.as_deref().unwrap_or(""),
        lead.last_name.as_deref().unwrap_or("")
    )
    .trim()
    .to_string();
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    typed_fields(&[
        ("lead_id", Value::from(lead.lead_id.as_str())),
        ("name", Value::from(name)),
        (
            "email",
            Value::from(lead.email.as_deref().unwrap_or("")),
        ),
        (
            "phone",
            Value::from(lead.phone.as_deref().unwrap_or("")),
        ),
        ("preferred_contact", opt_string(&lead.preferred_contact)),
        ("event_date", opt_string(&lead.event_date)),
        ("event_time", opt_string(&lead.event_time)),
        ("event_type", opt_string(&lead.event_type)),
        ("guest_count", opt_string(&lead.guest_count)),
        ("location", opt_string(&lead.location)),
        ("service_style", opt_string(&lead.service_style)),
        ("budget_range", opt_string(&lead.budget_range)),
        (
            "dietary_requirements",
            lead.dietary_requirements
                .as_ref()
                .map(|items| Value::from(items.clone()))
                .unwrap_or(Value::Null),
        ),
        ("message", opt_string(&lead.message)),
        ("event_description", opt_string(&lead.event_description)),
        ("status", Value::from(lead.status.as_str())),
        ("notes", Value::from("")),
        ("booking_value", Value::Null),
        ("created_at", Value::from(now.clone())),
        ("updated_at", Value::from(now)),
    ])
}

#[async_trait]
impl LeadSink for DocstoreSink {
    fn name(&self) -> &'static str {
        "docstore"
    }

    async fn write_lead(&self, lead: &Lead) -> Result<()> {
        let token = self.auth.access_token().await?;
        // Lead id doubles as the document id.
        let url = format!("{}?documentId={}", self.documents_url(), lead.lead_id);
        let body = json!({ "fields": lead_document(lead) });

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .with_context(|| "send docstore create")?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("docstore create failed: {status} - {text}");
        }
        Ok(())
    }

    async fn apply_update(&self, lead_id: &str, update: &LeadUpdate) -> Result<()> {
        let mut mask = vec!["updated_at".to_string()];
        let mut values: Vec<(&str, Value)> = vec![(
            "updated_at",
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        )];

        if let Some(status) = update.status {
            mask.push("status".to_string());
            values.push(("status", Value::from(status.as_str())));
        }
        if let Some(notes) = &update.notes {
            mask.push("notes".to_string());
            values.push(("notes", Value::from(notes.as_str())));
        }
        if let Some(value) = update.booking_value {
            mask.push("booking_value".to_string());
            values.push(("booking_value", json!(value)));
        }
        if mask.len() == 1 {
            return Ok(());
        }

        let token = self.auth.access_token().await?;
        let mask_query: Vec<String> = mask
            .iter()
            .map(|field| format!("updateMask.fieldPaths={field}"))
            .collect();
        let url = format!(
            "{}/{}?{}",
            self.documents_url(),
            lead_id,
            mask_query.join("&")
        );
        let body = json!({ "fields": typed_fields(&values) });

        let response = self
            .client
            .patch(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .with_context(|| "send docstore update")?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("docstore update failed: {status} - {text}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brigade_core::model::Submission;

    #[test]
    fn typed_values_wrap_json_scalars() {
        assert_eq!(typed_value(&json!(null)), json!({ "nullValue": null }));
        assert_eq!(typed_value(&json!(true)), json!({ "booleanValue": true }));
        assert_eq!(typed_value(&json!(42)), json!({ "integerValue": "42" }));
        assert_eq!(typed_value(&json!(19.5)), json!({ "doubleValue": 19.5 }));
        assert_eq!(
            typed_value(&json!("hi")),
            json!({ "stringValue": "hi" })
        );
        assert_eq!(
            typed_value(&json!(["a", "b"])),
            json!({ "arrayValue": { "values": [
                { "stringValue": "a" },
                { "stringValue": "b" }
            ]}})
        );
    }

    #[test]
    fn lead_document_combines_name_and_defaults_triage_fields() {
        let submission = Submission {
            first_name: Some("Sarah".to_string()),
            last_name: Some("Johnson".to_string()),
            email: Some("sarah@gmail.com".to_string()),
            dietary_requirements: Some(vec!["vegetarian".to_string()]),
            ..Submission::default()
        };
        let lead = Lead::from_submission(&submission, Utc::now());
        let document = lead_document(&lead);

        assert_eq!(document["name"], json!({ "stringValue": "Sarah Johnson" }));
        assert_eq!(document["status"], json!({ "stringValue": "new" }));
        assert_eq!(document["notes"], json!({ "stringValue": "" }));
        assert_eq!(document["booking_value"], json!({ "nullValue": null }));
        assert_eq!(
            document["dietary_requirements"],
            json!({ "arrayValue": { "values": [{ "stringValue": "vegetarian" }] } })
        );
    }
}
