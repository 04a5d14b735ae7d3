//! Data-warehouse implementation of the lead store, backed by the BigQuery
//! REST API.
//!
//! Inserts use the streaming `insertAll` endpoint with the lead id as
//! `insertId` so upstream retries stay idempotent. Reads and updates go
//! through `jobs.query` with named query parameters; the only identifiers
//! spliced into SQL text are the project/dataset/table path from config and
//! an order-by column checked against [`ORDERABLE_COLUMNS`].
use super::{LeadPage, LeadStore, StoreError, StoreResult};
use crate::config::WarehouseConfig;
use crate::google::{decode_credentials, GoogleAuth};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use brigade_core::model::{Lead, LeadQuery, LeadUpdate};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

const SCOPE: &str = "https://www.googleapis.com/auth/bigquery";

pub struct WarehouseStore {
    client: reqwest::Client,
    auth: GoogleAuth,
    project_id: String,
    dataset: String,
    table: String,
}

impl WarehouseStore {
    pub fn new(client: reqwest::Client, config: &WarehouseConfig) -> Result<Self> {
        let key = decode_credentials(&config.credentials)?;
        Ok(Self {
            auth: GoogleAuth::new(client.clone(), key, SCOPE),
            client,
            project_id: config.project_id.clone(),
            dataset: config.dataset.clone(),
            table: config.table.clone(),
        })
    }

    fn table_path(&self) -> String {
        format!("`{}.{}.{}`", self.project_id, self.dataset, self.table)
    }

    async fn run_query(&self, query: &str, params: Vec<Value>) -> Result<QueryResult> {
        let token = self.auth.access_token().await?;
        let url = format!(
            "https://bigquery.googleapis.com/bigquery/v2/projects/{}/queries",
            self.project_id
        );
        let mut body = json!({ "query": query, "useLegacySql": false });
        if !params.is_empty() {
            body["parameterMode"] = json!("NAMED");
            body["queryParameters"] = Value::Array(params);
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .with_context(|| "send warehouse query")?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("warehouse query failed: {status} - {text}");
        }
        response
            .json()
            .await
            .with_context(|| "parse warehouse query response")
    }
}

fn string_param(name: &str, value: &str) -> Value {
    typed_param(name, "STRING", value)
}

fn typed_param(name: &str, kind: &str, value: &str) -> Value {
    json!({
        "name": name,
        "parameterType": { "type": kind },
        "parameterValue": { "value": value }
    })
}

fn timestamp_param(name: &str, value: DateTime<Utc>) -> Value {
    typed_param(
        name,
        "TIMESTAMP",
        &value.to_rfc3339_opts(SecondsFormat::Micros, true),
    )
}

#[derive(Debug, serde::Deserialize)]
struct QueryResult {
    schema: Option<QuerySchema>,
    rows: Option<Vec<QueryRow>>,
}

#[derive(Debug, serde::Deserialize)]
struct QuerySchema {
    fields: Vec<QueryField>,
}

#[derive(Debug, serde::Deserialize)]
struct QueryField {
    name: String,
}

#[derive(Debug, serde::Deserialize)]
struct QueryRow {
    f: Vec<QueryCell>,
}

#[derive(Debug, serde::Deserialize)]
struct QueryCell {
    v: Value,
}

/// Rebuild a JSON object from the columnar `{schema, rows[].f[].v}` shape
/// the query endpoint returns, coercing cells back to the lead's native
/// types so the record can be deserialized directly.
fn row_to_object(fields: &[QueryField], row: &QueryRow) -> Value {
    let mut object = serde_json::Map::new();
    for (field, cell) in fields.iter().zip(&row.f) {
        object.insert(field.name.clone(), coerce_cell(&field.name, &cell.v));
    }
    Value::Object(object)
}

fn coerce_cell(column: &str, value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        // Repeated fields arrive as [{"v": ...}, ...].
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| coerce_cell(column, item.get("v").unwrap_or(item)))
                .collect(),
        ),
        Value::String(text) => match column {
            "has_event" | "returning_customer" | "ga4_event_sent" | "ads_conversion_sent" => {
                Value::Bool(text == "true")
            }
            "booking_value" => text
                .parse::<f64>()
                .ok()
                .and_then(|n| serde_json::Number::from_f64(n).map(Value::Number))
                .unwrap_or(Value::Null),
            "submitted_at" | "status_updated_at" | "notes_updated_at" | "won_at"
            | "ga4_event_sent_at" | "ads_conversion_sent_at" => epoch_to_rfc3339(text)
                .map(Value::String)
                .unwrap_or(Value::Null),
            _ => Value::String(text.clone()),
        },
        other => other.clone(),
    }
}

/// Timestamps come back as epoch-seconds strings (scientific notation
/// included, e.g. `"1.7208E9"`).
fn epoch_to_rfc3339(text: &str) -> Option<String> {
    let seconds: f64 = text.parse().ok()?;
    let secs = seconds.trunc() as i64;
    let nanos = ((seconds - seconds.trunc()) * 1e9).round() as u32;
    DateTime::<Utc>::from_timestamp(secs, nanos)
        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn row_to_lead(fields: &[QueryField], row: &QueryRow) -> Result<Lead> {
    serde_json::from_value(row_to_object(fields, row)).with_context(|| "decode warehouse lead row")
}

#[async_trait]
impl LeadStore for WarehouseStore {
    async fn insert_lead(&self, lead: Lead) -> StoreResult<()> {
        let token = self.auth.access_token().await.map_err(StoreError::from)?;
        let url = format!(
            "https://bigquery.googleapis.com/bigquery/v2/projects/{}/datasets/{}/tables/{}/insertAll",
            self.project_id, self.dataset, self.table
        );

        let mut row = serde_json::to_value(&lead)
            .with_context(|| "encode lead row")
            .map_err(StoreError::from)?;
        // DATE column: keep only the YYYY-MM-DD part.
        let date_only = row
            .get("event_date")
            .and_then(Value::as_str)
            .map(|date| date.split('T').next().unwrap_or(date).to_string());
        if let Some(date) = date_only {
            row["event_date"] = Value::String(date);
        }

        let body = json!({
            "rows": [{ "insertId": lead.lead_id, "json": row }]
        });
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .with_context(|| "send warehouse insert")
            .map_err(StoreError::from)?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("warehouse insert failed: {status} - {text}").into());
        }

        let result: Value = response
            .json()
            .await
            .with_context(|| "parse warehouse insert response")
            .map_err(StoreError::from)?;
        if let Some(errors) = result.get("insertErrors").and_then(Value::as_array) {
            if !errors.is_empty() {
                return Err(anyhow!("warehouse insert rejected rows: {errors:?}").into());
            }
        }
        Ok(())
    }

    async fn get_lead(&self, lead_id: &str) -> StoreResult<Lead> {
        let query = format!(
            "SELECT * FROM {} WHERE lead_id = @lead_id LIMIT 1",
            self.table_path()
        );
        let result = self
            .run_query(&query, vec![string_param("lead_id", lead_id)])
            .await
            .map_err(StoreError::from)?;

        let fields = result
            .schema
            .map(|schema| schema.fields)
            .unwrap_or_default();
        let rows = result.rows.unwrap_or_default();
        let row = rows
            .first()
            .ok_or_else(|| StoreError::NotFound(format!("lead {lead_id}")))?;
        row_to_lead(&fields, row).map_err(StoreError::from)
    }

    async fn query_leads(&self, query: &LeadQuery) -> StoreResult<LeadPage> {
        query.validate().map_err(|reason| anyhow!(reason))?;

        let mut filter = String::new();
        let mut params = Vec::new();
        if let Some(status) = query.status {
            filter.push_str(" WHERE status = @status");
            params.push(string_param("status", status.as_str()));
        }

        let data_sql = format!(
            "SELECT * FROM {}{} ORDER BY {} {} LIMIT {} OFFSET {}",
            self.table_path(),
            filter,
            query.order_by,
            query.order_dir.as_sql(),
            query.limit,
            query.offset
        );
        let count_sql = format!(
            "SELECT COUNT(*) AS total FROM {}{}",
            self.table_path(),
            filter
        );

        let data = self
            .run_query(&data_sql, params.clone())
            .await
            .map_err(StoreError::from)?;
        let count = self
            .run_query(&count_sql, params)
            .await
            .map_err(StoreError::from)?;

        let fields = data.schema.map(|schema| schema.fields).unwrap_or_default();
        let leads = data
            .rows
            .unwrap_or_default()
            .iter()
            .map(|row| row_to_lead(&fields, row))
            .collect::<Result<Vec<Lead>>>()
            .map_err(StoreError::from)?;

        let total_count = count
            .rows
            .as_deref()
            .and_then(|rows| rows.first())
            .and_then(|row| row.f.first())
            .and_then(|cell| cell.v.as_str())
            .and_then(|text| text.parse().ok())
            .unwrap_or(0);

        Ok(LeadPage { leads, total_count })
    }

    async fn update_lead(&self, lead_id: &str, update: LeadUpdate) -> StoreResult<()> {
        let mut clauses: Vec<String> = Vec::new();
        let mut params = vec![string_param("lead_id", lead_id)];

        if let Some(status) = update.status {
            clauses.push("status = @status".to_string());
            params.push(string_param("status", status.as_str()));
        }
        if let Some(notes) = &update.notes {
            clauses.push("notes = @notes".to_string());
            params.push(string_param("notes", notes));
        }
        if let Some(value) = update.booking_value {
            clauses.push("booking_value = @booking_value".to_string());
            params.push(typed_param("booking_value", "FLOAT64", &value.to_string()));
        }
        if let Some(ts) = update.status_updated_at {
            clauses.push("status_updated_at = @status_updated_at".to_string());
            params.push(timestamp_param("status_updated_at", ts));
        }
        if let Some(ts) = update.notes_updated_at {
            clauses.push("notes_updated_at = @notes_updated_at".to_string());
            params.push(timestamp_param("notes_updated_at", ts));
        }
        if let Some(ts) = update.won_at {
            clauses.push("won_at = @won_at".to_string());
            params.push(timestamp_param("won_at", ts));
        }
        if let Some(sent) = update.ga4_event_sent {
            clauses.push(format!("ga4_event_sent = {sent}"));
            if let Some(ts) = update.ga4_event_sent_at {
                clauses.push("ga4_event_sent_at = @ga4_event_sent_at".to_string());
                params.push(timestamp_param("ga4_event_sent_at", ts));
            }
        }
        if let Some(sent) = update.ads_conversion_sent {
            clauses.push(format!("ads_conversion_sent = {sent}"));
            if let Some(ts) = update.ads_conversion_sent_at {
                clauses.push("ads_conversion_sent_at = @ads_conversion_sent_at".to_string());
                params.push(timestamp_param("ads_conversion_sent_at", ts));
            }
        }

        if clauses.is_empty() {
            return Ok(());
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE lead_id = @lead_id",
            self.table_path(),
            clauses.join(", ")
        );
        self.run_query(&sql, params)
            .await
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.run_query("SELECT 1", Vec::new())
            .await
            .map_err(StoreError::from)?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "warehouse"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brigade_core::model::{LeadStatus, Submission};

    fn fields(names: &[&str]) -> Vec<QueryField> {
        names
            .iter()
            .map(|name| QueryField {
                name: name.to_string(),
            })
            .collect()
    }

    #[test]
    fn epoch_strings_convert_to_rfc3339() {
        let rendered = epoch_to_rfc3339("1735689600").expect("timestamp");
        assert!(rendered.starts_with("2025-01-01T00:00:00"));
        // Scientific notation with fractional seconds also parses.
        assert!(epoch_to_rfc3339("1.7356896005E9").is_some());
        assert!(epoch_to_rfc3339("not-a-number").is_none());
    }

    #[test]
    fn columnar_rows_decode_into_leads() {
        let submission = Submission {
            first_name: Some("Sarah".to_string()),
            email: Some("sarah@gmail.com".to_string()),
            ..Submission::default()
        };
        let lead = Lead::from_submission(&submission, Utc::now());

        // Round-trip through the columnar wire shape the query API uses.
        let object = serde_json::to_value(&lead).expect("encode");
        let names: Vec<String> = object
            .as_object()
            .expect("object")
            .keys()
            .cloned()
            .collect();
        let row = QueryRow {
            f: names
                .iter()
                .map(|name| QueryCell {
                    v: match &object[name] {
                        Value::Null => Value::Null,
                        Value::Bool(b) => Value::String(b.to_string()),
                        Value::String(s) if name.ends_with("_at") => Value::String(
                            DateTime::parse_from_rfc3339(s)
                                .map(|ts| ts.timestamp().to_string())
                                .unwrap_or_else(|_| s.clone()),
                        ),
                        other => other.clone(),
                    },
                })
                .collect(),
        };
        let schema = fields(&names.iter().map(String::as_str).collect::<Vec<_>>());

        let decoded = row_to_lead(&schema, &row).expect("decode");
        assert_eq!(decoded.lead_id, lead.lead_id);
        assert_eq!(decoded.email.as_deref(), Some("sarah@gmail.com"));
        assert_eq!(decoded.status, LeadStatus::New);
        assert!(!decoded.ga4_event_sent);
    }

    #[test]
    fn repeated_fields_unwrap_nested_values() {
        let coerced = coerce_cell(
            "dietary_requirements",
            &json!([{ "v": "vegetarian" }, { "v": "gluten-free" }]),
        );
        assert_eq!(coerced, json!(["vegetarian", "gluten-free"]));
    }

    #[test]
    fn boolean_and_numeric_cells_coerce() {
        assert_eq!(coerce_cell("has_event", &json!("true")), json!(true));
        assert_eq!(coerce_cell("ga4_event_sent", &json!("false")), json!(false));
        assert_eq!(coerce_cell("booking_value", &json!("5000.5")), json!(5000.5));
    }
}
