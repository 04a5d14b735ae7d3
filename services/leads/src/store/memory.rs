//! In-memory implementation of the lead store.
//!
//! # Purpose
//! Implements `LeadStore` entirely in memory using a `HashMap` guarded by
//! `tokio::sync::RwLock`. It exists for:
//! - local development and tests (no external dependencies)
//! - deployments where durability is not required
//!
//! **Not durable**: all state is lost on process restart. Operations are
//! consistent within one process; writes take the write lock, reads the
//! read lock. Query semantics (filter, order, paginate) match what the
//! warehouse backend produces so admin-UI tests can run against either.
use super::{LeadPage, LeadStore, StoreError, StoreResult};
use async_trait::async_trait;
use brigade_core::model::{Lead, LeadQuery, LeadUpdate, OrderDir};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryStore {
    leads: Arc<RwLock<HashMap<String, Lead>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn compare_by(a: &Lead, b: &Lead, column: &str) -> Ordering {
    match column {
        "submitted_at" => a.submitted_at.cmp(&b.submitted_at),
        "status_updated_at" => a.status_updated_at.cmp(&b.status_updated_at),
        "event_date" => a.event_date.cmp(&b.event_date),
        "booking_value" => a
            .booking_value
            .partial_cmp(&b.booking_value)
            .unwrap_or(Ordering::Equal),
        "first_name" => a.first_name.cmp(&b.first_name),
        "last_name" => a.last_name.cmp(&b.last_name),
        "status" => a.status.as_str().cmp(b.status.as_str()),
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl LeadStore for InMemoryStore {
    async fn insert_lead(&self, lead: Lead) -> StoreResult<()> {
        self.leads.write().await.insert(lead.lead_id.clone(), lead);
        Ok(())
    }

    async fn get_lead(&self, lead_id: &str) -> StoreResult<Lead> {
        self.leads
            .read()
            .await
            .get(lead_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("lead {lead_id}")))
    }

    async fn query_leads(&self, query: &LeadQuery) -> StoreResult<LeadPage> {
        let leads = self.leads.read().await;
        let mut matched: Vec<Lead> = leads
            .values()
            .filter(|lead| query.status.map_or(true, |status| lead.status == status))
            .cloned()
            .collect();
        let total_count = matched.len() as u64;

        matched.sort_by(|a, b| {
            let ordering = compare_by(a, b, &query.order_by);
            match query.order_dir {
                OrderDir::Asc => ordering,
                OrderDir::Desc => ordering.reverse(),
            }
        });

        let page = matched
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();
        Ok(LeadPage {
            leads: page,
            total_count,
        })
    }

    async fn update_lead(&self, lead_id: &str, update: LeadUpdate) -> StoreResult<()> {
        let mut leads = self.leads.write().await;
        let lead = leads
            .get_mut(lead_id)
            .ok_or_else(|| StoreError::NotFound(format!("lead {lead_id}")))?;

        if let Some(status) = update.status {
            lead.status = status;
        }
        if let Some(notes) = update.notes {
            lead.notes = Some(notes);
        }
        if let Some(value) = update.booking_value {
            lead.booking_value = Some(value);
        }
        if update.status_updated_at.is_some() {
            lead.status_updated_at = update.status_updated_at;
        }
        if update.notes_updated_at.is_some() {
            lead.notes_updated_at = update.notes_updated_at;
        }
        if update.won_at.is_some() {
            lead.won_at = update.won_at;
        }
        if let Some(sent) = update.ga4_event_sent {
            lead.ga4_event_sent = sent;
            lead.ga4_event_sent_at = update.ga4_event_sent_at;
        }
        if let Some(sent) = update.ads_conversion_sent {
            lead.ads_conversion_sent = sent;
            lead.ads_conversion_sent_at = update.ads_conversion_sent_at;
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
