use async_trait::async_trait;
use brigade_core::model::{Lead, LeadQuery, LeadUpdate};
use thiserror::Error;

pub mod memory;
pub mod warehouse;

#[derive(Debug, Clone)]
pub struct LeadPage {
    pub leads: Vec<Lead>,
    pub total_count: u64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Primary durable home of lead records; the source of truth for the admin
/// API and for attribution reporting.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn insert_lead(&self, lead: Lead) -> StoreResult<()>;
    async fn get_lead(&self, lead_id: &str) -> StoreResult<Lead>;
    async fn query_leads(&self, query: &LeadQuery) -> StoreResult<LeadPage>;
    async fn update_lead(&self, lead_id: &str, update: LeadUpdate) -> StoreResult<()>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
