//! Secondary lead destinations.
//!
//! Sinks receive every accepted lead after the primary store write. They
//! run in registration order and are best-effort: one sink failing is
//! logged and counted but never blocks the others or the response.
use anyhow::Result;
use async_trait::async_trait;
use brigade_core::model::{Lead, LeadUpdate};

pub mod docstore;

#[async_trait]
pub trait LeadSink: Send + Sync {
    fn name(&self) -> &'static str;

    /// Mirror a newly accepted lead.
    async fn write_lead(&self, lead: &Lead) -> Result<()>;

    /// Mirror an admin edit. Sinks that only care about intake may keep the
    /// default no-op.
    async fn apply_update(&self, _lead_id: &str, _update: &LeadUpdate) -> Result<()> {
        Ok(())
    }
}
