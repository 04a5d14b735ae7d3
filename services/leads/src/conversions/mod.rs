//! Status-driven conversion reporting.
//!
//! Qualifying status transitions notify the analytics platform and, for
//! ad-attributed leads, upload offline click conversions. Both are
//! best-effort: the admin status update never fails because a conversion
//! call did. Outcomes are recorded back onto the lead by the dispatcher.
use anyhow::Result;
use async_trait::async_trait;
use brigade_core::model::{ConversionKind, Lead};

pub mod ads;
pub mod ga4;

/// Reports lead lifecycle events to the analytics platform.
#[async_trait]
pub trait AnalyticsReporter: Send + Sync {
    async fn report_lifecycle_event(&self, lead: &Lead, event: &str) -> Result<()>;
}

/// Uploads offline click conversions to the ad platform.
#[async_trait]
pub trait ConversionUploader: Send + Sync {
    async fn upload_click_conversion(&self, lead: &Lead, kind: ConversionKind) -> Result<()>;
}
