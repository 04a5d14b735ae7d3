#![allow(dead_code)]
use anyhow::anyhow;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::Router;
use brigade_core::model::{ConversionKind, Lead, LeadQuery, LeadUpdate, Submission};
use leads::app::{build_router, AppState};
use leads::conversions::{AnalyticsReporter, ConversionUploader};
use leads::dispatch::Dispatcher;
use leads::notify::LeadNotifier;
use leads::sinks::LeadSink;
use leads::store::{LeadPage, LeadStore, StoreError, StoreResult};
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::sync::Mutex;

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub fn app_with(dispatcher: Dispatcher) -> Router {
    build_router(AppState {
        dispatcher: Arc::new(dispatcher),
    })
}

/// A filled-in, non-spam form body in the shape the website sends.
pub fn sample_form() -> serde_json::Value {
    serde_json::json!({
        "firstName": "Sarah",
        "lastName": "Johnson",
        "email": "SARAH@GMAIL",
        "phone": "(734) 555-1234",
        "preferredContact": "email",
        "hasEvent": "yes",
        "eventType": "wedding",
        "guestCount": "120",
        "message": "Looking for catering for a June wedding.",
        "website": "",
        "utm_source": "google",
        "gclid": "Cj0abc123",
        "ga_client_id": "123.456"
    })
}

pub struct FailingStore;

#[async_trait]
impl LeadStore for FailingStore {
    async fn insert_lead(&self, _lead: Lead) -> StoreResult<()> {
        Err(StoreError::Unexpected(anyhow!("store offline")))
    }

    async fn get_lead(&self, _lead_id: &str) -> StoreResult<Lead> {
        Err(StoreError::Unexpected(anyhow!("store offline")))
    }

    async fn query_leads(&self, _query: &LeadQuery) -> StoreResult<LeadPage> {
        Err(StoreError::Unexpected(anyhow!("store offline")))
    }

    async fn update_lead(&self, _lead_id: &str, _update: LeadUpdate) -> StoreResult<()> {
        Err(StoreError::Unexpected(anyhow!("store offline")))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Err(StoreError::Unexpected(anyhow!("store offline")))
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub writes: AtomicUsize,
    pub updates: AtomicUsize,
}

#[async_trait]
impl LeadSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn write_lead(&self, _lead: &Lead) -> anyhow::Result<()> {
        self.writes.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    async fn apply_update(&self, _lead_id: &str, _update: &LeadUpdate) -> anyhow::Result<()> {
        self.updates
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

pub struct FailingSink;

#[async_trait]
impl LeadSink for FailingSink {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn write_lead(&self, _lead: &Lead) -> anyhow::Result<()> {
        Err(anyhow!("mirror unavailable"))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub calls: AtomicUsize,
}

#[async_trait]
impl LeadNotifier for RecordingNotifier {
    async fn notify_new_lead(&self, _submission: &Submission) -> anyhow::Result<()> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingAnalytics {
    pub events: Mutex<Vec<String>>,
}

#[async_trait]
impl AnalyticsReporter for RecordingAnalytics {
    async fn report_lifecycle_event(&self, _lead: &Lead, event: &str) -> anyhow::Result<()> {
        self.events.lock().await.push(event.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingUploader {
    pub kinds: Mutex<Vec<ConversionKind>>,
}

#[async_trait]
impl ConversionUploader for RecordingUploader {
    async fn upload_click_conversion(
        &self,
        _lead: &Lead,
        kind: ConversionKind,
    ) -> anyhow::Result<()> {
        self.kinds.lock().await.push(kind);
        Ok(())
    }
}
