mod common;

use axum::http::StatusCode;
use brigade_core::model::{ConversionKind, LeadStatus};
use common::{
    app_with, get_request, json_request, read_json, sample_form, FailingStore, RecordingAnalytics,
    RecordingSink, RecordingUploader,
};
use leads::dispatch::{Dispatcher, SubmitOutcome};
use leads::store::memory::InMemoryStore;
use leads::store::LeadStore;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

async fn seed_lead(dispatcher: &Dispatcher) -> String {
    let submission = serde_json::from_value(sample_form()).expect("submission");
    match dispatcher.submit(&submission).await.expect("submit") {
        SubmitOutcome::Accepted { lead_id, .. } => lead_id,
        SubmitOutcome::Rejected { reason } => panic!("seed rejected: {reason}"),
    }
}

#[tokio::test]
async fn listing_filters_and_paginates() {
    let store = Arc::new(InMemoryStore::new());
    let dispatcher = Dispatcher::new(store.clone());
    let first = seed_lead(&dispatcher).await;
    let _second = seed_lead(&dispatcher).await;
    dispatcher
        .apply_status(&first, LeadStatus::Contacted, None)
        .await
        .expect("status");
    let app = app_with(dispatcher);

    let response = app
        .clone()
        .oneshot(get_request("/api/admin/leads"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["totalCount"], json!(2));
    assert_eq!(body["limit"], json!(50));
    assert_eq!(body["offset"], json!(0));

    let response = app
        .clone()
        .oneshot(get_request("/api/admin/leads?status=contacted"))
        .await
        .expect("response");
    let body = read_json(response).await;
    assert_eq!(body["totalCount"], json!(1));
    assert_eq!(body["leads"][0]["lead_id"], json!(first));

    let response = app
        .oneshot(get_request("/api/admin/leads?limit=1&offset=1&orderDir=ASC"))
        .await
        .expect("response");
    let body = read_json(response).await;
    assert_eq!(body["totalCount"], json!(2));
    assert_eq!(body["leads"].as_array().expect("leads").len(), 1);
}

#[tokio::test]
async fn listing_rejects_unknown_sort_column_and_status() {
    let app = app_with(Dispatcher::new(Arc::new(InMemoryStore::new())));

    let response = app
        .clone()
        .oneshot(get_request("/api/admin/leads?orderBy=email;DROP%20TABLE"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(get_request("/api/admin/leads?status=converted"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert!(body["message"]
        .as_str()
        .expect("message")
        .contains("Must be one of"));
}

#[tokio::test]
async fn contacted_transition_reports_analytics_event() {
    let store = Arc::new(InMemoryStore::new());
    let analytics = Arc::new(RecordingAnalytics::default());
    let dispatcher = Dispatcher::new(store.clone()).with_analytics(analytics.clone());
    let lead_id = seed_lead(&dispatcher).await;
    let app = app_with(dispatcher);

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/leads/{lead_id}/status"),
            json!({ "status": "contacted" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["leadId"], json!(lead_id));
    assert_eq!(body["status"], json!("contacted"));

    assert_eq!(
        analytics.events.lock().await.as_slice(),
        ["working_lead".to_string()]
    );
    let lead = store.get_lead(&lead_id).await.expect("lead");
    assert_eq!(lead.status, LeadStatus::Contacted);
    assert!(lead.status_updated_at.is_some());
    assert!(lead.ga4_event_sent);
    assert!(lead.ga4_event_sent_at.is_some());
}

#[tokio::test]
async fn won_requires_positive_booking_value() {
    let store = Arc::new(InMemoryStore::new());
    let dispatcher = Dispatcher::new(store.clone());
    let lead_id = seed_lead(&dispatcher).await;
    let app = app_with(dispatcher);

    for body in [json!({ "status": "won" }), json!({ "status": "won", "booking_value": 0 })] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/admin/leads/{lead_id}/status"),
                body,
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(
            body["message"],
            json!("Booking value required when marking as won")
        );
    }
    // Nothing changed.
    let lead = store.get_lead(&lead_id).await.expect("lead");
    assert_eq!(lead.status, LeadStatus::New);
}

#[tokio::test]
async fn won_with_value_uploads_booking_conversion() {
    let store = Arc::new(InMemoryStore::new());
    let analytics = Arc::new(RecordingAnalytics::default());
    let uploader = Arc::new(RecordingUploader::default());
    let dispatcher = Dispatcher::new(store.clone())
        .with_analytics(analytics.clone())
        .with_ads(uploader.clone());
    let lead_id = seed_lead(&dispatcher).await;
    let app = app_with(dispatcher);

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/leads/{lead_id}/status"),
            json!({ "status": "won", "booking_value": 8000.0 }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["booking_value"], json!(8000.0));

    let lead = store.get_lead(&lead_id).await.expect("lead");
    assert_eq!(lead.status, LeadStatus::Won);
    assert_eq!(lead.booking_value, Some(8000.0));
    assert!(lead.won_at.is_some());
    assert!(lead.ads_conversion_sent);

    assert_eq!(
        analytics.events.lock().await.as_slice(),
        ["convert_lead".to_string()]
    );
    assert_eq!(
        uploader.kinds.lock().await.as_slice(),
        [ConversionKind::Booking]
    );
}

#[tokio::test]
async fn invalid_status_lists_valid_set() {
    let store = Arc::new(InMemoryStore::new());
    let dispatcher = Dispatcher::new(store);
    let lead_id = seed_lead(&dispatcher).await;
    let app = app_with(dispatcher);

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/leads/{lead_id}/status"),
            json!({ "status": "converted" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert!(body["message"]
        .as_str()
        .expect("message")
        .contains("new, contacted, qualified, quoted, won, lost"));
}

#[tokio::test]
async fn notes_and_value_routes_validate_and_persist() {
    let store = Arc::new(InMemoryStore::new());
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = Dispatcher::new(store.clone()).with_sink(sink.clone());
    let lead_id = seed_lead(&dispatcher).await;
    let app = app_with(dispatcher);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/leads/{lead_id}/notes"),
            json!({}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/leads/{lead_id}/notes"),
            json!({ "notes": "prefers saturday tastings" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/leads/{lead_id}/value"),
            json!({ "booking_value": 4500.0 }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let lead = store.get_lead(&lead_id).await.expect("lead");
    assert_eq!(lead.notes.as_deref(), Some("prefers saturday tastings"));
    assert!(lead.notes_updated_at.is_some());
    assert_eq!(lead.booking_value, Some(4500.0));
    assert_eq!(sink.updates.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unknown_lead_is_not_found() {
    let app = app_with(Dispatcher::new(Arc::new(InMemoryStore::new())));

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/admin/leads/does-not-exist/status",
            json!({ "status": "contacted" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reflects_store_state() {
    let app = app_with(Dispatcher::new(Arc::new(InMemoryStore::new())));
    let response = app
        .oneshot(get_request("/api/system/health"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["backend"], json!("memory"));

    let app = app_with(Dispatcher::new(Arc::new(FailingStore)));
    let response = app
        .oneshot(get_request("/api/system/health"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = app_with(Dispatcher::new(Arc::new(InMemoryStore::new())));
    let response = app
        .oneshot(get_request("/api/openapi.json"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["info"]["title"], json!("brigade-leads"));
    assert!(body["paths"]["/api/submit-form"].get("post").is_some());
    assert!(body["paths"]["/api/admin/leads"].get("get").is_some());
}
