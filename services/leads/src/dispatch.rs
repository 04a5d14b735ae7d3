//! Lead fan-out dispatcher.
//!
//! # Purpose
//! Owns the write path shared by the form and admin routes: classify,
//! normalize, upsert the contact, write the primary store, mirror to the
//! secondary sinks, notify the owner, and report status-driven conversions.
//!
//! # Failure policy
//! The primary store write is the only fatal downstream call. Everything
//! else is best-effort, executed sequentially and awaited so failures are
//! observable in logs and metrics, and isolated so one destination failing
//! never starves the next.
use crate::contacts::ContactDirectory;
use crate::conversions::{AnalyticsReporter, ConversionUploader};
use crate::notify::LeadNotifier;
use crate::sinks::LeadSink;
use crate::store::{LeadStore, StoreResult};
use brigade_core::model::{Lead, LeadStatus, LeadUpdate, Submission};
use brigade_core::spam::{classify, Verdict};
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Result of pushing one submission through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Classified as spam; nothing was written or sent.
    Rejected { reason: String },
    Accepted {
        lead_id: String,
        returning_customer: bool,
    },
}

pub struct Dispatcher {
    store: Arc<dyn LeadStore>,
    sinks: Vec<Arc<dyn LeadSink>>,
    contacts: Option<Arc<dyn ContactDirectory>>,
    notifier: Option<Arc<dyn LeadNotifier>>,
    analytics: Option<Arc<dyn AnalyticsReporter>>,
    ads: Option<Arc<dyn ConversionUploader>>,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn LeadStore>) -> Self {
        Self {
            store,
            sinks: Vec::new(),
            contacts: None,
            notifier: None,
            analytics: None,
            ads: None,
        }
    }

    /// Sinks run in registration order.
    pub fn with_sink(mut self, sink: Arc<dyn LeadSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_contacts(mut self, contacts: Arc<dyn ContactDirectory>) -> Self {
        self.contacts = Some(contacts);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn LeadNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsReporter>) -> Self {
        self.analytics = Some(analytics);
        self
    }

    pub fn with_ads(mut self, ads: Arc<dyn ConversionUploader>) -> Self {
        self.ads = Some(ads);
        self
    }

    pub fn store(&self) -> &Arc<dyn LeadStore> {
        &self.store
    }

    /// Submit pipeline. Returns `Err` only when the primary store write
    /// fails.
    pub async fn submit(&self, submission: &Submission) -> StoreResult<SubmitOutcome> {
        let Verdict { is_spam, reason } = classify(submission);
        if is_spam {
            let reason = reason.unwrap_or_else(|| "unspecified".to_string());
            info!(%reason, "submission classified as spam");
            counter!("leads_spam_total").increment(1);
            return Ok(SubmitOutcome::Rejected { reason });
        }

        let mut lead = Lead::from_submission(submission, Utc::now());

        if let Some(contacts) = &self.contacts {
            match contacts.upsert_from_lead(&lead).await {
                Ok(outcome) => lead.returning_customer = outcome.returning_customer,
                Err(error) => {
                    warn!(lead_id = %lead.lead_id, %error, "contact upsert failed");
                    counter!("lead_contact_failures_total").increment(1);
                }
            }
        }

        let lead_id = lead.lead_id.clone();
        let returning_customer = lead.returning_customer;
        self.store.insert_lead(lead.clone()).await?;
        counter!("leads_accepted_total").increment(1);
        info!(lead_id = %lead_id, returning_customer, "lead accepted");

        for sink in &self.sinks {
            if let Err(error) = sink.write_lead(&lead).await {
                error!(lead_id = %lead_id, sink = sink.name(), %error, "sink write failed");
                counter!("lead_sink_failures_total", "sink" => sink.name()).increment(1);
            }
        }

        if let Some(notifier) = &self.notifier {
            // The acknowledgement mail must reach the deliverable address,
            // so the worker sees the normalized, typo-repaired email.
            let mut outbound = submission.clone();
            outbound.email = lead.email.clone();
            if let Err(notify_error) = notifier.notify_new_lead(&outbound).await {
                // Loud on purpose: the owner will not hear about this lead
                // otherwise, so leave enough contact info to follow up by
                // hand.
                error!(
                    lead_id = %lead_id,
                    email = lead.email.as_deref().unwrap_or("-"),
                    phone = lead.phone.as_deref().unwrap_or("-"),
                    error = %notify_error,
                    "lead notification email failed",
                );
                counter!("lead_notify_failures_total").increment(1);
            }
        }

        Ok(SubmitOutcome::Accepted {
            lead_id,
            returning_customer,
        })
    }

    /// Persist a status change, mirror it to the sinks, and fire the
    /// conversion reports the transition calls for.
    pub async fn apply_status(
        &self,
        lead_id: &str,
        status: LeadStatus,
        booking_value: Option<f64>,
    ) -> StoreResult<()> {
        let mut lead = self.store.get_lead(lead_id).await?;
        let now = Utc::now();

        let mut update = LeadUpdate {
            status: Some(status),
            status_updated_at: Some(now),
            booking_value,
            ..LeadUpdate::default()
        };
        if status == LeadStatus::Won {
            update.won_at = Some(now);
        }
        self.store.update_lead(lead_id, update.clone()).await?;
        self.mirror_update(lead_id, &update).await;

        // Conversion payloads see the post-update lead.
        lead.status = status;
        if booking_value.is_some() {
            lead.booking_value = booking_value;
        }
        lead.won_at = update.won_at.or(lead.won_at);

        let mut bookkeeping = LeadUpdate::default();

        if let (Some(event), Some(analytics)) = (status.ga4_event(), &self.analytics) {
            if lead.ga_client_id.is_some() {
                match analytics.report_lifecycle_event(&lead, event).await {
                    Ok(()) => {
                        bookkeeping.ga4_event_sent = Some(true);
                        bookkeeping.ga4_event_sent_at = Some(Utc::now());
                        counter!("lead_conversion_events_total", "kind" => "analytics")
                            .increment(1);
                    }
                    Err(error) => {
                        warn!(lead_id, event, %error, "analytics event failed");
                        counter!("lead_conversion_failures_total", "kind" => "analytics")
                            .increment(1);
                    }
                }
            } else {
                warn!(lead_id, event, "skipping analytics event: no client id");
            }
        }

        if let (Some(kind), Some(ads)) = (status.ads_conversion(), &self.ads) {
            if lead.gclid.is_some() {
                match ads.upload_click_conversion(&lead, kind).await {
                    Ok(()) => {
                        bookkeeping.ads_conversion_sent = Some(true);
                        bookkeeping.ads_conversion_sent_at = Some(Utc::now());
                        counter!("lead_conversion_events_total", "kind" => "ads").increment(1);
                    }
                    Err(error) => {
                        warn!(lead_id, ?kind, %error, "click conversion failed");
                        counter!("lead_conversion_failures_total", "kind" => "ads").increment(1);
                    }
                }
            }
        }

        if !bookkeeping.is_empty() {
            if let Err(error) = self.store.update_lead(lead_id, bookkeeping).await {
                // The status change itself already landed.
                warn!(lead_id, %error, "conversion bookkeeping update failed");
            }
        }
        Ok(())
    }

    pub async fn apply_notes(&self, lead_id: &str, notes: String) -> StoreResult<()> {
        // Existence check keeps 404 semantics on the memory path too.
        self.store.get_lead(lead_id).await?;
        let update = LeadUpdate {
            notes: Some(notes),
            notes_updated_at: Some(Utc::now()),
            ..LeadUpdate::default()
        };
        self.store.update_lead(lead_id, update.clone()).await?;
        self.mirror_update(lead_id, &update).await;
        Ok(())
    }

    pub async fn apply_value(&self, lead_id: &str, booking_value: f64) -> StoreResult<()> {
        self.store.get_lead(lead_id).await?;
        let update = LeadUpdate {
            booking_value: Some(booking_value),
            ..LeadUpdate::default()
        };
        self.store.update_lead(lead_id, update.clone()).await?;
        self.mirror_update(lead_id, &update).await;
        Ok(())
    }

    async fn mirror_update(&self, lead_id: &str, update: &LeadUpdate) {
        for sink in &self.sinks {
            if let Err(error) = sink.apply_update(lead_id, update).await {
                warn!(lead_id, sink = sink.name(), %error, "sink update failed");
                counter!("lead_sink_failures_total", "sink" => sink.name()).increment(1);
            }
        }
    }
}
