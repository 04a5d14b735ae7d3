//! Lead pipeline data model.
//!
//! # Purpose
//! Defines the raw form `Submission`, the durable `Lead` record derived from
//! it, the fixed lifecycle `LeadStatus` set, and the patch/query shapes used
//! by the admin API and stores.
//!
//! # Key invariants
//! - A `Submission` is immutable and never persisted verbatim; only the
//!   derived `Lead` (sans honeypot) is stored.
//! - `LeadStatus` is a closed set; `won` requires a positive booking value.
//! - Contact identity is the normalized email or digits-only phone; at most
//!   one `Contact` exists per identity within a tenant.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{email, identity};

/// Raw contact-form payload as submitted by the website.
///
/// Contact fields use the form's camelCase keys; attribution fields keep the
/// snake_case names the tracking snippet emits. Everything is optional --
/// presence validation happens at the API boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Submission {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub preferred_contact: Option<String>,

    pub has_event: Option<YesNo>,
    pub event_type: Option<String>,
    pub event_date: Option<String>,
    pub event_time: Option<String>,
    pub guest_count: Option<String>,
    pub location: Option<String>,
    pub service_style: Option<String>,
    pub budget_range: Option<String>,
    pub dietary_requirements: Option<Vec<String>>,
    pub message: Option<String>,
    pub event_description: Option<String>,

    /// Honeypot. Humans never fill this in.
    pub website: Option<String>,

    #[serde(rename = "utm_source")]
    pub utm_source: Option<String>,
    #[serde(rename = "utm_medium")]
    pub utm_medium: Option<String>,
    #[serde(rename = "utm_campaign")]
    pub utm_campaign: Option<String>,
    #[serde(rename = "utm_term")]
    pub utm_term: Option<String>,
    #[serde(rename = "utm_content")]
    pub utm_content: Option<String>,
    pub gclid: Option<String>,
    pub fbclid: Option<String>,
    pub referrer: Option<String>,
    #[serde(rename = "landing_page")]
    pub landing_page: Option<String>,
    #[serde(rename = "source_page")]
    pub source_page: Option<String>,
    #[serde(rename = "lead_source")]
    pub lead_source: Option<String>,
    #[serde(rename = "ga_client_id")]
    pub ga_client_id: Option<String>,
    #[serde(rename = "ga_session_id")]
    pub ga_session_id: Option<String>,
}

/// Forms send `hasEvent` as either a `"yes"`/`"no"` string or a boolean.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YesNo {
    Bool(bool),
    Text(String),
}

impl YesNo {
    pub fn as_bool(&self) -> bool {
        match self {
            YesNo::Bool(value) => *value,
            YesNo::Text(value) => {
                value.eq_ignore_ascii_case("yes") || value.eq_ignore_ascii_case("true")
            }
        }
    }
}

/// Fixed lead lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Quoted,
    Won,
    Lost,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 6] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Qualified,
        LeadStatus::Quoted,
        LeadStatus::Won,
        LeadStatus::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Quoted => "quoted",
            LeadStatus::Won => "won",
            LeadStatus::Lost => "lost",
        }
    }

    /// Transitions that report a lifecycle event to the analytics platform.
    pub fn ga4_event(&self) -> Option<&'static str> {
        match self {
            LeadStatus::Contacted => Some("working_lead"),
            LeadStatus::Qualified => Some("qualify_lead"),
            LeadStatus::Won => Some("convert_lead"),
            _ => None,
        }
    }

    /// Transitions that upload an offline conversion to the ad platform.
    pub fn ads_conversion(&self) -> Option<ConversionKind> {
        match self {
            LeadStatus::Qualified => Some(ConversionKind::Qualified),
            LeadStatus::Won => Some(ConversionKind::Booking),
            _ => None,
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        LeadStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == input)
            .ok_or_else(|| {
                let valid: Vec<&str> = LeadStatus::ALL.iter().map(|s| s.as_str()).collect();
                format!("invalid status. Must be one of: {}", valid.join(", "))
            })
    }
}

/// Which ad-platform conversion action a transition maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionKind {
    Qualified,
    Booking,
}

/// Durable lead record derived from a non-spam submission.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Lead {
    pub lead_id: String,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Normalized (trimmed, lowercased, typo-repaired) email.
    pub email: Option<String>,
    pub email_hash: Option<String>,
    pub phone: Option<String>,
    pub phone_hash: Option<String>,
    pub preferred_contact: Option<String>,

    pub has_event: bool,
    pub event_type: Option<String>,
    pub event_date: Option<String>,
    pub event_time: Option<String>,
    pub guest_count: Option<String>,
    pub location: Option<String>,
    pub service_style: Option<String>,
    pub budget_range: Option<String>,
    pub dietary_requirements: Option<Vec<String>>,
    pub message: Option<String>,
    pub event_description: Option<String>,

    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub gclid: Option<String>,
    pub fbclid: Option<String>,
    pub referrer: Option<String>,
    pub landing_page: Option<String>,
    pub source_page: Option<String>,
    pub lead_source: Option<String>,
    pub ga_client_id: Option<String>,
    pub ga_session_id: Option<String>,

    pub status: LeadStatus,
    pub notes: Option<String>,
    pub booking_value: Option<f64>,
    /// Set when contact-directory lookup matched an existing identity.
    pub returning_customer: bool,

    pub submitted_at: DateTime<Utc>,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub notes_updated_at: Option<DateTime<Utc>>,
    pub won_at: Option<DateTime<Utc>>,

    pub ga4_event_sent: bool,
    pub ga4_event_sent_at: Option<DateTime<Utc>>,
    pub ads_conversion_sent: bool,
    pub ads_conversion_sent_at: Option<DateTime<Utc>>,
}

impl Lead {
    /// Derive a lead from an accepted submission: new random id, normalized
    /// email, identity hashes, status `new`. The honeypot is dropped here.
    pub fn from_submission(submission: &Submission, now: DateTime<Utc>) -> Self {
        let email = submission
            .email
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(email::normalize);
        let email_hash = email.as_deref().map(identity::sha256_hex);
        let phone = submission
            .phone
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(str::to_string);
        let phone_hash = phone.as_deref().map(identity::hash_phone);

        Self {
            lead_id: Uuid::new_v4().to_string(),
            first_name: submission.first_name.clone(),
            last_name: submission.last_name.clone(),
            email,
            email_hash,
            phone,
            phone_hash,
            preferred_contact: submission.preferred_contact.clone(),
            has_event: submission
                .has_event
                .as_ref()
                .map(YesNo::as_bool)
                .unwrap_or(false),
            event_type: submission.event_type.clone(),
            event_date: submission.event_date.clone(),
            event_time: submission.event_time.clone(),
            guest_count: submission.guest_count.clone(),
            location: submission.location.clone(),
            service_style: submission.service_style.clone(),
            budget_range: submission.budget_range.clone(),
            dietary_requirements: submission.dietary_requirements.clone(),
            message: submission.message.clone(),
            event_description: submission.event_description.clone(),
            utm_source: submission.utm_source.clone(),
            utm_medium: submission.utm_medium.clone(),
            utm_campaign: submission.utm_campaign.clone(),
            utm_term: submission.utm_term.clone(),
            utm_content: submission.utm_content.clone(),
            gclid: submission.gclid.clone(),
            fbclid: submission.fbclid.clone(),
            referrer: submission.referrer.clone(),
            landing_page: submission.landing_page.clone(),
            source_page: submission.source_page.clone(),
            lead_source: submission.lead_source.clone(),
            ga_client_id: submission.ga_client_id.clone(),
            ga_session_id: submission.ga_session_id.clone(),
            status: LeadStatus::New,
            notes: None,
            booking_value: None,
            returning_customer: false,
            submitted_at: now,
            status_updated_at: None,
            notes_updated_at: None,
            won_at: None,
            ga4_event_sent: false,
            ga4_event_sent_at: None,
            ads_conversion_sent: false,
            ads_conversion_sent_at: None,
        }
    }

    /// Normalized identity key for contact dedupe: email first, phone digits
    /// as fallback.
    pub fn identity_key(&self) -> Option<String> {
        if let Some(email) = &self.email {
            return Some(email.clone());
        }
        self.phone
            .as_deref()
            .map(email::normalize_phone)
            .filter(|digits| !digits.is_empty())
    }
}

/// Partial update applied to a stored lead.
#[derive(Debug, Clone, Default)]
pub struct LeadUpdate {
    pub status: Option<LeadStatus>,
    pub notes: Option<String>,
    pub booking_value: Option<f64>,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub notes_updated_at: Option<DateTime<Utc>>,
    pub won_at: Option<DateTime<Utc>>,
    pub ga4_event_sent: Option<bool>,
    pub ga4_event_sent_at: Option<DateTime<Utc>>,
    pub ads_conversion_sent: Option<bool>,
    pub ads_conversion_sent_at: Option<DateTime<Utc>>,
}

impl LeadUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.notes.is_none()
            && self.booking_value.is_none()
            && self.won_at.is_none()
            && self.ga4_event_sent.is_none()
            && self.ads_conversion_sent.is_none()
    }
}

/// Sort direction for lead listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDir {
    Asc,
    #[default]
    Desc,
}

impl OrderDir {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OrderDir::Asc => "ASC",
            OrderDir::Desc => "DESC",
        }
    }
}

impl FromStr for OrderDir {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_ascii_uppercase().as_str() {
            "ASC" => Ok(OrderDir::Asc),
            "DESC" => Ok(OrderDir::Desc),
            other => Err(format!("invalid order direction: {other}")),
        }
    }
}

/// Columns the admin listing may sort by. Everything else is rejected
/// before any query string is built.
pub const ORDERABLE_COLUMNS: &[&str] = &[
    "submitted_at",
    "status_updated_at",
    "event_date",
    "booking_value",
    "first_name",
    "last_name",
    "status",
];

/// Filter/pagination parameters for the admin lead listing.
#[derive(Debug, Clone)]
pub struct LeadQuery {
    /// `None` means all statuses.
    pub status: Option<LeadStatus>,
    pub limit: u32,
    pub offset: u32,
    pub order_by: String,
    pub order_dir: OrderDir,
}

impl Default for LeadQuery {
    fn default() -> Self {
        Self {
            status: None,
            limit: 50,
            offset: 0,
            order_by: "submitted_at".to_string(),
            order_dir: OrderDir::Desc,
        }
    }
}

impl LeadQuery {
    pub fn validate(&self) -> Result<(), String> {
        if !ORDERABLE_COLUMNS.contains(&self.order_by.as_str()) {
            return Err(format!("invalid orderBy column: {}", self.order_by));
        }
        Ok(())
    }
}

/// Deduplicated person derived from lead identities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub contact_id: String,
    /// Normalized email or digits-only phone.
    pub identity: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// First-touch attribution, frozen on creation.
    pub first_source: Option<String>,
    pub lead_count: u32,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}
