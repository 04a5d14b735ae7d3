//! Domain types and pure logic for the lead-capture pipeline.
//!
//! # Purpose
//! Everything in this crate is deterministic and free of I/O: the spam
//! classifier, email normalization, identity hashing, and the lead data
//! model. The `leads` service layers storage and external calls on top.
pub mod email;
pub mod identity;
pub mod model;
pub mod spam;

pub use model::{
    Contact, Lead, LeadQuery, LeadStatus, LeadUpdate, OrderDir, Submission,
};
pub use spam::{classify, Verdict};
