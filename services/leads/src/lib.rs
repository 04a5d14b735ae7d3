//! Lead-capture service library crate.
//!
//! # Purpose
//! Exposes the HTTP API surface, fan-out dispatcher, configuration, and
//! storage/sink implementations for use by the binary and tests.
//!
//! # Notes
//! Module boundaries mirror the pipeline stages: classify (brigade-core),
//! store, fan out, notify, report conversions.
pub mod api;
pub mod app;
pub mod config;
pub mod contacts;
pub mod conversions;
pub mod dispatch;
pub mod google;
pub mod notify;
pub mod observability;
pub mod sinks;
pub mod store;
