//! Lead service HTTP API module.
pub mod error;
pub mod leads;
pub mod openapi;
pub mod submit;
pub mod system;
pub mod types;
