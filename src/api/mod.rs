//! HTTP client for the Adobe Analytics and collection APIs.

mod client;
mod error;

pub use client::{ApiClient, UsageLogQuery, ValidationOutcome};
pub use error::ApiError;
