//! usagebridge library
//!
//! Client for the Adobe Analytics 2.0 API that downloads usage/admin audit
//! logs, enriches them, and replays them into a report suite through Bulk
//! Data Insertion.
//!
//! - [`api`] - Authenticated HTTP client for the analytics and collection endpoints
//! - [`auth`] - Bearer-token session state
//! - [`dates`] - Inclusive date windows and 89-day range splitting
//! - [`enrich`] - Event-type decoding, component extraction, event tagging
//! - [`export`] - Bulk Data Insertion CSV building and read-back
//! - [`guard`] - Pre-submission validation and existing-data safety check
//! - [`store`] - On-disk JSON/CSV artifacts shared between pipeline stages
//! - [`cli`] - Command-line interface orchestrating the stages

pub mod api;
pub mod auth;
pub mod cli;
pub mod compress;
pub mod config;
pub mod dates;
pub mod enrich;
pub mod export;
pub mod guard;
pub mod models;
pub mod store;
