//! Search-result lookup service.
//!
//! Wraps the [`serp_extract`] pipeline and result store in a service that
//! fetches results pages, substitutes a placeholder when nothing can be
//! extracted, resolves stored IDs, and fetches linked pages. The
//! `serp-lookup` binary exposes it over a newline-delimited JSON bridge.

pub mod bridge;
pub mod config;
pub mod error;
pub mod janitor;
pub mod service;

pub use config::LookupConfig;
pub use error::{LookupError, Result};
pub use janitor::StoreJanitor;
pub use service::{LookupService, StoreStats};
