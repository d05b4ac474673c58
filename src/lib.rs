//! Catalog Scout: request orchestration and caching for a course/movie catalog client
//!
//! Turns user interaction (typing, searching, switching filters) into a
//! bounded set of upstream requests: TTL-cached, one live request per
//! operation kind, primary/secondary fallback, and image enrichment from a
//! public metadata provider.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod enrich;
pub mod metrics;
pub mod network;
pub mod orchestrator;
pub mod providers;
pub mod request;
pub mod resolve;
pub mod web;

pub use catalog::{CatalogItem, Category, Filters, ItemId, Profile};
pub use config::Settings;
pub use orchestrator::{Delivery, Listing, Orchestrator};
pub use resolve::Source;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Budget for each of the primary and secondary attempts, in milliseconds
pub const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 7_000;

/// Maximum age of a cached listing, in milliseconds
pub const DEFAULT_CACHE_TTL_MS: u64 = 30_000;

/// Maximum number of items enriched per batch
pub const DEFAULT_ENRICH_BATCH_SIZE: usize = 6;
