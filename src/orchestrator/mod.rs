//! Request orchestration
//!
//! Composes the listing cache, request slots, fallback resolver and
//! enricher into the operations the front-end calls: suggest, search,
//! item and profile recommendations, category listings and item details.

mod core;
mod models;

pub use self::core::Orchestrator;
pub use models::{Debounced, Delivery, ItemDetail, Listing, SearchResults};
