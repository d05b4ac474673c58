//! Catalog data model
//!
//! Canonical item shape shared by every provider, request filters,
//! user profiles and the per-provider normalization functions.

mod filters;
mod item;
pub mod normalize;

pub use filters::{Category, Filters, Profile};
pub use item::{CatalogItem, ImageRefs, ItemId};
pub use normalize::ImageResolver;
