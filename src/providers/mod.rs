//! Upstream providers
//!
//! The recommendation backend is the primary source for every operation;
//! the public metadata provider serves fallback listings and image
//! enrichment. Both sit behind traits so the orchestrator can be driven by
//! in-memory fakes.

mod backend;
mod local;
mod tmdb;
mod traits;

pub use backend::HttpCatalogBackend;
pub use local::LocalCandidates;
pub use tmdb::TmdbMetadata;
pub use traits::{CatalogBackend, MetadataProvider};
