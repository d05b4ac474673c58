//! HTTP networking module
//!
//! Provides the HTTP client used by every upstream provider and the
//! classification of failed attempts.

mod client;
mod error;
mod request;

pub use client::HttpClient;
pub use error::{FetchError, FetchResult};
pub use request::{HttpMethod, ProviderRequest, ProviderResponse};
