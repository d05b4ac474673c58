//! Provider traits

use crate::cache::EnrichmentEntry;
use crate::catalog::{CatalogItem, Category, Filters, ItemId, Profile};
use crate::network::{FetchError, FetchResult};
use async_trait::async_trait;

/// Primary recommendation backend
///
/// Every operation is an idempotent read; non-2xx statuses surface as
/// [`FetchError::Upstream`].
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Provider name for logging and metrics
    fn name(&self) -> &str;

    /// Free-text search
    async fn search(
        &self,
        query: &str,
        filters: &Filters,
        limit: usize,
    ) -> FetchResult<Vec<CatalogItem>>;

    /// Currently trending items
    async fn trending(
        &self,
        page: u32,
        filters: &Filters,
        limit: usize,
    ) -> FetchResult<Vec<CatalogItem>>;

    /// Highest rated items
    async fn top_rated(
        &self,
        page: u32,
        filters: &Filters,
        limit: usize,
    ) -> FetchResult<Vec<CatalogItem>>;

    /// Items in a genre / topic
    async fn genre(
        &self,
        name: &str,
        page: u32,
        filters: &Filters,
        limit: usize,
    ) -> FetchResult<Vec<CatalogItem>>;

    /// Items similar to `id`
    async fn recommend_by_item(
        &self,
        id: &ItemId,
        filters: &Filters,
        limit: usize,
    ) -> FetchResult<Vec<CatalogItem>>;

    /// Personalised recommendations
    async fn recommend_by_profile(
        &self,
        profile: &Profile,
        limit: usize,
    ) -> FetchResult<Vec<CatalogItem>>;

    /// One item by identifier
    ///
    /// There is no detail endpoint: a search for `id:<id>` is narrowed to an
    /// exact identifier match, and an unknown identifier is an HTTP 404.
    async fn item(&self, id: &ItemId, filters: &Filters) -> FetchResult<CatalogItem> {
        self.search(&format!("id:{}", id), filters, 1)
            .await?
            .into_iter()
            .find(|item| item.id == *id)
            .ok_or(FetchError::Upstream { status: 404 })
    }

    /// Dispatch a listing category to the matching endpoint
    async fn by_category(
        &self,
        category: &Category,
        page: u32,
        filters: &Filters,
        limit: usize,
    ) -> FetchResult<Vec<CatalogItem>> {
        match category {
            Category::Trending => self.trending(page, filters, limit).await,
            Category::TopRated => self.top_rated(page, filters, limit).await,
            Category::Genre(name) => self.genre(name, page, filters, limit).await,
        }
    }
}

/// Secondary public metadata source, used for fallback and enrichment
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Provider name for logging and metrics
    fn name(&self) -> &str;

    /// Metadata for one identifier; `Ok(None)` when the provider does not know it
    async fn lookup_by_id(&self, id: &ItemId) -> FetchResult<Option<EnrichmentEntry>>;

    /// Free-text search
    async fn search(&self, query: &str, filters: &Filters) -> FetchResult<Vec<CatalogItem>>;

    /// The provider's equivalent of a backend listing
    async fn listing(
        &self,
        category: &Category,
        page: u32,
        filters: &Filters,
    ) -> FetchResult<Vec<CatalogItem>>;

    /// Full record for one identifier, trailer included when there is one
    async fn details(&self, id: &ItemId, filters: &Filters) -> FetchResult<CatalogItem> {
        let _ = filters;
        Err(FetchError::unsupported(
            self.name(),
            format!("details for {}", id),
        ))
    }

    /// Items related to `id`
    async fn similar(&self, id: &ItemId, filters: &Filters) -> FetchResult<Vec<CatalogItem>> {
        let _ = filters;
        Err(FetchError::unsupported(
            self.name(),
            format!("recommendations for {}", id),
        ))
    }
}
