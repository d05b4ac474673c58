//! Public movie metadata provider (TMDB v3 API)

use super::traits::MetadataProvider;
use crate::cache::EnrichmentEntry;
use crate::catalog::normalize::{genre_id, metadata_item, metadata_payload};
use crate::catalog::{CatalogItem, Category, Filters, ImageResolver, ItemId};
use crate::config::MetadataSettings;
use crate::network::{FetchError, FetchResult, HttpClient, ProviderRequest};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use url::Url;

/// TMDB client used for fallback listings and image enrichment
pub struct TmdbMetadata {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    images: ImageResolver,
    default_region: String,
    default_language: String,
    trailer_base_url: String,
}

impl TmdbMetadata {
    pub fn new(client: HttpClient, settings: &MetadataSettings) -> anyhow::Result<Self> {
        Url::parse(&settings.base_url)?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone().filter(|k| !k.trim().is_empty()),
            images: ImageResolver::new(&settings.image_base_url, &settings.poster_size),
            default_region: settings.default_region.clone(),
            default_language: settings.default_language.clone(),
            trailer_base_url: settings.trailer_base_url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Display language: the first requested language qualified with the region
    fn language(&self, filters: &Filters) -> String {
        match filters.normalized_languages().first() {
            Some(lang) if lang.contains('-') => lang.clone(),
            Some(lang) => format!("{}-{}", lang, self.default_region.to_uppercase()),
            None => self.default_language.clone(),
        }
    }

    fn request(&self, path: &str, filters: &Filters) -> ProviderRequest {
        ProviderRequest::get(self.endpoint(path))
            .param_opt("api_key", self.api_key.as_deref())
            .param("language", self.language(filters))
            .param("region", &self.default_region)
            .param("include_adult", !filters.safe_mode)
    }

    async fn fetch_list(
        &self,
        request: ProviderRequest,
        filters: &Filters,
    ) -> FetchResult<Vec<CatalogItem>> {
        let response = self.client.execute(request).await?.error_for_status()?;
        let payload: serde_json::Value = response.json()?;

        let mut items = metadata_payload(&payload, &self.images);
        if filters.safe_mode {
            items.retain(|item| !item.adult);
        }
        Ok(items)
    }

    async fn videos(&self, num: i64) -> FetchResult<Value> {
        let request = ProviderRequest::get(self.endpoint(&format!("movie/{}/videos", num)))
            .param_opt("api_key", self.api_key.as_deref());
        self.client.execute(request).await?.error_for_status()?.json()
    }

    /// First YouTube trailer of a movie; a failed lookup leaves it out
    async fn trailer(&self, num: i64) -> Option<String> {
        match self.videos(num).await {
            Ok(payload) => {
                trailer_key(&payload).map(|key| format!("{}{}", self.trailer_base_url, key))
            }
            Err(e) => {
                debug!("tmdb: trailer lookup for movie {} failed: {}", num, e);
                None
            }
        }
    }
}

fn trailer_key(payload: &Value) -> Option<&str> {
    payload
        .get("results")?
        .as_array()?
        .iter()
        .find(|video| video["site"] == "YouTube" && video["type"] == "Trailer")?
        .get("key")?
        .as_str()
}

#[async_trait]
impl MetadataProvider for TmdbMetadata {
    fn name(&self) -> &str {
        "tmdb"
    }

    async fn lookup_by_id(&self, id: &ItemId) -> FetchResult<Option<EnrichmentEntry>> {
        let Some(num) = id.as_num() else {
            return Ok(None);
        };

        let request = self.request(&format!("movie/{}", num), &Filters::default());
        let response = self.client.execute(request).await?;
        if response.is_not_found() {
            return Ok(None);
        }

        let payload: serde_json::Value = response.error_for_status()?.json()?;
        Ok(metadata_item(&payload, &self.images).map(|item| EnrichmentEntry {
            images: item.images,
            canonical_title: item.title,
            tags: item.tags,
        }))
    }

    async fn search(&self, query: &str, filters: &Filters) -> FetchResult<Vec<CatalogItem>> {
        let request = self
            .request("search/movie", filters)
            .param("query", query.trim())
            .param("page", 1);
        self.fetch_list(request, filters).await
    }

    async fn listing(
        &self,
        category: &Category,
        page: u32,
        filters: &Filters,
    ) -> FetchResult<Vec<CatalogItem>> {
        let request = match category {
            Category::Trending => self.request("trending/movie/day", filters),
            Category::TopRated => self.request("movie/top_rated", filters),
            Category::Genre(name) => {
                let id = genre_id(name)
                    .ok_or_else(|| FetchError::unsupported(self.name(), format!("genre {}", name)))?;
                self.request("discover/movie", filters)
                    .param("with_genres", id)
                    .param("sort_by", "popularity.desc")
            }
        };
        self.fetch_list(request.param("page", page.max(1)), filters)
            .await
    }

    async fn details(&self, id: &ItemId, filters: &Filters) -> FetchResult<CatalogItem> {
        let num = id.as_num().ok_or_else(|| {
            FetchError::unsupported(self.name(), format!("details for {}", id))
        })?;

        let request = self.request(&format!("movie/{}", num), filters);
        let (response, trailer) = tokio::join!(self.client.execute(request), self.trailer(num));

        let payload: Value = response?.error_for_status()?.json()?;
        let mut item = metadata_item(&payload, &self.images)
            .ok_or_else(|| FetchError::Malformed(format!("movie {} without an id", num)))?;
        item.trailer = trailer;
        Ok(item)
    }

    async fn similar(&self, id: &ItemId, filters: &Filters) -> FetchResult<Vec<CatalogItem>> {
        let num = id.as_num().ok_or_else(|| {
            FetchError::unsupported(self.name(), format!("recommendations for {}", id))
        })?;
        let request = self.request(&format!("movie/{}/recommendations", num), filters);
        self.fetch_list(request, filters).await
    }
}
