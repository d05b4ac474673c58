//! Recommendation backend client
//!
//! Talks to the course/movie recommendation service over its JSON API:
//! `/search`, `/trending`, `/top-rated`, `/category/{name}`,
//! `/recommendations` and `POST /recommendations/user`.

use super::traits::CatalogBackend;
use crate::catalog::normalize::backend_payload;
use crate::catalog::{CatalogItem, Filters, ImageResolver, ItemId, Profile};
use crate::config::{BackendSettings, MetadataSettings};
use crate::network::{FetchError, FetchResult, HttpClient, ProviderRequest};
use async_trait::async_trait;
use serde::Serialize;
use url::Url;

/// HTTP client for the recommendation backend
pub struct HttpCatalogBackend {
    client: HttpClient,
    base_url: String,
    item_param: String,
    images: ImageResolver,
}

impl HttpCatalogBackend {
    pub fn new(client: HttpClient, base_url: &str) -> anyhow::Result<Self> {
        Url::parse(base_url)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            item_param: "course_id".to_string(),
            images: ImageResolver::default(),
        })
    }

    /// Build from settings; relative image paths resolve against the metadata image host
    pub fn with_settings(
        client: HttpClient,
        backend: &BackendSettings,
        metadata: &MetadataSettings,
    ) -> anyhow::Result<Self> {
        let mut this = Self::new(client, &backend.base_url)?;
        this.item_param = backend.item_param.clone();
        this.images = ImageResolver::new(&metadata.image_base_url, &metadata.poster_size);
        Ok(this)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Attach the uniform filter parameters
    fn filtered(&self, request: ProviderRequest, filters: &Filters) -> ProviderRequest {
        let languages = filters.normalized_languages();
        request
            .param_opt("safe_mode", filters.safe_mode.then_some("true"))
            .param_opt(
                "languages",
                (!languages.is_empty()).then(|| languages.join(",")),
            )
    }

    async fn fetch(&self, request: ProviderRequest) -> FetchResult<Vec<CatalogItem>> {
        let response = self.client.execute(request).await?.error_for_status()?;
        let payload: serde_json::Value = response.json()?;

        let well_formed = payload.is_array()
            || payload
                .get("results")
                .map(|r| r.is_array())
                .unwrap_or(false);
        if !well_formed {
            return Err(FetchError::Malformed(
                "expected an array or an object with `results`".to_string(),
            ));
        }

        Ok(backend_payload(&payload, &self.images))
    }

    async fn listing(
        &self,
        path: &str,
        page: u32,
        filters: &Filters,
        limit: usize,
    ) -> FetchResult<Vec<CatalogItem>> {
        let request = ProviderRequest::get(self.endpoint(path))
            .param("page", page.max(1))
            .param("limit", limit);
        self.fetch(self.filtered(request, filters)).await
    }
}

/// Body of `POST /recommendations/user`
#[derive(Debug, Serialize)]
struct ProfilePayload<'a> {
    mood: &'a str,
    language: Vec<String>,
    interests: Vec<String>,
    liked: Vec<String>,
    disliked: Vec<String>,
    watchlist: Vec<String>,
    skill_level: &'a str,
    budget: &'a str,
    safe_mode: bool,
    limit: usize,
}

impl<'a> ProfilePayload<'a> {
    fn new(profile: &'a Profile, limit: usize) -> Self {
        let mut language = profile.filters().normalized_languages();
        if language.is_empty() {
            language.push("en".to_string());
        }

        Self {
            mood: profile.mood.as_deref().unwrap_or("happy"),
            language,
            interests: id_strings(&profile.liked),
            liked: id_strings(&profile.liked),
            disliked: id_strings(&profile.disliked),
            watchlist: id_strings(&profile.watchlist),
            skill_level: profile.skill_level.as_deref().unwrap_or("beginner"),
            budget: profile.budget.as_deref().unwrap_or("any"),
            safe_mode: profile.safe_mode,
            limit,
        }
    }
}

fn id_strings<'a>(ids: impl IntoIterator<Item = &'a ItemId>) -> Vec<String> {
    ids.into_iter().map(ItemId::to_string).collect()
}

#[async_trait]
impl CatalogBackend for HttpCatalogBackend {
    fn name(&self) -> &str {
        "backend"
    }

    async fn search(
        &self,
        query: &str,
        filters: &Filters,
        limit: usize,
    ) -> FetchResult<Vec<CatalogItem>> {
        let request = ProviderRequest::get(self.endpoint("search"))
            .param("query", query.trim())
            .param("limit", limit);
        self.fetch(self.filtered(request, filters)).await
    }

    async fn trending(
        &self,
        page: u32,
        filters: &Filters,
        limit: usize,
    ) -> FetchResult<Vec<CatalogItem>> {
        self.listing("trending", page, filters, limit).await
    }

    async fn top_rated(
        &self,
        page: u32,
        filters: &Filters,
        limit: usize,
    ) -> FetchResult<Vec<CatalogItem>> {
        self.listing("top-rated", page, filters, limit).await
    }

    async fn genre(
        &self,
        name: &str,
        page: u32,
        filters: &Filters,
        limit: usize,
    ) -> FetchResult<Vec<CatalogItem>> {
        let path = format!("category/{}", urlencoding::encode(name.trim()));
        self.listing(&path, page, filters, limit).await
    }

    async fn recommend_by_item(
        &self,
        id: &ItemId,
        filters: &Filters,
        limit: usize,
    ) -> FetchResult<Vec<CatalogItem>> {
        let request = ProviderRequest::get(self.endpoint("recommendations"))
            .param(self.item_param.clone(), id)
            .param("limit", limit);
        self.fetch(self.filtered(request, filters)).await
    }

    async fn recommend_by_profile(
        &self,
        profile: &Profile,
        limit: usize,
    ) -> FetchResult<Vec<CatalogItem>> {
        let body = serde_json::to_value(ProfilePayload::new(profile, limit))?;
        let request = ProviderRequest::post(self.endpoint("recommendations/user")).json(body);
        self.fetch(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn backend(server: &MockServer) -> HttpCatalogBackend {
        HttpCatalogBackend::new(HttpClient::new().unwrap(), &server.uri()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(HttpCatalogBackend::new(HttpClient::new().unwrap(), "not a url").is_err());
    }

    #[tokio::test]
    async fn test_item_lookup_by_id_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("query", "id:42"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 42, "title": "Rust for Beginners", "price": "Free"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("query", "id:43"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 99, "title": "Something else"}
            ])))
            .mount(&server)
            .await;

        let backend = backend(&server).await;
        let item = backend
            .item(&ItemId::Num(42), &Filters::default())
            .await
            .unwrap();
        assert_eq!(item.title.as_deref(), Some("Rust for Beginners"));

        // A different identifier in the answer is not a match.
        let err = backend
            .item(&ItemId::Num(43), &Filters::default())
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Upstream { status: 404 });
    }

    #[tokio::test]
    async fn test_search_sends_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("query", "intro"))
            .and(query_param("limit", "12"))
            .and(query_param("safe_mode", "true"))
            .and(query_param("languages", "en,hi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "title": "Intro to X"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let filters = Filters::new(true, vec!["hi".into(), "en".into()]);
        let items = backend(&server)
            .await
            .search("intro", &filters, 12)
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title.as_deref(), Some("Intro to X"));
        assert!(items[0].needs_images());
    }

    #[tokio::test]
    async fn test_results_envelope_is_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/top-rated"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"id": 5, "title": "Five"}, {"id": 6}]
            })))
            .mount(&server)
            .await;

        let items = backend(&server)
            .await
            .top_rated(2, &Filters::default(), 12)
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_non_success_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/trending"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = backend(&server)
            .await
            .trending(1, &Filters::default(), 12)
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Upstream { status: 500 });
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "boom"})))
            .mount(&server)
            .await;

        let err = backend(&server)
            .await
            .search("x", &Filters::default(), 6)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "malformed");
    }

    #[tokio::test]
    async fn test_item_recommendations_and_genre_paths() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/recommendations"))
            .and(query_param("course_id", "42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 43}])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/category/Data%20Science"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 44}])))
            .mount(&server)
            .await;

        let backend = backend(&server).await;
        let recs = backend
            .recommend_by_item(&ItemId::Num(42), &Filters::default(), 10)
            .await
            .unwrap();
        assert_eq!(recs[0].id, ItemId::Num(43));

        let listing = backend
            .genre("Data Science", 1, &Filters::default(), 12)
            .await
            .unwrap();
        assert_eq!(listing[0].id, ItemId::Num(44));
    }

    #[tokio::test]
    async fn test_profile_recommendations_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/recommendations/user"))
            .and(body_partial_json(json!({
                "mood": "curious",
                "language": ["en"],
                "liked": ["1", "2"],
                "budget": "free"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 9}])))
            .expect(1)
            .mount(&server)
            .await;

        let mut profile = Profile {
            mood: Some("curious".into()),
            budget: Some("free".into()),
            ..Default::default()
        };
        profile.liked.insert(ItemId::Num(2));
        profile.liked.insert(ItemId::Num(1));

        let items = backend(&server)
            .await
            .recommend_by_profile(&profile, 10)
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
    }
}
