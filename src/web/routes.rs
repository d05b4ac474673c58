//! Route definitions

use super::handlers;
use super::state::AppState;
use axum::{
    http::HeaderName,
    routing::{get, post},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(handlers::SESSION_HEADER)]);

    Router::new()
        .route("/health", get(handlers::health))
        // API routes
        .route("/api/suggest", get(handlers::suggest))
        .route("/api/search", get(handlers::search))
        .route("/api/listing/:category", get(handlers::listing))
        .route(
            "/api/recommendations/user",
            post(handlers::user_recommendations),
        )
        .route("/api/recommendations/:id", get(handlers::recommendations))
        .route("/api/items/:id", get(handlers::item_detail))
        .route("/api/stats", get(handlers::stats))
        // Add middleware
        .layer(CompressionLayer::new())
        .layer(cors)
        // Add state
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::network::HttpClient;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn app(backend: &MockServer, metadata: &MockServer) -> Router {
        let mut settings = Settings::default();
        settings.backend.base_url = backend.uri();
        settings.metadata.base_url = metadata.uri();

        let state = AppState::new(settings, HttpClient::new().unwrap()).unwrap();
        create_router(state)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let backend = MockServer::start().await;
        let metadata = MockServer::start().await;

        let response = app(&backend, &metadata)
            .await
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_search_enriches_from_metadata() {
        let backend = MockServer::start().await;
        let metadata = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("query", "intro"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "title": "Intro to X"}
            ])))
            .expect(1)
            .mount(&backend)
            .await;
        Mock::given(method("GET"))
            .and(path("/recommendations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&backend)
            .await;
        Mock::given(method("GET"))
            .and(path("/movie/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1,
                "title": "Canonical",
                "poster_path": "/one.jpg"
            })))
            .mount(&metadata)
            .await;

        let response = app(&backend, &metadata)
            .await
            .oneshot(
                Request::get("/api/search?q=intro")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(handlers::SESSION_HEADER));

        let body = body_json(response).await;
        let item = &body["results"]["items"][0];
        assert_eq!(item["title"], "Intro to X");
        assert_eq!(
            item["images"]["poster"],
            "https://image.tmdb.org/t/p/w500/one.jpg"
        );
        assert_eq!(body["results"]["source"], "primary");
        assert_eq!(body["related_for"], 1);
    }

    #[tokio::test]
    async fn test_item_detail() {
        let backend = MockServer::start().await;
        let metadata = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("query", "id:42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 42, "title": "Rust for Beginners", "poster_path": "/rust.jpg"}
            ])))
            .mount(&backend)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("query", "id:5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&backend)
            .await;
        Mock::given(method("GET"))
            .and(path("/movie/5"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&metadata)
            .await;

        let app = app(&backend, &metadata).await;
        let get = |uri: &str| Request::get(uri).body(Body::empty()).unwrap();

        let found = app.clone().oneshot(get("/api/items/42")).await.unwrap();
        assert_eq!(found.status(), StatusCode::OK);
        let body = body_json(found).await;
        assert_eq!(body["item"]["title"], "Rust for Beginners");
        assert_eq!(body["source"], "primary");

        let missing = app.clone().oneshot(get("/api/items/5")).await.unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert!(missing.headers().contains_key(handlers::SESSION_HEADER));
        assert_eq!(body_json(missing).await["source"], "exhausted");

        let invalid = app.oneshot(get("/api/items/%20")).await.unwrap();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_session_cache_is_reused() {
        let backend = MockServer::start().await;
        let metadata = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/trending"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 7, "title": "Seven", "poster_path": "/seven.jpg"}
            ])))
            .expect(1)
            .mount(&backend)
            .await;

        let app = app(&backend, &metadata).await;
        let session = uuid::Uuid::new_v4().to_string();
        let request = || {
            Request::get("/api/listing/trending")
                .header(handlers::SESSION_HEADER, session.as_str())
                .body(Body::empty())
                .unwrap()
        };

        let first = body_json(app.clone().oneshot(request()).await.unwrap()).await;
        let second = body_json(app.oneshot(request()).await.unwrap()).await;

        assert_eq!(first["cached"], false);
        assert_eq!(second["cached"], true);
        assert_eq!(second["items"][0]["id"], 7);
    }

    #[tokio::test]
    async fn test_user_recommendations_fallback() {
        let backend = MockServer::start().await;
        let metadata = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/recommendations/user"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&backend)
            .await;
        Mock::given(method("GET"))
            .and(path("/trending/movie/day"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"id": 27205, "title": "Inception", "poster_path": "/i.jpg"}]
            })))
            .mount(&metadata)
            .await;

        let response = app(&backend, &metadata)
            .await
            .oneshot(
                Request::post("/api/recommendations/user")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({"mood": "happy", "liked": [603]}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["source"], "secondary");
        assert_eq!(body["items"][0]["title"], "Inception");
    }

    #[tokio::test]
    async fn test_bad_requests() {
        let backend = MockServer::start().await;
        let metadata = MockServer::start().await;
        let app = app(&backend, &metadata).await;

        let missing_query = app
            .clone()
            .oneshot(Request::get("/api/search").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing_query.status(), StatusCode::BAD_REQUEST);

        let stats = app
            .oneshot(Request::get("/api/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(stats.status(), StatusCode::OK);
        assert_eq!(body_json(stats).await["version"], crate::VERSION);
    }
}
