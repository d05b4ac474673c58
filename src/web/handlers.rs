//! HTTP request handlers

use super::state::AppState;
use crate::catalog::{Category, Filters, ItemId, Profile};
use crate::metrics::MetricsSnapshot;
use crate::orchestrator::{Delivery, Listing, Orchestrator};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Header carrying the client's session id
pub const SESSION_HEADER: &str = "x-scout-session";

/// Query parameters shared by the catalog endpoints
#[derive(Debug, Default, Deserialize)]
pub struct CatalogParams {
    /// Query text
    pub q: Option<String>,
    /// Exclude adult content
    #[serde(default)]
    pub safe_mode: bool,
    /// Languages (comma-separated)
    pub languages: Option<String>,
    /// Page number
    pub page: Option<u32>,
}

impl CatalogParams {
    fn filters(&self) -> Filters {
        Filters::from_query(self.safe_mode, self.languages.as_deref())
    }

    fn query(&self) -> &str {
        self.q.as_deref().unwrap_or("")
    }
}

/// Search results response
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Listing,
    /// First result, whose recommendations are loading under
    /// `/api/recommendations/{id}`
    pub related_for: Option<ItemId>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub version: &'static str,
    pub sessions: u64,
    #[serde(flatten)]
    pub metrics: MetricsSnapshot,
}

/// Resolve the caller's session, issuing a new id when none is supplied
async fn session(state: &AppState, headers: &HeaderMap) -> (Uuid, Arc<Orchestrator>) {
    let id = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .unwrap_or_else(Uuid::new_v4);

    (id, state.sessions.get_or_create(id).await)
}

/// Turn a delivery into a response; superseded operations answer 204
fn deliver<T: Serialize>(session: Uuid, delivery: Delivery<T>) -> Response {
    let mut response = match delivery {
        Delivery::Ready(body) => Json(body).into_response(),
        Delivery::Superseded => StatusCode::NO_CONTENT.into_response(),
    };

    if let Ok(value) = HeaderValue::from_str(&session.to_string()) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}

/// Suggestions handler
pub async fn suggest(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CatalogParams>,
) -> Response {
    let (id, orchestrator) = session(&state, &headers).await;
    let delivery = orchestrator
        .suggest(params.query(), &params.filters())
        .await;
    deliver(id, delivery)
}

/// Search handler
pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CatalogParams>,
) -> Response {
    let query = params.query().trim().to_string();
    if query.is_empty() {
        return bad_request("missing query");
    }

    let (id, orchestrator) = session(&state, &headers).await;
    let results = match orchestrator.search(&query, &params.filters()).await {
        Delivery::Ready(results) => results,
        Delivery::Superseded => return deliver::<SearchResponse>(id, Delivery::Superseded),
    };

    // The related task keeps running detached and fills the session cache.
    let related_for = results
        .related
        .and(results.listing.items.first())
        .map(|item| item.id.clone());

    deliver(
        id,
        Delivery::Ready(SearchResponse {
            query,
            related_for,
            results: results.listing,
        }),
    )
}

/// Category listing handler
pub async fn listing(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(category): Path<String>,
    Query(params): Query<CatalogParams>,
) -> Response {
    if category.trim().is_empty() {
        return bad_request("missing category");
    }

    let (id, orchestrator) = session(&state, &headers).await;
    let delivery = orchestrator
        .list_by_category(
            &Category::parse(&category),
            params.page.unwrap_or(1),
            &params.filters(),
        )
        .await;
    deliver(id, delivery)
}

/// Item recommendations handler
pub async fn recommendations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(item): Path<String>,
    Query(params): Query<CatalogParams>,
) -> Response {
    let Some(item) = ItemId::parse(&item) else {
        return bad_request("invalid item id");
    };

    let (id, orchestrator) = session(&state, &headers).await;
    let delivery = orchestrator.recommend_for(&item, &params.filters()).await;
    deliver(id, delivery)
}

/// Item detail handler; 404 when no provider knows the item
pub async fn item_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(item): Path<String>,
    Query(params): Query<CatalogParams>,
) -> Response {
    let Some(item) = ItemId::parse(&item) else {
        return bad_request("invalid item id");
    };

    let (id, orchestrator) = session(&state, &headers).await;
    let delivery = orchestrator.item_detail(&item, &params.filters()).await;
    let missing = matches!(&delivery, Delivery::Ready(detail) if detail.item.is_none());

    let mut response = deliver(id, delivery);
    if missing {
        *response.status_mut() = StatusCode::NOT_FOUND;
    }
    response
}

/// Personalised recommendations handler
pub async fn user_recommendations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(profile): Json<Profile>,
) -> Response {
    let (id, orchestrator) = session(&state, &headers).await;
    let delivery = orchestrator.recommend_for_user(&profile).await;
    deliver(id, delivery)
}

/// Metrics handler
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatsResponse {
        version: crate::VERSION,
        sessions: state.sessions.len(),
        metrics: state.metrics.snapshot(),
    })
}
