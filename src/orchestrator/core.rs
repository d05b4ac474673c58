//! The orchestrator façade

use super::models::{Debounced, Delivery, ItemDetail, Listing, SearchResults};
use crate::cache::{CacheKey, TtlCache};
use crate::catalog::{CatalogItem, Category, Filters, ItemId, Profile};
use crate::config::{Limits, Settings};
use crate::enrich::Enricher;
use crate::metrics::Metrics;
use crate::network::FetchResult;
use crate::providers::{CatalogBackend, LocalCandidates, MetadataProvider};
use crate::request::{Debouncer, OperationKind, Outcome, RequestSlots, SlotState};
use crate::resolve::{FallbackResolver, Plan, Source};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Turns user-level operations into bounded, cached, cancellable requests
///
/// One orchestrator holds the caches and request slots of one session.
/// Provider clients and metrics may be shared between orchestrators.
pub struct Orchestrator {
    backend: Arc<dyn CatalogBackend>,
    metadata: Arc<dyn MetadataProvider>,
    local: LocalCandidates,
    cache: TtlCache<Listing>,
    slots: RequestSlots,
    resolver: FallbackResolver,
    enricher: Enricher,
    suggest_debounce: Debouncer,
    profile_debounce: Debouncer,
    metrics: Arc<Metrics>,
    limits: Limits,
    min_query_len: usize,
    short_query_max_len: usize,
}

impl Orchestrator {
    /// Create an orchestrator with default settings and private metrics
    pub fn new(backend: Arc<dyn CatalogBackend>, metadata: Arc<dyn MetadataProvider>) -> Self {
        Self::with_settings(
            backend,
            metadata,
            &Settings::default(),
            Arc::new(Metrics::new()),
        )
    }

    pub fn with_settings(
        backend: Arc<dyn CatalogBackend>,
        metadata: Arc<dyn MetadataProvider>,
        settings: &Settings,
        metrics: Arc<Metrics>,
    ) -> Self {
        let tuning = &settings.orchestrator;

        Self {
            local: LocalCandidates::from_settings(tuning),
            cache: TtlCache::new(tuning.cache_ttl()),
            slots: RequestSlots::new(),
            resolver: FallbackResolver::new(metrics.clone())
                .with_timeout(tuning.attempt_timeout()),
            enricher: Enricher::new(metadata.clone(), metrics.clone())
                .with_batch_size(tuning.enrich_batch_size)
                .with_timeout(tuning.attempt_timeout()),
            suggest_debounce: Debouncer::new(Duration::from_millis(tuning.suggest_debounce_ms)),
            profile_debounce: Debouncer::new(Duration::from_millis(tuning.profile_debounce_ms)),
            limits: settings.backend.limits.clone(),
            min_query_len: tuning.min_query_len,
            short_query_max_len: tuning.short_query_max_len,
            backend,
            metadata,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Lifecycle state of the latest request of `kind`
    pub fn slot_state(&self, kind: &OperationKind) -> SlotState {
        self.slots.state(kind)
    }

    /// Drop every in-flight request; their results will never be delivered
    pub fn cancel_all(&self) {
        self.suggest_debounce.cancel();
        self.profile_debounce.cancel();
        self.slots.cancel_all();
    }

    /// Suggestions for a partially typed query
    pub async fn suggest(&self, query: &str, filters: &Filters) -> Delivery<Listing> {
        if let Some(listing) = self.immediate_suggestions(query) {
            return Delivery::Ready(listing);
        }

        let query = query.trim();
        let limit = self.limits.suggest;
        self.fetch(
            "suggest",
            OperationKind::Suggest,
            CacheKey::query("suggest", query, filters),
            limit,
            false,
            || self.backend.search(query, filters, limit),
            || self.metadata.search(query, filters),
        )
        .await
    }

    /// Debounced [`Self::suggest`] for keystroke-driven callers
    ///
    /// Short queries are answered immediately and cancel any scheduled call.
    pub fn suggest_debounced(self: &Arc<Self>, query: &str, filters: &Filters) -> Debounced<Listing> {
        if let Some(listing) = self.immediate_suggestions(query) {
            self.suggest_debounce.cancel();
            return Debounced::Immediate(listing);
        }

        let this = Arc::clone(self);
        let query = query.to_string();
        let filters = filters.clone();
        Debounced::Scheduled(
            self.suggest_debounce
                .schedule(move || async move { this.suggest(&query, &filters).await }),
        )
    }

    /// Local answer for queries too short to send upstream
    fn immediate_suggestions(&self, query: &str) -> Option<Listing> {
        let query = query.trim();
        let len = query.chars().count();

        let items = if len < self.min_query_len {
            Vec::new()
        } else if len <= self.short_query_max_len {
            let matches = self.local.matches(query);
            if matches.is_empty() {
                return None;
            }
            matches
        } else {
            return None;
        };

        self.metrics.record_operation("suggest");
        // Anything still in flight answers an older query.
        self.slots.cancel(&OperationKind::Suggest);
        Some(Listing::local(items))
    }

    /// Full search; also starts recommendations for the first result
    pub async fn search(self: &Arc<Self>, query: &str, filters: &Filters) -> Delivery<SearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return Delivery::Ready(SearchResults {
                listing: Listing::local(Vec::new()),
                related: None,
            });
        }

        info!("Executing search '{}'", query);
        let limit = self.limits.search;
        let delivery = self
            .fetch(
                "search",
                OperationKind::Search,
                CacheKey::query("search", query, filters),
                limit,
                true,
                || self.backend.search(query, filters, limit),
                || self.metadata.search(query, filters),
            )
            .await;

        delivery.map(|listing| {
            let related = listing.items.first().map(|first| {
                let this = Arc::clone(self);
                let id = first.id.clone();
                let filters = filters.clone();
                tokio::spawn(async move {
                    this.recommend(OperationKind::SearchRecs, &id, &filters)
                        .await
                })
            });
            SearchResults { listing, related }
        })
    }

    /// Items similar to `id`
    pub async fn recommend_for(&self, id: &ItemId, filters: &Filters) -> Delivery<Listing> {
        self.recommend(OperationKind::ItemRecs, id, filters).await
    }

    async fn recommend(
        &self,
        kind: OperationKind,
        id: &ItemId,
        filters: &Filters,
    ) -> Delivery<Listing> {
        let limit = self.limits.recommend;
        self.fetch(
            "recommend",
            kind,
            CacheKey::parts("recommend", &[&id.to_string()], filters),
            limit,
            true,
            || self.backend.recommend_by_item(id, filters, limit),
            || self.metadata.similar(id, filters),
        )
        .await
    }

    /// Personalised recommendations; falls back to the trending listing
    pub async fn recommend_for_user(&self, profile: &Profile) -> Delivery<Listing> {
        let limit = self.limits.recommend;
        let filters = profile.filters();
        self.fetch(
            "recommend_user",
            OperationKind::UserRecs,
            CacheKey::profile("recommend_user", profile),
            limit,
            true,
            || self.backend.recommend_by_profile(profile, limit),
            || self.metadata.listing(&Category::Trending, 1, &filters),
        )
        .await
    }

    /// Debounced [`Self::recommend_for_user`] for profile edits
    pub fn recommend_for_user_debounced(self: &Arc<Self>, profile: Profile) -> Debounced<Listing> {
        let this = Arc::clone(self);
        Debounced::Scheduled(
            self.profile_debounce
                .schedule(move || async move { this.recommend_for_user(&profile).await }),
        )
    }

    /// One page of a category listing
    pub async fn list_by_category(
        &self,
        category: &Category,
        page: u32,
        filters: &Filters,
    ) -> Delivery<Listing> {
        let page = page.max(1);
        let limit = self.limits.listing;
        let slug = category.slug();
        let page_part = page.to_string();

        self.fetch(
            "listing",
            OperationKind::Listing(category.normalized()),
            CacheKey::parts("listing", &[&slug, &page_part], filters),
            limit,
            true,
            || self.backend.by_category(category, page, filters, limit),
            || self.metadata.listing(category, page, filters),
        )
        .await
    }

    /// Full record for one item, backend first, metadata provider second
    pub async fn item_detail(&self, id: &ItemId, filters: &Filters) -> Delivery<ItemDetail> {
        let delivery = self
            .fetch(
                "detail",
                OperationKind::Detail,
                CacheKey::parts("detail", &[&id.to_string()], filters),
                1,
                true,
                move || async move {
                    self.backend.item(id, filters).await.map(|item| vec![item])
                },
                move || async move {
                    self.metadata.details(id, filters).await.map(|item| vec![item])
                },
            )
            .await;
        delivery.map(ItemDetail::from)
    }

    /// cache -> slot -> resolver -> enrichment -> cache
    #[allow(clippy::too_many_arguments)]
    async fn fetch<PF, P, SF, S>(
        &self,
        operation: &'static str,
        kind: OperationKind,
        key: CacheKey,
        limit: usize,
        enrich: bool,
        primary: PF,
        secondary: SF,
    ) -> Delivery<Listing>
    where
        PF: FnOnce() -> P,
        P: Future<Output = FetchResult<Vec<CatalogItem>>>,
        SF: FnOnce() -> S,
        S: Future<Output = FetchResult<Vec<CatalogItem>>>,
    {
        self.metrics.record_operation(operation);

        if let Some(mut hit) = self.cache.get(key.as_str()) {
            debug!("{}: cache hit {}", operation, key);
            self.metrics.record_cache(true);
            // A cache hit is still the newest answer for this kind.
            self.slots.cancel(&kind);
            hit.cached = true;
            return Delivery::Ready(hit);
        }
        self.metrics.record_cache(false);

        let plan = Plan {
            operation,
            primary: self.backend.name(),
            secondary: self.metadata.name(),
            limit,
        };

        let outcome = self
            .slots
            .run(kind.clone(), |token| async move {
                let mut resolved = self
                    .resolver
                    .resolve(plan, &token, primary(), secondary)
                    .await;
                if enrich && !resolved.items.is_empty() {
                    let report = self.enricher.enrich(&mut resolved.items).await;
                    debug!("{}: enrichment {:?}", operation, report);
                }
                resolved
            })
            .await;

        match outcome {
            Outcome::Completed(resolved) => {
                let listing = Listing::from(resolved);
                if listing.source != Source::Exhausted {
                    self.cache.set(key, listing.clone());
                }
                Delivery::Ready(listing)
            }
            Outcome::Cancelled => {
                debug!("{}: superseded by a newer {} request", operation, kind);
                self.metrics.record_superseded();
                Delivery::Superseded
            }
        }
    }
}
