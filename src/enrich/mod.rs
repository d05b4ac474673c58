//! Image and title enrichment from the metadata provider
//!
//! Items without any image are looked up by identifier, at most
//! `batch_size` per call, all lookups in parallel. Successful lookups are
//! cached for the lifetime of the enricher; failures are logged and skipped.

use crate::cache::{EnrichmentCache, EnrichmentEntry};
use crate::catalog::{CatalogItem, ItemId};
use crate::metrics::Metrics;
use crate::providers::MetadataProvider;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Counters for one enrichment pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichReport {
    /// Items selected for enrichment (after the batch cap)
    pub selected: usize,
    /// Items served from the enrichment cache
    pub cached: usize,
    /// Network lookups issued
    pub lookups: usize,
    /// Items that gained at least one field
    pub enriched: usize,
}

/// Fills missing display fields from the metadata provider
pub struct Enricher {
    metadata: Arc<dyn MetadataProvider>,
    cache: EnrichmentCache,
    batch_size: usize,
    timeout: Duration,
    metrics: Arc<Metrics>,
}

impl Enricher {
    pub fn new(metadata: Arc<dyn MetadataProvider>, metrics: Arc<Metrics>) -> Self {
        Self {
            metadata,
            cache: EnrichmentCache::new(),
            batch_size: crate::DEFAULT_ENRICH_BATCH_SIZE,
            timeout: Duration::from_millis(crate::DEFAULT_ATTEMPT_TIMEOUT_MS),
            metrics,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the per-lookup timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache(&self) -> &EnrichmentCache {
        &self.cache
    }

    /// Enrich `items` in place
    pub async fn enrich(&self, items: &mut [CatalogItem]) -> EnrichReport {
        let selected: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.needs_images())
            .map(|(idx, _)| idx)
            .take(self.batch_size)
            .collect();

        let mut report = EnrichReport {
            selected: selected.len(),
            ..Default::default()
        };

        // Identifiers still to fetch, each with every position it fills.
        let mut wanted: HashMap<ItemId, Vec<usize>> = HashMap::new();
        for idx in selected {
            let id = items[idx].id.clone();
            match self.cache.get(&id).await {
                Some(entry) => {
                    report.cached += 1;
                    if apply(&mut items[idx], &entry) {
                        report.enriched += 1;
                    }
                }
                None => wanted.entry(id).or_default().push(idx),
            }
        }

        if wanted.is_empty() {
            return report;
        }

        report.lookups = wanted.len();
        let lookups = wanted.into_iter().map(|(id, positions)| async move {
            self.metrics.record_enrich_lookup();
            let result = timeout(self.timeout, self.metadata.lookup_by_id(&id)).await;
            (id, positions, result)
        });

        for (id, positions, result) in join_all(lookups).await {
            match result {
                Ok(Ok(Some(entry))) => {
                    for idx in positions {
                        if apply(&mut items[idx], &entry) {
                            report.enriched += 1;
                        }
                    }
                    self.cache.set(id, entry).await;
                }
                Ok(Ok(None)) => debug!("No metadata for {}", id),
                Ok(Err(e)) => debug!("Enrichment lookup for {} failed: {}", id, e),
                Err(_) => debug!("Enrichment lookup for {} timed out", id),
            }
        }

        report
    }
}

/// Merge `entry` into `item`, never overwriting present fields
fn apply(item: &mut CatalogItem, entry: &EnrichmentEntry) -> bool {
    let before = item.clone();

    item.images.fill_missing(&entry.images);
    if item.title.is_none() {
        item.title = entry.canonical_title.clone();
    }
    if item.tags.is_empty() {
        item.tags = entry.tags.clone();
    }

    *item != before
}
