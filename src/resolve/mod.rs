//! Primary/secondary fallback resolution
//!
//! The primary attempt runs under the attempt timeout; on timeout, transport
//! failure or a non-success status the secondary attempt runs under its own,
//! equal budget. When both fail the caller gets an empty, successful result.

use crate::catalog::CatalogItem;
use crate::metrics::Metrics;
use crate::network::{FetchError, FetchResult};
use crate::request::Settle;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Where a result set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Primary,
    Secondary,
    /// Curated candidates, no network involved
    Local,
    /// Every attempt failed; the result is empty
    Exhausted,
}

/// Normalized outcome of a fallback chain
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub items: Vec<CatalogItem>,
    pub source: Source,
}

impl Resolved {
    pub fn new(items: Vec<CatalogItem>, source: Source) -> Self {
        Self { items, source }
    }

    pub fn exhausted() -> Self {
        Self::new(Vec::new(), Source::Exhausted)
    }
}

impl Settle for Resolved {
    fn failed(&self) -> bool {
        self.source == Source::Exhausted
    }
}

/// Labels and limits for one fallback chain
#[derive(Debug, Clone, Copy)]
pub struct Plan<'a> {
    /// Operation name for logs
    pub operation: &'a str,
    pub primary: &'a str,
    pub secondary: &'a str,
    /// Results beyond this are dropped
    pub limit: usize,
}

/// Runs a primary call and, if it fails, a secondary one
#[derive(Clone)]
pub struct FallbackResolver {
    timeout: Duration,
    metrics: Arc<Metrics>,
}

impl FallbackResolver {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            timeout: Duration::from_millis(crate::DEFAULT_ATTEMPT_TIMEOUT_MS),
            metrics,
        }
    }

    /// Set the per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve `primary`, falling back to `secondary()`
    ///
    /// `secondary` is only constructed when the primary attempt failed, and
    /// never once `cancel` has fired.
    pub async fn resolve<P, S, SFut>(
        &self,
        plan: Plan<'_>,
        cancel: &CancellationToken,
        primary: P,
        secondary: S,
    ) -> Resolved
    where
        P: Future<Output = FetchResult<Vec<CatalogItem>>>,
        S: FnOnce() -> SFut,
        SFut: Future<Output = FetchResult<Vec<CatalogItem>>>,
    {
        match self.attempt(plan.primary, primary).await {
            Ok(items) => return Resolved::new(truncate(items, plan.limit), Source::Primary),
            Err(e) => warn!(
                "{}: primary {} failed ({}), falling back to {}",
                plan.operation, plan.primary, e, plan.secondary
            ),
        }

        if cancel.is_cancelled() {
            debug!("{}: cancelled before fallback", plan.operation);
            return Resolved::exhausted();
        }

        self.metrics.record_fallback();
        match self.attempt(plan.secondary, secondary()).await {
            Ok(items) => Resolved::new(truncate(items, plan.limit), Source::Secondary),
            Err(e) => {
                warn!(
                    "{}: secondary {} failed ({}), returning no results",
                    plan.operation, plan.secondary, e
                );
                self.metrics.record_exhausted();
                Resolved::exhausted()
            }
        }
    }

    /// One timed attempt against one provider
    async fn attempt<F>(&self, provider: &str, call: F) -> FetchResult<Vec<CatalogItem>>
    where
        F: Future<Output = FetchResult<Vec<CatalogItem>>>,
    {
        let start = Instant::now();
        let result = match timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        };
        let elapsed = start.elapsed();

        self.metrics
            .record_response_time(provider, elapsed.as_millis() as u64);
        match &result {
            Ok(items) => {
                self.metrics.record_success(provider);
                debug!(
                    "Provider {} returned {} items in {:?}",
                    provider,
                    items.len(),
                    elapsed
                );
            }
            Err(_) => self.metrics.record_error(provider),
        }

        result
    }
}

fn truncate(mut items: Vec<CatalogItem>, limit: usize) -> Vec<CatalogItem> {
    items.truncate(limit);
    items
}
