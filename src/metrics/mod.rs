//! Metrics collection module
//!
//! Tracks operation counts, cache effectiveness, supersession, fallback
//! usage and per-provider latency and reliability.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Number of latency samples kept per provider
const LATENCY_WINDOW: usize = 100;

/// Metrics collector shared by every orchestrator in the process
pub struct Metrics {
    operations: RwLock<HashMap<String, u64>>,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    superseded: AtomicU64,
    fallbacks: AtomicU64,
    exhausted: AtomicU64,
    enrich_lookups: AtomicU64,
    /// Provider response times (rolling window in ms)
    provider_response_times: RwLock<HashMap<String, Vec<u64>>>,
    provider_errors: RwLock<HashMap<String, u64>>,
    provider_successes: RwLock<HashMap<String, u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            operations: RwLock::new(HashMap::new()),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            superseded: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
            exhausted: AtomicU64::new(0),
            enrich_lookups: AtomicU64::new(0),
            provider_response_times: RwLock::new(HashMap::new()),
            provider_errors: RwLock::new(HashMap::new()),
            provider_successes: RwLock::new(HashMap::new()),
        }
    }

    /// Count one orchestrator operation (`search`, `suggest`, ...)
    pub fn record_operation(&self, operation: &str) {
        bump(&self.operations, operation);
    }

    pub fn record_cache(&self, hit: bool) {
        let counter = if hit {
            &self.cache_hits
        } else {
            &self.cache_misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// A request whose result was discarded because a newer one replaced it
    pub fn record_superseded(&self) {
        self.superseded.fetch_add(1, Ordering::Relaxed);
    }

    /// The secondary provider was consulted
    pub fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Both providers failed
    pub fn record_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_enrich_lookup(&self) {
        self.enrich_lookups.fetch_add(1, Ordering::Relaxed);
    }

    /// Record provider response time
    pub fn record_response_time(&self, provider: &str, time_ms: u64) {
        if let Ok(mut times) = self.provider_response_times.write() {
            let entry = times.entry(provider.to_string()).or_default();
            if entry.len() >= LATENCY_WINDOW {
                entry.remove(0);
            }
            entry.push(time_ms);
        }
    }

    pub fn record_error(&self, provider: &str) {
        bump(&self.provider_errors, provider);
    }

    pub fn record_success(&self, provider: &str) {
        bump(&self.provider_successes, provider);
    }

    /// Average response time for a provider
    pub fn avg_response_time(&self, provider: &str) -> Option<u64> {
        let times = self.provider_response_times.read().ok()?;
        times
            .get(provider)
            .filter(|t| !t.is_empty())
            .map(|t| t.iter().sum::<u64>() / t.len() as u64)
    }

    /// Reliability percentage for a provider
    pub fn reliability(&self, provider: &str) -> f64 {
        let errors = count(&self.provider_errors, provider);
        let successes = count(&self.provider_successes, provider);

        let total = errors + successes;
        if total == 0 {
            100.0
        } else {
            (successes as f64 / total as f64) * 100.0
        }
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut names: Vec<String> = Vec::new();
        for map in [&self.provider_errors, &self.provider_successes] {
            if let Ok(map) = map.read() {
                names.extend(map.keys().cloned());
            }
        }
        names.sort();
        names.dedup();

        let providers = names
            .into_iter()
            .map(|name| {
                let stats = ProviderStats {
                    attempts: count(&self.provider_errors, &name)
                        + count(&self.provider_successes, &name),
                    errors: count(&self.provider_errors, &name),
                    avg_response_ms: self.avg_response_time(&name),
                    reliability: self.reliability(&name),
                };
                (name, stats)
            })
            .collect();

        MetricsSnapshot {
            operations: self
                .operations
                .read()
                .map(|ops| ops.iter().map(|(k, v)| (k.clone(), *v)).collect())
                .unwrap_or_default(),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            superseded: self.superseded.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            enrich_lookups: self.enrich_lookups.load(Ordering::Relaxed),
            providers,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn bump(map: &RwLock<HashMap<String, u64>>, key: &str) {
    if let Ok(mut map) = map.write() {
        *map.entry(key.to_string()).or_insert(0) += 1;
    }
}

fn count(map: &RwLock<HashMap<String, u64>>, key: &str) -> u64 {
    map.read()
        .ok()
        .and_then(|m| m.get(key).copied())
        .unwrap_or(0)
}

/// Serializable view of [`Metrics`]
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub operations: BTreeMap<String, u64>,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub superseded: u64,
    pub fallbacks: u64,
    pub exhausted: u64,
    pub enrich_lookups: u64,
    pub providers: BTreeMap<String, ProviderStats>,
}

/// Statistics for a single provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStats {
    pub attempts: u64,
    pub errors: u64,
    pub avg_response_ms: Option<u64>,
    pub reliability: f64,
}
