//! Application state shared across handlers

use crate::config::{SessionSettings, Settings};
use crate::metrics::Metrics;
use crate::network::HttpClient;
use crate::orchestrator::Orchestrator;
use crate::providers::{CatalogBackend, HttpCatalogBackend, MetadataProvider, TmdbMetadata};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Per-client orchestrators
    pub sessions: SessionStore,
    /// Process-wide metrics, shared by every session
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Create state backed by the configured HTTP providers
    pub fn new(settings: Settings, client: HttpClient) -> anyhow::Result<Self> {
        let backend =
            HttpCatalogBackend::with_settings(client.clone(), &settings.backend, &settings.metadata)?;
        let metadata = TmdbMetadata::new(client, &settings.metadata)?;
        Ok(Self::with_providers(
            settings,
            Arc::new(backend),
            Arc::new(metadata),
        ))
    }

    /// Create state around existing provider clients
    pub fn with_providers(
        settings: Settings,
        backend: Arc<dyn CatalogBackend>,
        metadata: Arc<dyn MetadataProvider>,
    ) -> Self {
        let settings = Arc::new(settings);
        let metrics = Arc::new(Metrics::new());
        let sessions = SessionStore::new(
            settings.clone(),
            backend,
            metadata,
            metrics.clone(),
        );

        Self {
            settings,
            sessions,
            metrics,
        }
    }
}

/// Session id to orchestrator map with idle expiry
///
/// Each session gets its own caches and request slots; provider clients
/// are shared.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<Uuid, Arc<Orchestrator>>,
    settings: Arc<Settings>,
    backend: Arc<dyn CatalogBackend>,
    metadata: Arc<dyn MetadataProvider>,
    metrics: Arc<Metrics>,
}

impl SessionStore {
    fn new(
        settings: Arc<Settings>,
        backend: Arc<dyn CatalogBackend>,
        metadata: Arc<dyn MetadataProvider>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let SessionSettings {
            idle_timeout_secs,
            max_sessions,
        } = settings.sessions.clone();

        Self {
            sessions: Cache::builder()
                .max_capacity(max_sessions)
                .time_to_idle(Duration::from_secs(idle_timeout_secs))
                .build(),
            settings,
            backend,
            metadata,
            metrics,
        }
    }

    /// Orchestrator of `id`, created on first use
    pub async fn get_or_create(&self, id: Uuid) -> Arc<Orchestrator> {
        self.sessions
            .get_with(id, async {
                Arc::new(Orchestrator::with_settings(
                    self.backend.clone(),
                    self.metadata.clone(),
                    &self.settings,
                    self.metrics.clone(),
                ))
            })
            .await
    }

    /// Number of live sessions
    pub fn len(&self) -> u64 {
        self.sessions.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
