//! Settings structures for catalog-scout configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Main settings structure matching `scout.yml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    pub metadata: MetadataSettings,
    pub outgoing: OutgoingSettings,
    pub orchestrator: OrchestratorSettings,
    pub sessions: SessionSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Merge with environment variables (SCOUT_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any variable source
    pub fn merge_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = var("SCOUT_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("SCOUT_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(val) = var("SCOUT_BACKEND_URL") {
            self.backend.base_url = val;
        }
        if let Some(val) = var("SCOUT_METADATA_URL") {
            self.metadata.base_url = val;
        }
        if let Some(val) = var("SCOUT_METADATA_API_KEY") {
            self.metadata.api_key = Some(val);
        }
        if let Some(val) = var("SCOUT_IMAGE_BASE_URL") {
            self.metadata.image_base_url = val;
        }
        if let Some(val) = var("SCOUT_CACHE_TTL_MS") {
            if let Ok(ttl) = val.parse() {
                self.orchestrator.cache_ttl_ms = ttl;
            }
        }
        if let Some(val) = var("SCOUT_ATTEMPT_TIMEOUT_MS") {
            if let Ok(timeout) = val.parse() {
                self.orchestrator.attempt_timeout_ms = timeout;
            }
        }
        if let Some(val) = var("SCOUT_ENRICH_BATCH_SIZE") {
            if let Ok(size) = val.parse() {
                self.orchestrator.enrich_batch_size = size;
            }
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8890,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Recommendation backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Base URL of the recommendation backend
    pub base_url: String,
    /// Query parameter naming the item for item-based recommendations
    pub item_param: String,
    /// Result limits per operation
    pub limits: Limits,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "https://course-review-recommendation-engine.onrender.com".to_string(),
            item_param: "course_id".to_string(),
            limits: Limits::default(),
        }
    }
}

/// Result limits per operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub suggest: usize,
    pub search: usize,
    pub recommend: usize,
    pub listing: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            suggest: 6,
            search: 12,
            recommend: 10,
            listing: 12,
        }
    }
}

/// Secondary metadata provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataSettings {
    /// Base URL of the metadata API
    pub base_url: String,
    /// API key if required
    pub api_key: Option<String>,
    /// Base URL for relative image paths
    pub image_base_url: String,
    /// Size segment used for posters
    pub poster_size: String,
    /// Region used when the request carries none
    pub default_region: String,
    /// Display language used when the request carries none
    pub default_language: String,
    /// Prefix joined to a trailer's video key
    pub trailer_base_url: String,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.themoviedb.org/3".to_string(),
            api_key: None,
            image_base_url: "https://image.tmdb.org/t/p".to_string(),
            poster_size: "w500".to_string(),
            default_region: "US".to_string(),
            default_language: "en-US".to_string(),
            trailer_base_url: "https://www.youtube.com/watch?v=".to_string(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Client-level request timeout in seconds
    pub request_timeout: f64,
    /// Pool max size
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 20.0,
            pool_maxsize: 12,
            verify_ssl: true,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Orchestration tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// Budget for each of the primary and secondary attempts
    pub attempt_timeout_ms: u64,
    /// Maximum age of a cached listing
    pub cache_ttl_ms: u64,
    /// Maximum number of items enriched per batch
    pub enrich_batch_size: usize,
    /// Quiet period before a suggestion request fires
    pub suggest_debounce_ms: u64,
    /// Quiet period before a personalised refresh fires
    pub profile_debounce_ms: u64,
    /// Queries shorter than this never reach the network
    pub min_query_len: usize,
    /// Queries up to this length consult the local candidates first
    pub short_query_max_len: usize,
    /// Maximum number of local candidates returned
    pub local_candidate_limit: usize,
    /// Curated candidates for instant feedback
    pub local_candidates: Vec<LocalCandidate>,
}

impl OrchestratorSettings {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            attempt_timeout_ms: crate::DEFAULT_ATTEMPT_TIMEOUT_MS,
            cache_ttl_ms: crate::DEFAULT_CACHE_TTL_MS,
            enrich_batch_size: crate::DEFAULT_ENRICH_BATCH_SIZE,
            suggest_debounce_ms: 150,
            profile_debounce_ms: 400,
            min_query_len: 2,
            short_query_max_len: 3,
            local_candidate_limit: 4,
            local_candidates: default_candidates(),
        }
    }
}

/// A curated suggestion served without a network call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalCandidate {
    pub id: i64,
    pub title: String,
}

/// Web session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Seconds of inactivity before a session is dropped
    pub idle_timeout_secs: u64,
    /// Maximum number of live sessions
    pub max_sessions: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 1800,
            max_sessions: 10_000,
        }
    }
}

fn default_candidates() -> Vec<LocalCandidate> {
    [
        (155, "The Dark Knight"),
        (27205, "Inception"),
        (157336, "Interstellar"),
        (603, "The Matrix"),
        (680, "Pulp Fiction"),
        (238, "The Godfather"),
        (19995, "Avatar"),
        (597, "Titanic"),
        (11, "Star Wars"),
        (24428, "The Avengers"),
    ]
    .iter()
    .map(|(id, title)| LocalCandidate {
        id: *id,
        title: title.to_string(),
    })
    .collect()
}
