//! Curated in-memory suggestions

use crate::catalog::CatalogItem;
use crate::config::{LocalCandidate, OrchestratorSettings};

/// Fixed candidate list matched without touching the network
#[derive(Debug, Clone)]
pub struct LocalCandidates {
    candidates: Vec<LocalCandidate>,
    limit: usize,
}

impl LocalCandidates {
    pub fn new(candidates: Vec<LocalCandidate>, limit: usize) -> Self {
        Self { candidates, limit }
    }

    pub fn from_settings(settings: &OrchestratorSettings) -> Self {
        Self::new(
            settings.local_candidates.clone(),
            settings.local_candidate_limit,
        )
    }

    /// Case-insensitive substring matches, in list order, capped at the limit
    pub fn matches(&self, query: &str) -> Vec<CatalogItem> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.candidates
            .iter()
            .filter(|c| c.title.to_lowercase().contains(&needle))
            .take(self.limit)
            .map(|c| CatalogItem::new(c.id).with_title(c.title.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl Default for LocalCandidates {
    fn default() -> Self {
        Self::from_settings(&OrchestratorSettings::default())
    }
}
