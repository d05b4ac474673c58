//! Cache key derivation

use crate::catalog::{Filters, Profile};
use sha2::{Digest, Sha256};
use std::fmt;

/// Field separator fed to the hasher so adjacent parts cannot run together
const SEP: &[u8] = &[0x1f];

/// Deterministic key for one logical request
///
/// Built from the operation kind, the normalized query text and the sorted
/// filter values; filter order never affects the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for a text query (suggest, search)
    pub fn query(kind: &str, query: &str, filters: &Filters) -> Self {
        Self::build(kind, &[&normalize_query(query)], filters)
    }

    /// Key for a request with structured parts (item id, category + page, ...)
    pub fn parts(kind: &str, parts: &[&str], filters: &Filters) -> Self {
        Self::build(kind, parts, filters)
    }

    /// Key for a personalised request
    pub fn profile(kind: &str, profile: &Profile) -> Self {
        Self(format!("{}:{}", kind, profile_fingerprint(profile)))
    }

    fn build(kind: &str, parts: &[&str], filters: &Filters) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.as_bytes());
            hasher.update(SEP);
        }
        hasher.update(if filters.safe_mode { b"safe" } else { b"open" });
        for lang in filters.normalized_languages() {
            hasher.update(SEP);
            hasher.update(lang.as_bytes());
        }

        Self(format!("{}:{:x}", kind, hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

/// Hash of the profile fields that influence personalised results
///
/// Covers mood, languages, liked/disliked sets, skill level, budget and safe
/// mode. Set-like fields are hashed in sorted order.
pub fn profile_fingerprint(profile: &Profile) -> String {
    let mut hasher = Sha256::new();

    hasher.update(profile.mood.as_deref().unwrap_or("").trim().to_lowercase());
    hasher.update(SEP);
    for lang in profile.filters().normalized_languages() {
        hasher.update(lang.as_bytes());
        hasher.update(b",");
    }
    hasher.update(SEP);
    for id in &profile.liked {
        hasher.update(id.to_string());
        hasher.update(b",");
    }
    hasher.update(SEP);
    for id in &profile.disliked {
        hasher.update(id.to_string());
        hasher.update(b",");
    }
    hasher.update(SEP);
    hasher.update(profile.skill_level.as_deref().unwrap_or(""));
    hasher.update(SEP);
    hasher.update(profile.budget.as_deref().unwrap_or(""));
    hasher.update(SEP);
    hasher.update(if profile.safe_mode { b"safe" } else { b"open" });

    format!("{:x}", hasher.finalize())
}

/// Trim, collapse inner whitespace and lowercase a query
pub(crate) fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemId;

    #[test]
    fn test_filter_order_does_not_matter() {
        let a = Filters::new(true, vec!["en".into(), "hi".into()]);
        let b = Filters::new(true, vec!["hi".into(), "EN".into()]);

        assert_eq!(
            CacheKey::query("search", "intro", &a),
            CacheKey::query("search", "intro", &b)
        );
    }

    #[test]
    fn test_query_is_normalized() {
        let filters = Filters::default();
        assert_eq!(
            CacheKey::query("search", "  Intro   to Rust ", &filters),
            CacheKey::query("search", "intro to rust", &filters)
        );
    }

    #[test]
    fn test_distinct_inputs_give_distinct_keys() {
        let filters = Filters::default();
        let safe = Filters::new(true, vec![]);

        let base = CacheKey::query("search", "intro", &filters);
        assert_ne!(base, CacheKey::query("suggest", "intro", &filters));
        assert_ne!(base, CacheKey::query("search", "intro", &safe));
        assert_ne!(base, CacheKey::query("search", "intros", &filters));
        assert_ne!(
            CacheKey::parts("listing", &["ab", "c"], &filters),
            CacheKey::parts("listing", &["a", "bc"], &filters)
        );
        assert!(base.as_str().starts_with("search:"));
    }

    #[test]
    fn test_profile_fingerprint_ignores_set_order() {
        let mut a = Profile {
            mood: Some("happy".into()),
            languages: vec!["hi".into(), "en".into()],
            ..Default::default()
        };
        a.liked.insert(ItemId::Num(2));
        a.liked.insert(ItemId::Num(1));

        let mut b = Profile {
            mood: Some("Happy".into()),
            languages: vec!["en".into(), "hi".into()],
            ..Default::default()
        };
        b.liked.insert(ItemId::Num(1));
        b.liked.insert(ItemId::Num(2));

        assert_eq!(profile_fingerprint(&a), profile_fingerprint(&b));

        b.disliked.insert(ItemId::Num(9));
        assert_ne!(profile_fingerprint(&a), profile_fingerprint(&b));
    }
}
