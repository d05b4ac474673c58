//! Request filters, user profile and listing categories

use super::item::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Filters applied uniformly to every catalog request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    /// Exclude adult / unsafe content
    pub safe_mode: bool,
    /// Language codes; empty means no language restriction
    pub languages: Vec<String>,
}

impl Filters {
    pub fn new(safe_mode: bool, languages: Vec<String>) -> Self {
        Self {
            safe_mode,
            languages,
        }
    }

    /// Parse a comma-separated language list (as sent by the front-end)
    pub fn from_query(safe_mode: bool, languages: Option<&str>) -> Self {
        let languages = languages
            .map(|l| {
                l.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Self::new(safe_mode, languages)
    }

    /// Lowercased, sorted, de-duplicated language codes
    pub fn normalized_languages(&self) -> Vec<String> {
        self.languages
            .iter()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Whether a language restriction is active
    pub fn restricts_language(&self) -> bool {
        !self.normalized_languages().is_empty()
    }
}

/// User profile fields that drive personalised recommendations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub mood: Option<String>,
    pub languages: Vec<String>,
    pub safe_mode: bool,
    pub liked: BTreeSet<ItemId>,
    pub disliked: BTreeSet<ItemId>,
    pub watchlist: Vec<ItemId>,
    pub skill_level: Option<String>,
    pub budget: Option<String>,
}

impl Profile {
    /// Filters implied by the profile
    pub fn filters(&self) -> Filters {
        Filters::new(self.safe_mode, self.languages.clone())
    }
}

/// Listing category for `list_by_category`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Trending,
    TopRated,
    Genre(String),
}

impl Category {
    /// Parse a category path segment (`trending`, `top-rated`, anything else is a genre)
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.to_lowercase().replace('_', "-").as_str() {
            "trending" => Self::Trending,
            "top-rated" | "toprated" => Self::TopRated,
            _ => Self::Genre(raw.to_string()),
        }
    }

    /// Canonical form: genre names are trimmed and lowercased
    pub fn normalized(&self) -> Self {
        match self {
            Self::Genre(name) => Self::Genre(name.trim().to_lowercase()),
            other => other.clone(),
        }
    }

    /// Stable slug used in cache keys and URLs
    pub fn slug(&self) -> String {
        match self {
            Self::Trending => "trending".to_string(),
            Self::TopRated => "top-rated".to_string(),
            Self::Genre(name) => format!("genre:{}", name.trim().to_lowercase()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_from_query() {
        let filters = Filters::from_query(true, Some("en, hi,,"));
        assert!(filters.safe_mode);
        assert_eq!(filters.languages, vec!["en", "hi"]);

        let empty = Filters::from_query(false, None);
        assert!(!empty.restricts_language());
    }

    #[test]
    fn test_normalized_languages() {
        let filters = Filters::new(false, vec!["HI".into(), "en".into(), "hi".into()]);
        assert_eq!(filters.normalized_languages(), vec!["en", "hi"]);
    }

    #[test]
    fn test_category_normalized() {
        assert_eq!(
            Category::Genre(" Comedy ".into()).normalized(),
            Category::Genre("comedy".into())
        );
        assert_eq!(Category::TopRated.normalized(), Category::TopRated);
        assert_eq!(
            Category::Genre("Comedy".into()).normalized().slug(),
            Category::Genre("comedy".into()).slug()
        );
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(Category::parse("trending"), Category::Trending);
        assert_eq!(Category::parse("top_rated"), Category::TopRated);
        assert_eq!(
            Category::parse("Comedy"),
            Category::Genre("Comedy".to_string())
        );
        assert_eq!(Category::parse("Comedy").slug(), "genre:comedy");
    }
}
