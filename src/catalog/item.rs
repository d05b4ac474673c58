//! Catalog item definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider-scoped item identifier
///
/// Providers hand out either numeric or opaque string identifiers; both are
/// unique within the provider that issued them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Num(i64),
    Text(String),
}

impl ItemId {
    /// Parse an identifier from a path segment or query parameter
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(match raw.parse::<i64>() {
            Ok(n) => Self::Num(n),
            Err(_) => Self::Text(raw.to_string()),
        })
    }

    /// Numeric view of the identifier, if it has one
    pub fn as_num(&self) -> Option<i64> {
        match self {
            Self::Num(n) => Some(*n),
            Self::Text(s) => s.parse().ok(),
        }
    }

    /// Read an identifier out of a JSON value (number or non-empty string)
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_i64().map(Self::Num),
            serde_json::Value::String(s) => Self::parse(s),
            _ => None,
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ItemId {
    fn from(n: i64) -> Self {
        Self::Num(n)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self::parse(s).unwrap_or_else(|| Self::Text(String::new()))
    }
}

/// Display-critical image references
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRefs {
    /// Portrait poster / card image
    pub poster: Option<String>,
    /// Wide backdrop / hero image
    pub backdrop: Option<String>,
    /// Small thumbnail
    pub thumbnail: Option<String>,
}

impl ImageRefs {
    /// True when no image field is populated
    pub fn is_empty(&self) -> bool {
        self.poster.is_none() && self.backdrop.is_none() && self.thumbnail.is_none()
    }

    /// Fill absent fields from `other`, never overwriting present ones
    pub fn fill_missing(&mut self, other: &ImageRefs) {
        if self.poster.is_none() {
            self.poster = other.poster.clone();
        }
        if self.backdrop.is_none() {
            self.backdrop = other.backdrop.clone();
        }
        if self.thumbnail.is_none() {
            self.thumbnail = other.thumbnail.clone();
        }
    }

    /// Best image to show on a card: poster, then backdrop, then thumbnail
    pub fn primary(&self) -> Option<&str> {
        self.poster
            .as_deref()
            .or(self.backdrop.as_deref())
            .or(self.thumbnail.as_deref())
    }
}

/// A single catalog entry (course or movie)
///
/// Every field except the identifier is optional: providers populate
/// different subsets and absence is not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub title: Option<String>,
    /// Rating on a 0-10 scale
    pub rating: Option<f32>,
    /// Subscriber / vote count
    pub popularity: Option<u64>,
    #[serde(default)]
    pub images: ImageRefs,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub price: Option<String>,
    pub is_paid: Option<bool>,
    pub language: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    /// Trailer video URL, only filled in by detail lookups
    pub trailer: Option<String>,
    #[serde(default)]
    pub adult: bool,
}

impl CatalogItem {
    /// Create an item carrying only its identifier
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            title: None,
            rating: None,
            popularity: None,
            images: ImageRefs::default(),
            category: None,
            tags: Vec::new(),
            price: None,
            is_paid: None,
            language: None,
            overview: None,
            release_date: None,
            trailer: None,
            adult: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_poster(mut self, poster: impl Into<String>) -> Self {
        self.images.poster = Some(poster.into());
        self
    }

    /// True when the item has nothing to render as an image
    pub fn needs_images(&self) -> bool {
        self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_parse() {
        assert_eq!(ItemId::parse("42"), Some(ItemId::Num(42)));
        assert_eq!(
            ItemId::parse(" abc "),
            Some(ItemId::Text("abc".to_string()))
        );
        assert_eq!(ItemId::parse("  "), None);
    }

    #[test]
    fn test_item_id_serde_untagged() {
        let num: ItemId = serde_json::from_str("7").unwrap();
        let text: ItemId = serde_json::from_str("\"tt01\"").unwrap();
        assert_eq!(num, ItemId::Num(7));
        assert_eq!(text, ItemId::Text("tt01".to_string()));
        assert_eq!(serde_json::to_string(&num).unwrap(), "7");
    }

    #[test]
    fn test_fill_missing_keeps_existing() {
        let mut images = ImageRefs {
            poster: Some("a.jpg".to_string()),
            ..Default::default()
        };
        images.fill_missing(&ImageRefs {
            poster: Some("b.jpg".to_string()),
            backdrop: Some("c.jpg".to_string()),
            thumbnail: None,
        });

        assert_eq!(images.poster.as_deref(), Some("a.jpg"));
        assert_eq!(images.backdrop.as_deref(), Some("c.jpg"));
        assert_eq!(images.primary(), Some("a.jpg"));
    }

    #[test]
    fn test_needs_images() {
        let item = CatalogItem::new(1i64).with_title("Intro");
        assert!(item.needs_images());
        assert!(!item.with_poster("p.jpg").needs_images());
    }
}
