//! Per-provider normalization into [`CatalogItem`]
//!
//! Each provider gets one explicit mapping with a documented field
//! precedence, so render-time code never has to guess between
//! `poster_path`, `image_480x270` and friends.
//!
//! Recommendation backend precedence (first present wins):
//!
//! | field        | sources                                                    |
//! |--------------|------------------------------------------------------------|
//! | title        | `title`, `name`, `original_title`                          |
//! | rating       | `vote_average` (0-10), `avg_rating` x2, `rating` x2        |
//! | popularity   | `num_subscribers`, `vote_count`, `num_reviews`             |
//! | poster       | `image_480x270`, `poster_url`, `poster_path`, `image_url`, `image` |
//! | backdrop     | `image_750x422`, `backdrop_path`                           |
//! | thumbnail    | `thumbnail`                                                |
//! | category     | `primary_category.name`, `category`, `genre`               |
//! | language     | `language`, `original_language`, `locale.locale`           |
//! | overview     | `headline`, `overview`, `description`                      |
//! | release date | `release_date`, `published_time`                           |
//!
//! Metadata provider: `title`/`name`, `vote_average`, `vote_count`,
//! `poster_path`, `backdrop_path`, `genre_ids` or `genres[].name`,
//! `original_language`, `overview`, `release_date`, `adult`.

use super::item::{CatalogItem, ImageRefs, ItemId};
use serde_json::Value;

/// Genre table of the metadata provider (id, display name)
pub const GENRES: &[(i64, &str)] = &[
    (28, "Action"),
    (12, "Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (14, "Fantasy"),
    (36, "History"),
    (27, "Horror"),
    (10402, "Music"),
    (9648, "Mystery"),
    (10749, "Romance"),
    (878, "Science Fiction"),
    (10770, "TV Movie"),
    (53, "Thriller"),
    (10752, "War"),
    (37, "Western"),
];

/// Look up a genre id by (case-insensitive) name
pub fn genre_id(name: &str) -> Option<i64> {
    let name = name.trim();
    GENRES
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(name))
        .map(|(id, _)| *id)
}

/// Look up a genre name by id
pub fn genre_name(id: i64) -> Option<&'static str> {
    GENRES.iter().find(|(g, _)| *g == id).map(|(_, n)| *n)
}

/// Resolves raw image references into absolute URLs
#[derive(Debug, Clone)]
pub struct ImageResolver {
    base_url: String,
    poster_size: String,
    backdrop_size: String,
}

impl ImageResolver {
    pub fn new(base_url: impl Into<String>, poster_size: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            poster_size: poster_size.into(),
            backdrop_size: "w780".to_string(),
        }
    }

    pub fn poster(&self, raw: &str) -> Option<String> {
        self.resolve(raw, &self.poster_size)
    }

    pub fn backdrop(&self, raw: &str) -> Option<String> {
        self.resolve(raw, &self.backdrop_size)
    }

    /// Sanitize one raw reference; placeholders such as `null` or `nan` are absent
    fn resolve(&self, raw: &str, size: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty()
            || ["null", "none", "undefined", "nan"]
                .iter()
                .any(|p| raw.eq_ignore_ascii_case(p))
        {
            return None;
        }

        if raw.starts_with("data:image") || raw.starts_with("http") {
            Some(raw.to_string())
        } else if let Some(rest) = raw.strip_prefix("//") {
            Some(format!("https://{}", rest))
        } else if raw.starts_with('/') {
            Some(format!("{}/{}{}", self.base_url, size, raw))
        } else {
            Some(raw.to_string())
        }
    }
}

impl Default for ImageResolver {
    fn default() -> Self {
        Self::new("https://image.tmdb.org/t/p", "w500")
    }
}

/// Extract the item list from a backend payload (bare array or `{ "results": [...] }`)
pub fn backend_payload(payload: &Value, images: &ImageResolver) -> Vec<CatalogItem> {
    result_array(payload)
        .iter()
        .filter_map(|v| backend_item(v, images))
        .collect()
}

/// Extract the item list from a metadata-provider listing payload
pub fn metadata_payload(payload: &Value, images: &ImageResolver) -> Vec<CatalogItem> {
    result_array(payload)
        .iter()
        .filter_map(|v| metadata_item(v, images))
        .collect()
}

fn result_array(payload: &Value) -> &[Value] {
    payload
        .as_array()
        .or_else(|| payload.get("results").and_then(|r| r.as_array()))
        .map(|a| a.as_slice())
        .unwrap_or_default()
}

/// Normalize one recommendation-backend record
pub fn backend_item(value: &Value, images: &ImageResolver) -> Option<CatalogItem> {
    let id = value.get("id").and_then(ItemId::from_json)?;
    let mut item = CatalogItem::new(id);

    item.title = first_str(value, &["/title", "/name", "/original_title"]);
    item.rating = first_f32(value, &["/vote_average"])
        .or_else(|| first_f32(value, &["/avg_rating", "/rating"]).map(|r| r * 2.0))
        .map(|r| r.clamp(0.0, 10.0));
    item.popularity = first_u64(value, &["/num_subscribers", "/vote_count", "/num_reviews"]);

    item.images = ImageRefs {
        poster: first_image(
            value,
            &[
                "/image_480x270",
                "/poster_url",
                "/poster_path",
                "/image_url",
                "/image",
            ],
            |raw| images.poster(raw),
        ),
        backdrop: first_image(value, &["/image_750x422", "/backdrop_path"], |raw| {
            images.backdrop(raw)
        }),
        thumbnail: first_image(value, &["/thumbnail"], |raw| images.poster(raw)),
    };

    item.category = first_str(value, &["/primary_category/name", "/category", "/genre"]);
    item.tags = tag_list(value);
    item.price = value.get("price").and_then(|p| match p {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });
    item.is_paid = value.get("is_paid").and_then(|p| p.as_bool());
    item.language = first_str(value, &["/language", "/original_language", "/locale/locale"]);
    item.overview = first_str(value, &["/headline", "/overview", "/description"]);
    item.release_date = first_str(value, &["/release_date", "/published_time"]);
    item.adult = value.get("adult").and_then(|a| a.as_bool()).unwrap_or(false);

    Some(item)
}

/// Normalize one metadata-provider record
pub fn metadata_item(value: &Value, images: &ImageResolver) -> Option<CatalogItem> {
    let id = value.get("id").and_then(ItemId::from_json)?;
    let mut item = CatalogItem::new(id);

    item.title = first_str(value, &["/title", "/name"]);
    item.rating = first_f32(value, &["/vote_average"]).map(|r| r.clamp(0.0, 10.0));
    item.popularity = first_u64(value, &["/vote_count"]);
    item.images = ImageRefs {
        poster: first_image(value, &["/poster_path"], |raw| images.poster(raw)),
        backdrop: first_image(value, &["/backdrop_path"], |raw| images.backdrop(raw)),
        thumbnail: None,
    };

    item.tags = match value.get("genre_ids").and_then(|g| g.as_array()) {
        Some(ids) => ids
            .iter()
            .filter_map(|id| id.as_i64().and_then(genre_name))
            .map(String::from)
            .collect(),
        None => tag_list(value),
    };
    item.category = item.tags.first().cloned();
    item.language = first_str(value, &["/original_language"]);
    item.overview = first_str(value, &["/overview"]);
    item.release_date = first_str(value, &["/release_date", "/first_air_date"]);
    item.adult = value.get("adult").and_then(|a| a.as_bool()).unwrap_or(false);

    Some(item)
}

fn tag_list(value: &Value) -> Vec<String> {
    let mut tags: Vec<String> = value
        .get("genres")
        .and_then(|g| g.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|g| match g {
                    Value::String(s) => Some(s.clone()),
                    other => other.get("name").and_then(|n| n.as_str()).map(String::from),
                })
                .collect()
        })
        .unwrap_or_default();

    if let Some(topic) = first_str(value, &["/topic/name"]) {
        tags.push(topic);
    }

    tags.retain(|t| !t.trim().is_empty());
    tags
}

fn first_str(value: &Value, pointers: &[&str]) -> Option<String> {
    pointers
        .iter()
        .filter_map(|p| value.pointer(p))
        .filter_map(|v| v.as_str())
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(String::from)
}

/// First reference that survives sanitizing; placeholders fall through to the next field
fn first_image<F>(value: &Value, pointers: &[&str], resolve: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    pointers
        .iter()
        .filter_map(|p| value.pointer(p))
        .filter_map(|v| v.as_str())
        .find_map(resolve)
}

fn first_f32(value: &Value, pointers: &[&str]) -> Option<f32> {
    pointers
        .iter()
        .filter_map(|p| value.pointer(p))
        .filter_map(|v| v.as_f64())
        .find(|n| n.is_finite() && *n > 0.0)
        .map(|n| n as f32)
}

fn first_u64(value: &Value, pointers: &[&str]) -> Option<u64> {
    pointers
        .iter()
        .filter_map(|p| value.pointer(p))
        .find_map(|v| v.as_u64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backend_course_record() {
        let images = ImageResolver::default();
        let value = json!({
            "id": 101,
            "title": "Intro to Rust",
            "avg_rating": 4.5,
            "num_subscribers": 1200,
            "image_480x270": "//img.example.com/101.jpg",
            "primary_category": {"name": "Development"},
            "topic": {"name": "Rust"},
            "is_paid": true,
            "price": "$19.99",
            "headline": "Learn Rust"
        });

        let item = backend_item(&value, &images).unwrap();
        assert_eq!(item.id, ItemId::Num(101));
        assert_eq!(item.rating, Some(9.0));
        assert_eq!(item.popularity, Some(1200));
        assert_eq!(
            item.images.poster.as_deref(),
            Some("https://img.example.com/101.jpg")
        );
        assert_eq!(item.category.as_deref(), Some("Development"));
        assert_eq!(item.tags, vec!["Rust"]);
        assert_eq!(item.is_paid, Some(true));
        assert_eq!(item.overview.as_deref(), Some("Learn Rust"));
    }

    #[test]
    fn test_backend_movie_record_and_placeholders() {
        let images = ImageResolver::default();
        let value = json!({
            "id": "550",
            "title": "Fight Club",
            "vote_average": 8.4,
            "poster_url": "null",
            "poster_path": "/abc.jpg"
        });

        let item = backend_item(&value, &images).unwrap();
        assert_eq!(item.id, ItemId::Num(550));
        assert_eq!(item.rating, Some(8.4));
        assert_eq!(
            item.images.poster.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg")
        );
    }

    #[test]
    fn test_backend_record_without_id_is_dropped() {
        let images = ImageResolver::default();
        let payload = json!({"results": [{"title": "no id"}, {"id": 3}]});
        let items = backend_payload(&payload, &images);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, ItemId::Num(3));
    }

    #[test]
    fn test_metadata_record() {
        let images = ImageResolver::default();
        let value = json!({
            "id": 27205,
            "title": "Inception",
            "vote_average": 8.4,
            "vote_count": 35000,
            "poster_path": "/inception.jpg",
            "backdrop_path": "/inception-wide.jpg",
            "genre_ids": [28, 878],
            "original_language": "en",
            "adult": false
        });

        let item = metadata_item(&value, &images).unwrap();
        assert_eq!(
            item.images.poster.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/inception.jpg")
        );
        assert_eq!(
            item.images.backdrop.as_deref(),
            Some("https://image.tmdb.org/t/p/w780/inception-wide.jpg")
        );
        assert_eq!(item.tags, vec!["Action", "Science Fiction"]);
        assert_eq!(item.category.as_deref(), Some("Action"));
    }

    #[test]
    fn test_genre_lookup() {
        assert_eq!(genre_id("comedy"), Some(35));
        assert_eq!(genre_id("Science Fiction"), Some(878));
        assert_eq!(genre_id("Cooking"), None);
        assert_eq!(genre_name(53), Some("Thriller"));
    }
}
