//! Converts upstream anime records into [`CatalogEntry`].
//!
//! [`normalize`] is total: any [`RawAnime`], including one with every field
//! missing, produces an entry. The fallible edge is deserialization, handled
//! per record by [`normalize_value`] so one odd record never sinks a listing.

use crate::clients::jikan::RawAnime;
use crate::constants::normalize::{CAROUSEL_GENRES, SYNOPSIS_PREVIEW_CHARS};
use crate::domain::AnimeId;
use crate::models::{AiredRange, AiringStatus, CatalogEntry};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Per-context shaping rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Maximum synopsis length in characters, `None` keeps the full text.
    pub synopsis_limit: Option<usize>,
    /// Maximum number of genres, `None` keeps all of them.
    pub genre_limit: Option<usize>,
}

impl NormalizeOptions {
    pub const DETAIL: Self = Self {
        synopsis_limit: None,
        genre_limit: None,
    };

    pub const LISTING: Self = Self {
        synopsis_limit: Some(SYNOPSIS_PREVIEW_CHARS),
        genre_limit: None,
    };

    pub const CAROUSEL: Self = Self {
        synopsis_limit: Some(SYNOPSIS_PREVIEW_CHARS),
        genre_limit: Some(CAROUSEL_GENRES),
    };
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizationSkip {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record has an unexpected shape: {0}")]
    Shape(String),

    #[error("record has no usable mal_id")]
    MissingId,
}

#[must_use]
pub fn normalize(raw: RawAnime, options: NormalizeOptions) -> CatalogEntry {
    let image_url = raw
        .images
        .and_then(|images| images.jpg)
        .and_then(|jpg| non_empty(jpg.large_image_url).or_else(|| non_empty(jpg.image_url)))
        .unwrap_or_default();

    let genres = raw
        .genres
        .unwrap_or_default()
        .into_iter()
        .filter_map(|g| non_empty(g.name))
        .collect();

    let aired = raw
        .aired
        .map(|aired| AiredRange {
            from: non_empty(aired.from),
            to: non_empty(aired.to),
            display: non_empty(aired.string).unwrap_or_default(),
        })
        .unwrap_or_default();

    let broadcast = raw.broadcast.and_then(|b| non_empty(b.string));
    let broadcast_time = broadcast.as_deref().and_then(broadcast_time);

    let entry = CatalogEntry {
        id: AnimeId::new(raw.mal_id.unwrap_or_default()),
        title: non_empty(raw.title).unwrap_or_default(),
        title_english: non_empty(raw.title_english),
        synopsis: non_empty(raw.synopsis).unwrap_or_default(),
        image_url,
        score: raw.score,
        episodes: raw.episodes,
        aired,
        genres,
        status: raw
            .status
            .as_deref()
            .map(AiringStatus::from_upstream)
            .unwrap_or_default(),
        kind: non_empty(raw.kind),
        broadcast,
        broadcast_time,
        url: non_empty(raw.url).unwrap_or_default(),
        rank: raw.rank,
    };

    reshape(entry, options)
}

/// Applies the synopsis and genre limits of `options` to an entry that was
/// normalized with looser ones. Applying the same options twice is a no-op.
#[must_use]
pub fn reshape(mut entry: CatalogEntry, options: NormalizeOptions) -> CatalogEntry {
    if let Some(limit) = options.synopsis_limit
        && let Some((cut, _)) = entry.synopsis.char_indices().nth(limit)
    {
        entry.synopsis.truncate(cut);
    }
    if let Some(limit) = options.genre_limit {
        entry.genres.truncate(limit);
    }
    entry
}

/// Deserializes one upstream record and normalizes it.
pub fn normalize_value(
    value: &Value,
    options: NormalizeOptions,
) -> Result<CatalogEntry, NormalizationSkip> {
    if !value.is_object() {
        return Err(NormalizationSkip::NotAnObject);
    }

    let raw = RawAnime::deserialize(value).map_err(|e| NormalizationSkip::Shape(e.to_string()))?;
    Ok(normalize(raw, options))
}

/// Entries handed to callers must point at a real upstream record.
fn identified(entry: CatalogEntry) -> Result<CatalogEntry, NormalizationSkip> {
    if entry.id.is_valid() {
        Ok(entry)
    } else {
        Err(NormalizationSkip::MissingId)
    }
}

/// Normalizes the `data` array of a list response, dropping records that
/// cannot be read or have no id. A payload without an array yields an empty list.
#[must_use]
pub fn normalize_list(payload: &Value, options: NormalizeOptions) -> Vec<CatalogEntry> {
    let Some(records) = payload.get("data").and_then(Value::as_array) else {
        warn!("Catalog list payload has no data array");
        return Vec::new();
    };

    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            match normalize_value(record, options).and_then(identified) {
                Ok(entry) => Some(entry),
                Err(skip) => {
                    let mal_id = record.get("mal_id").and_then(serde_json::Value::as_i64);
                    warn!(index, mal_id, reason = %skip, "Skipping catalog record");
                    None
                }
            }
        })
        .collect()
}

/// Normalizes the `data` object of a single-entity response.
pub fn normalize_single(
    payload: &Value,
    options: NormalizeOptions,
) -> Result<CatalogEntry, NormalizationSkip> {
    let record = payload.get("data").ok_or(NormalizationSkip::NotAnObject)?;
    normalize_value(record, options).and_then(identified)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// "Saturdays at 17:00 (JST)" -> "17:00 (JST)"
fn broadcast_time(broadcast: &str) -> Option<String> {
    broadcast
        .rsplit_once(" at ")
        .map(|(_, time)| time.trim().to_string())
        .filter(|time| !time.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_record() -> Value {
        json!({
            "mal_id": 5114,
            "url": "https://myanimelist.net/anime/5114",
            "images": {"jpg": {
                "image_url": "http://x/small.jpg",
                "large_image_url": "http://x/large.jpg"
            }},
            "title": "Fullmetal Alchemist: Brotherhood",
            "title_english": "Fullmetal Alchemist: Brotherhood",
            "type": "TV",
            "episodes": 64,
            "status": "Finished Airing",
            "aired": {
                "from": "2009-04-05T00:00:00+00:00",
                "to": "2010-07-04T00:00:00+00:00",
                "string": "Apr 5, 2009 to Jul 4, 2010"
            },
            "score": 9.1,
            "rank": 1,
            "synopsis": "x".repeat(500),
            "broadcast": {"string": "Sundays at 17:00 (JST)"},
            "genres": [
                {"name": "Action"},
                {"name": "Adventure"},
                {"name": "Drama"},
                {"name": "Fantasy"}
            ]
        })
    }

    #[test]
    fn empty_record_normalizes_to_defaults() {
        let entry = normalize_value(&json!({}), NormalizeOptions::DETAIL).unwrap();

        assert_eq!(entry.id, AnimeId::new(0));
        assert_eq!(entry.title, "");
        assert_eq!(entry.title_english, None);
        assert_eq!(entry.synopsis, "");
        assert_eq!(entry.image_url, "");
        assert_eq!(entry.score, None);
        assert_eq!(entry.episodes, None);
        assert_eq!(entry.aired, AiredRange::default());
        assert!(entry.genres.is_empty());
        assert_eq!(entry.status, AiringStatus::Unknown);
        assert_eq!(entry.broadcast_time, None);
    }

    #[test]
    fn nulls_are_treated_as_absent() {
        let record = json!({
            "mal_id": 7,
            "title": null,
            "images": null,
            "genres": null,
            "aired": {"from": null, "to": null, "string": null},
            "score": null
        });
        let entry = normalize_value(&record, NormalizeOptions::LISTING).unwrap();

        assert_eq!(entry.id, AnimeId::new(7));
        assert_eq!(entry.title, "");
        assert_eq!(entry.image_url, "");
        assert!(entry.genres.is_empty());
        assert_eq!(entry.aired.display, "");
    }

    #[test]
    fn detail_keeps_full_synopsis_and_genres() {
        let entry = normalize_value(&full_record(), NormalizeOptions::DETAIL).unwrap();

        assert_eq!(entry.synopsis.chars().count(), 500);
        assert_eq!(entry.genres.len(), 4);
        assert_eq!(entry.image_url, "http://x/large.jpg");
        assert_eq!(entry.status, AiringStatus::Finished);
        assert_eq!(entry.kind.as_deref(), Some("TV"));
        assert_eq!(entry.broadcast_time.as_deref(), Some("17:00 (JST)"));
        assert_eq!(entry.aired.display, "Apr 5, 2009 to Jul 4, 2010");
        assert_eq!(entry.rank, Some(1));
    }

    #[test]
    fn listing_truncates_synopsis_only() {
        let entry = normalize_value(&full_record(), NormalizeOptions::LISTING).unwrap();
        assert_eq!(entry.synopsis.chars().count(), 200);
        assert_eq!(entry.genres.len(), 4);
    }

    #[test]
    fn carousel_caps_genres() {
        let entry = normalize_value(&full_record(), NormalizeOptions::CAROUSEL).unwrap();
        assert_eq!(entry.synopsis.chars().count(), 200);
        assert_eq!(entry.genres, vec!["Action", "Adventure", "Drama"]);
    }

    #[test]
    fn reshape_listing_entry_into_carousel() {
        let listing = normalize_value(&full_record(), NormalizeOptions::LISTING).unwrap();
        let carousel = reshape(listing.clone(), NormalizeOptions::CAROUSEL);

        assert_eq!(carousel.genres.len(), 3);
        assert_eq!(carousel.synopsis, listing.synopsis);
        assert_eq!(reshape(carousel.clone(), NormalizeOptions::CAROUSEL), carousel);
    }

    #[test]
    fn synopsis_truncation_respects_char_boundaries() {
        let record = json!({"mal_id": 1, "synopsis": "あ".repeat(300)});
        let entry = normalize_value(&record, NormalizeOptions::LISTING).unwrap();
        assert_eq!(entry.synopsis.chars().count(), 200);
    }

    #[test]
    fn image_falls_back_to_small_then_empty() {
        let record = json!({"images": {"jpg": {
            "image_url": "http://x/img.jpg",
            "large_image_url": ""
        }}});
        let entry = normalize_value(&record, NormalizeOptions::LISTING).unwrap();
        assert_eq!(entry.image_url, "http://x/img.jpg");

        let record = json!({"images": {"webp": {"image_url": "http://x/img.webp"}}});
        let entry = normalize_value(&record, NormalizeOptions::LISTING).unwrap();
        assert_eq!(entry.image_url, "");
    }

    #[test]
    fn broadcast_without_time_has_no_time() {
        let record = json!({"broadcast": {"string": "Unknown"}});
        let entry = normalize_value(&record, NormalizeOptions::LISTING).unwrap();
        assert_eq!(entry.broadcast.as_deref(), Some("Unknown"));
        assert_eq!(entry.broadcast_time, None);
    }

    #[test]
    fn non_object_record_is_skipped() {
        assert_eq!(
            normalize_value(&json!("oops"), NormalizeOptions::LISTING),
            Err(NormalizationSkip::NotAnObject)
        );
    }

    #[test]
    fn list_drops_unreadable_records() {
        let payload = json!({"data": [
            {"mal_id": 1, "title": "Kept"},
            {"mal_id": "not-a-number"},
            42,
            {"mal_id": 3, "title": "Also kept"}
        ]});
        let entries = normalize_list(&payload, NormalizeOptions::LISTING);
        let ids: Vec<i32> = entries.iter().map(|e| e.id.value()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn list_drops_records_without_id() {
        let payload = json!({"data": [
            {"title": "No id"},
            {"mal_id": 0, "title": "Zero"},
            {"mal_id": -4, "title": "Negative"},
            {"mal_id": 9, "title": "Kept"}
        ]});
        let entries = normalize_list(&payload, NormalizeOptions::LISTING);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, AnimeId::new(9));
    }

    #[test]
    fn list_without_data_is_empty() {
        assert!(normalize_list(&json!({"error": "x"}), NormalizeOptions::LISTING).is_empty());
        assert!(normalize_list(&json!({"data": {}}), NormalizeOptions::LISTING).is_empty());
    }

    #[test]
    fn single_requires_data_object() {
        let payload = json!({"data": {"mal_id": 1}});
        assert!(normalize_single(&payload, NormalizeOptions::DETAIL).is_ok());
        assert!(normalize_single(&json!({"data": null}), NormalizeOptions::DETAIL).is_err());
        assert!(normalize_single(&json!({}), NormalizeOptions::DETAIL).is_err());
        assert_eq!(
            normalize_single(&json!({"data": {"title": "no id"}}), NormalizeOptions::DETAIL),
            Err(NormalizationSkip::MissingId)
        );
    }
}
