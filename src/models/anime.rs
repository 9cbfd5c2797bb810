use crate::domain::{AnimeId, Weekday};
use serde::{Deserialize, Serialize};

/// A catalog record in the shape the rest of the application consumes.
///
/// Only the normalizer builds these. Every field carries a defined value:
/// missing upstream data becomes an empty string, `None` or an empty list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: AnimeId,
    pub title: String,
    pub title_english: Option<String>,
    pub synopsis: String,
    pub image_url: String,
    pub score: Option<f64>,
    pub episodes: Option<i32>,
    pub aired: AiredRange,
    pub genres: Vec<String>,
    pub status: AiringStatus,
    pub kind: Option<String>,
    pub broadcast: Option<String>,
    pub broadcast_time: Option<String>,
    pub url: String,
    pub rank: Option<i32>,
}

impl CatalogEntry {
    /// English title when upstream has one, the default title otherwise.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title_english
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.title)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiredRange {
    pub from: Option<String>,
    pub to: Option<String>,
    /// Human readable range, e.g. "Apr 3, 2009 to Jul 4, 2010".
    pub display: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiringStatus {
    Airing,
    Finished,
    Paused,
    Upcoming,
    #[default]
    Unknown,
}

impl AiringStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Airing => "airing",
            Self::Finished => "finished",
            Self::Paused => "paused",
            Self::Upcoming => "upcoming",
            Self::Unknown => "unknown",
        }
    }

    /// Maps the upstream status label. Unrecognized labels become `Unknown`.
    #[must_use]
    pub fn from_upstream(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "currently airing" | "airing" | "publishing" => Self::Airing,
            "finished airing" | "finished" => Self::Finished,
            "on hiatus" | "hiatus" | "paused" => Self::Paused,
            "not yet aired" | "upcoming" => Self::Upcoming,
            _ => Self::Unknown,
        }
    }
}

/// Everything airing on one weekday, in upstream order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleDay {
    pub weekday: Weekday,
    pub entries: Vec<CatalogEntry>,
}

impl ScheduleDay {
    #[must_use]
    pub const fn empty(weekday: Weekday) -> Self {
        Self {
            weekday,
            entries: Vec::new(),
        }
    }
}
