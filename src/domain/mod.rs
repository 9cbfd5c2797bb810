//! Domain primitives shared by the catalog layer and the community features.
//!
//! Newtypes and small enums here keep upstream identifiers, weekday names and
//! comment lifecycle states from being passed around as bare integers and strings.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upstream (MyAnimeList) identifier of an anime.
///
/// Comments and favorites reference anime by this id only; the catalog record
/// itself lives upstream.
///
/// # Examples
///
/// ```rust
/// use animecalendar::domain::AnimeId;
///
/// let id = AnimeId::new(5114);
/// assert_eq!(id.value(), 5114);
/// assert_eq!(id.to_string(), "5114");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AnimeId(i32);

impl AnimeId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }

    /// Ids handed out by upstream are strictly positive.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for AnimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<AnimeId> for i32 {
    fn from(id: AnimeId) -> Self {
        id.0
    }
}

impl From<i32> for AnimeId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl Serialize for AnimeId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

impl<'de> Deserialize<'de> for AnimeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = i32::deserialize(deserializer)?;
        Ok(Self::new(id))
    }
}

/// Day of the week as the schedule endpoint names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Self; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }

    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self::ALL[date.weekday().num_days_from_monday() as usize]
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == lowered)
            .ok_or_else(|| format!("Unknown weekday: {s}"))
    }
}

/// Lifecycle of a comment. Removal is a state, never a row delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentStatus {
    #[default]
    Active,
    RemovedByAuthor,
    RemovedByModerator,
}

impl CommentStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::RemovedByAuthor => "removed_by_author",
            Self::RemovedByModerator => "removed_by_moderator",
        }
    }

    #[must_use]
    pub const fn is_visible(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "removed_by_author" => Ok(Self::RemovedByAuthor),
            "removed_by_moderator" => Ok(Self::RemovedByModerator),
            other => Err(format!("Unknown comment status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anime_id_conversions() {
        let id = AnimeId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(i32::from(id), 42);
        assert_eq!(AnimeId::from(42), id);
        assert!(id.is_valid());
        assert!(!AnimeId::new(0).is_valid());
    }

    #[test]
    fn anime_id_serialization() {
        let id = AnimeId::new(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");
        let deserialized: AnimeId = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, id);
    }

    #[test]
    fn weekday_parses_case_insensitively() {
        assert_eq!("Monday".parse::<Weekday>().unwrap(), Weekday::Monday);
        assert_eq!(" sunday ".parse::<Weekday>().unwrap(), Weekday::Sunday);
        assert!("someday".parse::<Weekday>().is_err());
    }

    #[test]
    fn weekday_from_date() {
        // 2024-01-01 was a Monday
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(Weekday::from_date(date), Weekday::Monday);
        let date = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        assert_eq!(Weekday::from_date(date), Weekday::Sunday);
    }

    #[test]
    fn weekday_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Weekday::Wednesday).unwrap(),
            "\"wednesday\""
        );
    }

    #[test]
    fn comment_status_round_trips_through_str() {
        for status in [
            CommentStatus::Active,
            CommentStatus::RemovedByAuthor,
            CommentStatus::RemovedByModerator,
        ] {
            assert_eq!(status.as_str().parse::<CommentStatus>().unwrap(), status);
        }
        assert!(CommentStatus::Active.is_visible());
        assert!(!CommentStatus::RemovedByModerator.is_visible());
    }
}
