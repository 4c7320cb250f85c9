use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::normalize::{canonical_key, year_number};

/// One entry in a person's viewing history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilmRecord {
    pub name: String,
    /// Release year, often embedded in a longer date string
    #[serde(default)]
    pub year: Option<String>,
    /// 0.5-5.0 in half-point steps, `None` when unrated
    #[serde(default)]
    pub rating: Option<f64>,
    /// Explicit rewatch count (derived from diary rows)
    #[serde(default)]
    pub rewatch_count: u32,
    /// Rewatch flag for exports that only carry a yes/no column
    #[serde(default)]
    pub rewatched: bool,
}

impl FilmRecord {
    pub fn new(name: impl Into<String>, year: Option<&str>, rating: Option<f64>) -> Self {
        Self {
            name: name.into(),
            year: year.map(str::to_string),
            rating,
            rewatch_count: 0,
            rewatched: false,
        }
    }

    pub fn with_rewatches(mut self, count: u32) -> Self {
        self.rewatch_count = count;
        self
    }

    pub fn key(&self) -> String {
        canonical_key(&self.name)
    }

    pub fn release_year(&self) -> Option<u16> {
        self.year.as_deref().and_then(year_number)
    }

    pub fn is_rated(&self) -> bool {
        self.rating.is_some()
    }

    /// Rewatches this record contributes: the explicit count when present,
    /// otherwise 1 for a flagged record.
    pub fn rewatch_weight(&self) -> u32 {
        if self.rewatch_count > 0 {
            self.rewatch_count
        } else if self.rewatched {
            1
        } else {
            0
        }
    }
}

/// Diary row used for recency context and rewatch counting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiaryEntry {
    pub name: String,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub watched_date: Option<NaiveDate>,
    #[serde(default)]
    pub rewatch: bool,
}

/// Parse a star rating. Anything outside (0, 5] or non-numeric is unrated.
pub fn parse_rating(value: &str) -> Option<f64> {
    let rating: f64 = value.trim().parse().ok()?;
    if rating.is_finite() && rating > 0.0 && rating <= 5.0 {
        Some(rating)
    } else {
        None
    }
}

/// Letterboxd-style yes/no flag.
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "yes" | "true" | "1" | "y")
}
