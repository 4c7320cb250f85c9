use serde::{Deserialize, Serialize};

/// A title present on both sides under canonical-key equality.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SharedFilm {
    pub name: String,
    pub year: Option<String>,
    pub rating1: Option<f64>,
    pub rating2: Option<f64>,
    /// `|rating1 - rating2|` when both sides rated, otherwise `None`
    pub diff: Option<f64>,
}

impl SharedFilm {
    pub fn new(name: String, year: Option<String>, rating1: Option<f64>, rating2: Option<f64>) -> Self {
        let diff = match (rating1, rating2) {
            (Some(r1), Some(r2)) => Some((r1 - r2).abs()),
            _ => None,
        };
        Self { name, year, rating1, rating2, diff }
    }

    pub fn is_rated_by_both(&self) -> bool {
        self.diff.is_some()
    }

    pub fn rating_sum(&self) -> f64 {
        self.rating1.unwrap_or(0.0) + self.rating2.unwrap_or(0.0)
    }
}
