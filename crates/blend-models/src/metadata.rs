use serde::{Deserialize, Serialize};

use crate::normalize::{extract_year, lookup_key};

/// A (title, year) pair submitted to the lookup gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    #[serde(default)]
    pub year: Option<String>,
}

impl Candidate {
    pub fn new(name: impl Into<String>, year: Option<&str>) -> Self {
        Self {
            name: name.into(),
            year: year.map(str::to_string),
        }
    }

    pub fn lookup_key(&self) -> String {
        lookup_key(&self.name, self.year.as_deref())
    }

    pub fn year_token(&self) -> Option<String> {
        self.year.as_deref().and_then(extract_year)
    }
}

/// External popularity metadata for a confidently matched candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataRecord {
    pub key: String,
    pub input_name: String,
    pub input_year: Option<String>,
    pub resolved_id: u64,
    pub title: String,
    pub year: String,
    pub popularity: f64,
    pub vote_count: u64,
    pub vote_average: f64,
    /// Minutes
    pub runtime: u32,
}
