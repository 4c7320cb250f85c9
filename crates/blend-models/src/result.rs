use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::comparison::SharedFilm;
use crate::film::{DiaryEntry, FilmRecord};

/// Which uploader a derived value refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Side {
    #[serde(rename = "p1")]
    Person1,
    #[serde(rename = "p2")]
    Person2,
}

/// One value per side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Pair<T> {
    pub person1: T,
    pub person2: T,
}

impl<T> Pair<T> {
    pub fn new(person1: T, person2: T) -> Self {
        Self { person1, person2 }
    }

    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Person1 => &self.person1,
            Side::Person2 => &self.person2,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Pair<U> {
        Pair {
            person1: f(self.person1),
            person2: f(self.person2),
        }
    }
}

/// Every sub-factor that went into the blend score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    /// 0-30
    pub overlap: f64,
    /// 0-100 agreement sub-score (contributes half)
    pub rating_agreement: f64,
    /// 0-100 conviction term folded into `rating_agreement`
    pub conviction: f64,
    /// 0-10
    pub consistency_bonus: f64,
    /// 0-12
    pub rewatch_alignment: f64,
    /// 0-12
    pub coverage_bonus: f64,
    /// 0-8
    pub diversity_bonus: f64,
    /// 0-8, subtracted
    pub generosity_penalty: f64,
    /// Sum before rounding and clamping
    pub raw_total: f64,
    pub weights_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlendStats {
    pub shared_count: usize,
    /// Overlap ratio as a rounded percentage
    pub shared_percent: u32,
    pub overlap_ratio: f64,
    pub total: Pair<usize>,
    pub rated: Pair<usize>,
    pub exclusive: Pair<usize>,
    /// Average rating to 2 decimals, 0 when a side rated nothing
    pub average: Pair<f64>,
    pub rated_shared_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RewatchLeader {
    pub name: String,
    pub count: u32,
}

/// A side with no rewatches is an explicit state, not an empty list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RewatchLeaders {
    NoRewatches,
    Leaders { films: Vec<RewatchLeader> },
}

impl RewatchLeaders {
    pub fn films(&self) -> &[RewatchLeader] {
        match self {
            RewatchLeaders::NoRewatches => &[],
            RewatchLeaders::Leaders { films } => films,
        }
    }
}

/// Films per release decade on each side, over a shared ascending axis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EraHistogram {
    pub decades: Pair<BTreeMap<u16, usize>>,
    pub axis: Vec<u16>,
}

impl EraHistogram {
    pub fn count(&self, side: Side, decade: u16) -> usize {
        self.decades.get(side).get(&decade).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Generosity {
    /// `|avg1 - avg2|` to 2 decimals
    pub gap: f64,
    pub harsher: Side,
    pub kinder: Side,
}

/// Exclusive film rated furthest above its rater's own average.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuiltyPleasure {
    pub film: FilmRecord,
    pub above_average: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FavouriteYear {
    pub year: u16,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NichePick {
    pub title: String,
    pub year: String,
    pub vote_count: u64,
    pub popularity: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NicheSource {
    /// Enrichment was not requested
    NotRequested,
    /// Picks come from resolved external metadata
    Metadata,
    /// Zero-confidence local placeholders
    LocalFallback,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NicheComparison {
    pub source: NicheSource,
    pub picks: Pair<Option<NichePick>>,
    pub average_popularity: Pair<Option<f64>>,
    /// Side with the lower average popularity, `None` on a tie or when unknown
    pub more_niche: Option<Side>,
    pub note: Option<String>,
}

impl NicheComparison {
    pub fn not_requested() -> Self {
        Self {
            source: NicheSource::NotRequested,
            picks: Pair::default(),
            average_popularity: Pair::default(),
            more_niche: None,
            note: None,
        }
    }
}

/// Everything the presentation layer needs for one comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlendResult {
    pub score: u8,
    pub label: String,
    pub breakdown: ScoreBreakdown,
    pub stats: BlendStats,
    pub shared: Vec<SharedFilm>,
    /// Top agreements, closest first
    pub agreed: Vec<SharedFilm>,
    /// All rated shared films, biggest gap first; callers slice
    pub clashes: Vec<SharedFilm>,
    pub recommendations: Pair<Vec<FilmRecord>>,
    pub rewatch_leaders: Pair<RewatchLeaders>,
    pub eras: EraHistogram,
    pub generosity: Generosity,
    pub guilty_pleasures: Pair<Option<GuiltyPleasure>>,
    pub favourite_years: Pair<Option<FavouriteYear>>,
    pub recent: Pair<Vec<DiaryEntry>>,
    pub niche: NicheComparison,
}
