use crate::matcher::{match_collections, MatchOutcome};
use crate::rankings::{self, round2};
use blend_models::{BlendResult, BlendStats, DiaryEntry, FilmRecord, NicheComparison, Pair, ScoreBreakdown};
use tracing::debug;

/// Versioned table of every weight and threshold in the blend formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub version: &'static str,
    pub rating_scale: f64,
    pub overlap_cap: f64,
    pub overlap_scale: f64,
    /// Share of the 0-100 agreement sub-score added to the total
    pub agreement_weight: f64,
    pub agreement_base_mix: f64,
    pub conviction_mix: f64,
    /// Rating considered neutral when measuring conviction
    pub rating_midpoint: f64,
    /// Distance from the midpoint to either end of the scale
    pub extremity_span: f64,
    pub conviction_floor: f64,
    pub consistency_cap: f64,
    pub consistency_slope: f64,
    pub rewatch_cap: f64,
    pub rewatch_slope: f64,
    pub coverage_cap: f64,
    pub coverage_slope: f64,
    pub diversity_cap: f64,
    pub diversity_per_decade: f64,
    pub generosity_cap: f64,
    pub generosity_slope: f64,
}

impl ScoreWeights {
    pub const V1: ScoreWeights = ScoreWeights {
        version: "v1",
        rating_scale: 5.0,
        overlap_cap: 30.0,
        overlap_scale: 0.3,
        agreement_weight: 0.5,
        agreement_base_mix: 0.8,
        conviction_mix: 0.2,
        rating_midpoint: 2.75,
        extremity_span: 2.25,
        conviction_floor: 0.5,
        consistency_cap: 10.0,
        consistency_slope: 5.0,
        rewatch_cap: 12.0,
        rewatch_slope: 20.0,
        coverage_cap: 12.0,
        coverage_slope: 0.08,
        diversity_cap: 8.0,
        diversity_per_decade: 0.8,
        generosity_cap: 8.0,
        generosity_slope: 4.0,
    };
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::V1
    }
}

/// Score thresholds, best bucket first. Anything below the last is `FLOOR_LABEL`.
const LABELS: [(u8, &str); 5] = [
    (88, "practically the same taste"),
    (74, "very similar taste"),
    (58, "averagely similar taste"),
    (42, "not good friends"),
    (26, "nothing in common"),
];
const PERFECT_LABEL: &str = "one of you has to be copying the other one";
const FLOOR_LABEL: &str = "are you guys even friends?";

pub fn label_for(score: u8) -> &'static str {
    if score >= 100 {
        return PERFECT_LABEL;
    }
    LABELS
        .iter()
        .find(|(threshold, _)| score >= *threshold)
        .map(|(_, label)| *label)
        .unwrap_or(FLOOR_LABEL)
}

fn population_stdev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

fn ratings(films: &[FilmRecord]) -> Vec<f64> {
    films.iter().filter_map(|f| f.rating).collect()
}

fn fraction(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn rewatch_ratio(films: &[FilmRecord]) -> f64 {
    fraction(films.iter().filter(|f| f.rewatch_weight() > 0).count(), films.len())
}

fn coverage_percent(films: &[FilmRecord]) -> f64 {
    fraction(films.iter().filter(|f| f.is_rated()).count(), films.len()) * 100.0
}

/// Rating-agreement sub-score (0-100) and its conviction term.
fn agreement(outcome: &MatchOutcome, weights: &ScoreWeights) -> (f64, f64) {
    let pairs: Vec<(f64, f64, f64)> = outcome
        .shared
        .iter()
        .filter_map(|film| match (film.rating1, film.rating2, film.diff) {
            (Some(r1), Some(r2), Some(diff)) => Some((r1, r2, diff)),
            _ => None,
        })
        .collect();
    if pairs.is_empty() {
        return (0.0, 0.0);
    }

    let avg_diff = pairs.iter().map(|(_, _, diff)| diff).sum::<f64>() / pairs.len() as f64;
    let base = ((1.0 - avg_diff / weights.rating_scale) * 100.0).clamp(0.0, 100.0);

    // Agreement on strong opinions counts for more than agreeing on "fine"
    let (weighted, total_weight) = pairs.iter().fold((0.0, 0.0), |(weighted, total), (r1, r2, diff)| {
        let extremity = (r1 - weights.rating_midpoint)
            .abs()
            .min((r2 - weights.rating_midpoint).abs())
            / weights.extremity_span;
        let weight = weights.conviction_floor + extremity;
        let accord = (1.0 - diff / weights.rating_scale).clamp(0.0, 1.0);
        (weighted + weight * accord, total + weight)
    });
    let conviction = if total_weight > 0.0 {
        (weighted / total_weight * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    (
        weights.agreement_base_mix * base + weights.conviction_mix * conviction,
        conviction,
    )
}

/// Every sub-factor of the blend score.
pub fn score_breakdown(
    collection1: &[FilmRecord],
    collection2: &[FilmRecord],
    outcome: &MatchOutcome,
    weights: &ScoreWeights,
) -> ScoreBreakdown {
    let overlap = (outcome.overlap_ratio * 100.0 * weights.overlap_scale).min(weights.overlap_cap);
    let (rating_agreement, conviction) = agreement(outcome, weights);

    let stdev_gap = (population_stdev(&ratings(collection1)) - population_stdev(&ratings(collection2))).abs();
    let consistency_bonus = (weights.consistency_cap - stdev_gap * weights.consistency_slope).max(0.0);

    let rewatch_gap = (rewatch_ratio(collection1) - rewatch_ratio(collection2)).abs();
    let rewatch_alignment = (weights.rewatch_cap - rewatch_gap * weights.rewatch_slope).max(0.0);

    let coverage_gap = (coverage_percent(collection1) - coverage_percent(collection2)).abs();
    let coverage_bonus = (weights.coverage_cap - coverage_gap * weights.coverage_slope).max(0.0);

    let decades = rankings::distinct_decades(collection1).min(rankings::distinct_decades(collection2));
    let diversity_bonus = (decades as f64 * weights.diversity_per_decade).min(weights.diversity_cap);

    let average_gap = (rankings::average_rating(collection1) - rankings::average_rating(collection2)).abs();
    let generosity_penalty = (average_gap * weights.generosity_slope).min(weights.generosity_cap);

    let raw_total = overlap + weights.agreement_weight * rating_agreement + consistency_bonus + rewatch_alignment
        + coverage_bonus
        + diversity_bonus
        - generosity_penalty;

    ScoreBreakdown {
        overlap,
        rating_agreement,
        conviction,
        consistency_bonus,
        rewatch_alignment,
        coverage_bonus,
        diversity_bonus,
        generosity_penalty,
        raw_total,
        weights_version: weights.version.to_string(),
    }
}

fn final_score(raw_total: f64) -> u8 {
    if raw_total.is_nan() {
        return 0;
    }
    raw_total.round().clamp(0.0, 100.0) as u8
}

fn stats(collection1: &[FilmRecord], collection2: &[FilmRecord], outcome: &MatchOutcome) -> BlendStats {
    let rated = |films: &[FilmRecord]| films.iter().filter(|f| f.is_rated()).count();
    BlendStats {
        shared_count: outcome.shared.len(),
        shared_percent: (outcome.overlap_ratio * 100.0).round() as u32,
        overlap_ratio: outcome.overlap_ratio,
        total: Pair::new(collection1.len(), collection2.len()),
        rated: Pair::new(rated(collection1), rated(collection2)),
        exclusive: Pair::new(outcome.exclusive1.len(), outcome.exclusive2.len()),
        average: Pair::new(
            round2(rankings::average_rating(collection1)),
            round2(rankings::average_rating(collection2)),
        ),
        rated_shared_count: outcome.shared.iter().filter(|s| s.is_rated_by_both()).count(),
    }
}

/// Blend two viewing histories with the current weight table.
///
/// `recent1`/`recent2` are passed through unchanged (callers order and trim
/// them). The niche comparison is left as not requested; see
/// [`crate::niche::blend_with_metadata`] for the enriched variant.
pub fn blend(
    collection1: &[FilmRecord],
    collection2: &[FilmRecord],
    recent1: &[DiaryEntry],
    recent2: &[DiaryEntry],
) -> BlendResult {
    blend_with_weights(collection1, collection2, recent1, recent2, &ScoreWeights::V1)
}

pub fn blend_with_weights(
    collection1: &[FilmRecord],
    collection2: &[FilmRecord],
    recent1: &[DiaryEntry],
    recent2: &[DiaryEntry],
    weights: &ScoreWeights,
) -> BlendResult {
    blend_keeping_exclusives(collection1, collection2, recent1, recent2, weights).0
}

/// [`blend_with_weights`] that also hands back each side's exclusive films,
/// so enrichment can reuse the match instead of running it again.
pub(crate) fn blend_keeping_exclusives(
    collection1: &[FilmRecord],
    collection2: &[FilmRecord],
    recent1: &[DiaryEntry],
    recent2: &[DiaryEntry],
    weights: &ScoreWeights,
) -> (BlendResult, Pair<Vec<FilmRecord>>) {
    let outcome = match_collections(collection1, collection2);
    let breakdown = score_breakdown(collection1, collection2, &outcome, weights);
    let score = final_score(breakdown.raw_total);
    let stats = stats(collection1, collection2, &outcome);

    debug!(
        score,
        shared = outcome.shared.len(),
        overlap_ratio = outcome.overlap_ratio,
        raw_total = breakdown.raw_total,
        "Blend computed"
    );

    let average1 = rankings::average_rating(collection1);
    let average2 = rankings::average_rating(collection2);

    let result = BlendResult {
        score,
        label: label_for(score).to_string(),
        agreed: rankings::agreed(&outcome.shared, rankings::AGREED_LIMIT),
        clashes: rankings::clashes(&outcome.shared),
        recommendations: Pair::new(
            rankings::recommendations(&outcome.exclusive1, rankings::RECOMMENDATION_LIMIT),
            rankings::recommendations(&outcome.exclusive2, rankings::RECOMMENDATION_LIMIT),
        ),
        rewatch_leaders: Pair::new(
            rankings::rewatch_leaders(collection1, rankings::REWATCH_LIMIT),
            rankings::rewatch_leaders(collection2, rankings::REWATCH_LIMIT),
        ),
        eras: rankings::era_histogram(collection1, collection2),
        generosity: rankings::generosity(average1, average2),
        guilty_pleasures: Pair::new(
            rankings::guilty_pleasure(&outcome.exclusive1, average1),
            rankings::guilty_pleasure(&outcome.exclusive2, average2),
        ),
        favourite_years: Pair::new(
            rankings::favourite_year(collection1),
            rankings::favourite_year(collection2),
        ),
        recent: Pair::new(recent1.to_vec(), recent2.to_vec()),
        niche: NicheComparison::not_requested(),
        shared: outcome.shared,
        breakdown,
        stats,
    };
    (result, Pair::new(outcome.exclusive1, outcome.exclusive2))
}
