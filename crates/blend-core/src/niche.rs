use crate::lookup::LookupGateway;
use crate::scoring::{blend_keeping_exclusives, ScoreWeights};
use blend_models::{
    BlendResult, Candidate, DiaryEntry, FilmRecord, MetadataRecord, NicheComparison, NichePick, NicheSource, Pair,
    Side,
};
use tracing::{info, warn};

/// Fewest votes wins, then lowest popularity. Earliest wins a full tie.
fn most_niche(records: &[&MetadataRecord]) -> Option<NichePick> {
    records
        .iter()
        .copied()
        .reduce(|best, record| {
            let ordering = record
                .vote_count
                .cmp(&best.vote_count)
                .then(record.popularity.total_cmp(&best.popularity));
            if ordering.is_lt() {
                record
            } else {
                best
            }
        })
        .map(|record| NichePick {
            title: record.title.clone(),
            year: record.year.clone(),
            vote_count: record.vote_count,
            popularity: record.popularity,
        })
}

fn average_popularity(values: impl ExactSizeIterator<Item = f64>) -> Option<f64> {
    let count = values.len();
    if count == 0 {
        return None;
    }
    Some(values.sum::<f64>() / count as f64)
}

/// Lower average popularity is more niche. Equal or unknown → `None`.
fn more_niche_side(averages: &Pair<Option<f64>>) -> Option<Side> {
    match (averages.person1, averages.person2) {
        (Some(a), Some(b)) if a < b => Some(Side::Person1),
        (Some(a), Some(b)) if b < a => Some(Side::Person2),
        _ => None,
    }
}

/// Zero-confidence placeholders: each side's first film at popularity 0.
pub fn local_fallback(exclusive1: &[FilmRecord], exclusive2: &[FilmRecord], note: Option<String>) -> NicheComparison {
    let pick = |films: &[FilmRecord]| {
        films.first().map(|film| NichePick {
            title: film.name.clone(),
            year: film.year.clone().unwrap_or_default(),
            vote_count: 0,
            popularity: 0.0,
        })
    };
    let average = |films: &[FilmRecord]| average_popularity(films.iter().map(|_| 0.0));
    let average_popularity = Pair::new(average(exclusive1), average(exclusive2));

    NicheComparison {
        source: NicheSource::LocalFallback,
        picks: Pair::new(pick(exclusive1), pick(exclusive2)),
        more_niche: more_niche_side(&average_popularity),
        average_popularity,
        note,
    }
}

fn candidates(films: &[FilmRecord]) -> impl Iterator<Item = Candidate> + '_ {
    films
        .iter()
        .map(|film| Candidate::new(film.name.clone(), film.year.as_deref()))
}

/// Compare how niche each side's exclusive films are, using external
/// popularity metadata. Never fails: gateway errors fall back to local
/// placeholders with the reason in `note`.
pub async fn compare_niche(
    gateway: &LookupGateway,
    exclusive1: &[FilmRecord],
    exclusive2: &[FilmRecord],
    min_runtime_minutes: u32,
) -> NicheComparison {
    let batch: Vec<Candidate> = candidates(exclusive1).chain(candidates(exclusive2)).collect();
    if batch.is_empty() {
        return local_fallback(exclusive1, exclusive2, None);
    }

    let resolved = match gateway.resolve_batch(&batch, min_runtime_minutes).await {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!(error = %e, "Niche lookup failed, using local fallback");
            return local_fallback(exclusive1, exclusive2, Some(e.to_string()));
        }
    };

    let (side1, side2) = resolved.split_at(exclusive1.len());
    let pool1: Vec<&MetadataRecord> = side1.iter().flatten().collect();
    let pool2: Vec<&MetadataRecord> = side2.iter().flatten().collect();
    if pool1.is_empty() && pool2.is_empty() {
        return local_fallback(
            exclusive1,
            exclusive2,
            Some("no confident metadata matches".to_string()),
        );
    }

    let average_popularity = Pair::new(
        average_popularity(pool1.iter().map(|r| r.popularity)),
        average_popularity(pool2.iter().map(|r| r.popularity)),
    );
    info!(
        matched1 = pool1.len(),
        matched2 = pool2.len(),
        "Niche comparison resolved"
    );

    NicheComparison {
        source: NicheSource::Metadata,
        picks: Pair::new(most_niche(&pool1), most_niche(&pool2)),
        more_niche: more_niche_side(&average_popularity),
        average_popularity,
        note: None,
    }
}

/// [`crate::blend`] followed by niche enrichment. Always returns a complete result;
/// without a gateway the niche section is the local fallback.
pub async fn blend_with_metadata(
    gateway: Option<&LookupGateway>,
    collection1: &[FilmRecord],
    collection2: &[FilmRecord],
    recent1: &[DiaryEntry],
    recent2: &[DiaryEntry],
    min_runtime_minutes: u32,
) -> BlendResult {
    let (mut result, exclusive) =
        blend_keeping_exclusives(collection1, collection2, recent1, recent2, &ScoreWeights::V1);

    result.niche = match gateway {
        Some(gateway) => compare_niche(gateway, &exclusive.person1, &exclusive.person2, min_runtime_minutes).await,
        None => local_fallback(
            &exclusive.person1,
            &exclusive.person2,
            Some("metadata lookups are not configured".to_string()),
        ),
    };
    result
}
