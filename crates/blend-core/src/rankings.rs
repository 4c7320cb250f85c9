//! Derived lists shown next to the blend score. All pure and deterministic.

use blend_models::normalize::{canonical_key, decade_of};
use blend_models::{
    EraHistogram, FavouriteYear, FilmRecord, Generosity, GuiltyPleasure, Pair, RewatchLeader, RewatchLeaders,
    SharedFilm, Side,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const AGREED_LIMIT: usize = 8;
pub const RECOMMENDATION_LIMIT: usize = 6;
pub const REWATCH_LIMIT: usize = 5;

fn rated_pairs(shared: &[SharedFilm]) -> Vec<(f64, &SharedFilm)> {
    shared
        .iter()
        .filter_map(|film| film.diff.map(|diff| (diff, film)))
        .collect()
}

/// Closest ratings first; among equal gaps the more enthusiastic pair wins.
pub fn agreed(shared: &[SharedFilm], limit: usize) -> Vec<SharedFilm> {
    let mut pairs = rated_pairs(shared);
    pairs.sort_by(|(diff_a, a), (diff_b, b)| {
        diff_a
            .total_cmp(diff_b)
            .then_with(|| b.rating_sum().total_cmp(&a.rating_sum()))
    });
    pairs.into_iter().take(limit).map(|(_, film)| film.clone()).collect()
}

/// Every rated shared film, biggest gap first. Stable for equal gaps.
pub fn clashes(shared: &[SharedFilm]) -> Vec<SharedFilm> {
    let mut pairs = rated_pairs(shared);
    pairs.sort_by(|(diff_a, _), (diff_b, _)| diff_b.total_cmp(diff_a));
    pairs.into_iter().map(|(_, film)| film.clone()).collect()
}

/// A side's rated exclusive films, highest rating first.
pub fn recommendations(exclusive: &[FilmRecord], limit: usize) -> Vec<FilmRecord> {
    let mut rated: Vec<(f64, &FilmRecord)> = exclusive
        .iter()
        .filter_map(|film| film.rating.map(|rating| (rating, film)))
        .collect();
    rated.sort_by(|(a, _), (b, _)| b.total_cmp(a));
    rated.into_iter().take(limit).map(|(_, film)| film.clone()).collect()
}

/// Group by title, sum rewatches and keep the biggest.
pub fn rewatch_leaders(films: &[FilmRecord], limit: usize) -> RewatchLeaders {
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, RewatchLeader> = HashMap::new();

    for film in films {
        let weight = film.rewatch_weight();
        if weight == 0 {
            continue;
        }
        let key = canonical_key(&film.name);
        let key = if key.is_empty() { film.name.clone() } else { key };
        totals
            .entry(key.clone())
            .and_modify(|leader| leader.count += weight)
            .or_insert_with(|| {
                order.push(key);
                RewatchLeader {
                    name: film.name.clone(),
                    count: weight,
                }
            });
    }

    if totals.is_empty() {
        return RewatchLeaders::NoRewatches;
    }

    let mut leaders: Vec<RewatchLeader> = order.iter().filter_map(|key| totals.remove(key)).collect();
    leaders.sort_by(|a, b| b.count.cmp(&a.count));
    leaders.truncate(limit);
    RewatchLeaders::Leaders { films: leaders }
}

fn decade_counts(films: &[FilmRecord]) -> BTreeMap<u16, usize> {
    let mut counts = BTreeMap::new();
    for year in films.iter().filter_map(FilmRecord::release_year) {
        *counts.entry(decade_of(year)).or_insert(0) += 1;
    }
    counts
}

pub fn distinct_decades(films: &[FilmRecord]) -> usize {
    decade_counts(films).len()
}

/// Per-side decade buckets over the union of decades seen on either side.
pub fn era_histogram(films1: &[FilmRecord], films2: &[FilmRecord]) -> EraHistogram {
    let decades = Pair::new(decade_counts(films1), decade_counts(films2));
    let axis: BTreeSet<u16> = decades
        .person1
        .keys()
        .chain(decades.person2.keys())
        .copied()
        .collect();

    EraHistogram {
        decades,
        axis: axis.into_iter().collect(),
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mean of the rated films, 0 when nothing is rated.
pub fn average_rating(films: &[FilmRecord]) -> f64 {
    let ratings: Vec<f64> = films.iter().filter_map(|f| f.rating).collect();
    if ratings.is_empty() {
        0.0
    } else {
        ratings.iter().sum::<f64>() / ratings.len() as f64
    }
}

/// Harsher is the strictly lower average; equal averages name person 2
/// harsher and person 1 kinder.
pub fn generosity(average1: f64, average2: f64) -> Generosity {
    let (harsher, kinder) = if average1 < average2 {
        (Side::Person1, Side::Person2)
    } else {
        (Side::Person2, Side::Person1)
    };
    Generosity {
        gap: round2((average1 - average2).abs()),
        harsher,
        kinder,
    }
}

/// The exclusive film rated furthest above its rater's own average.
/// Earliest film wins a tie.
pub fn guilty_pleasure(exclusive: &[FilmRecord], average: f64) -> Option<GuiltyPleasure> {
    let mut best: Option<GuiltyPleasure> = None;
    for film in exclusive {
        let Some(rating) = film.rating else { continue };
        let above_average = rating - average;
        let better = match &best {
            Some(current) => above_average.total_cmp(&current.above_average) == Ordering::Greater,
            None => true,
        };
        if better {
            best = Some(GuiltyPleasure {
                film: film.clone(),
                above_average: round2(above_average),
            });
        }
    }
    best
}

/// Most-watched release year. Ties go to the most recent year.
pub fn favourite_year(films: &[FilmRecord]) -> Option<FavouriteYear> {
    let mut counts: BTreeMap<u16, usize> = BTreeMap::new();
    for year in films.iter().filter_map(FilmRecord::release_year) {
        *counts.entry(year).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(year_a, count_a), (year_b, count_b)| count_a.cmp(count_b).then(year_a.cmp(year_b)))
        .map(|(year, count)| FavouriteYear { year, count })
}
