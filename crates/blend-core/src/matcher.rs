use blend_models::{FilmRecord, SharedFilm};
use std::collections::HashMap;

/// Output of [`match_collections`].
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    /// One comparison per key present on both sides, in collection 1 order
    pub shared: Vec<SharedFilm>,
    pub exclusive1: Vec<FilmRecord>,
    pub exclusive2: Vec<FilmRecord>,
    /// `|shared| / max(|c1|, |c2|)`, 0 when both are empty
    pub overlap_ratio: f64,
}

/// Key → record map that remembers first-insertion order.
/// A later duplicate key replaces the record but keeps its original slot.
/// Titles whose key is empty (e.g. non-Latin scripts) can't be compared and
/// are held aside as always-exclusive.
struct KeyedFilms<'a> {
    order: Vec<String>,
    by_key: HashMap<String, &'a FilmRecord>,
    unkeyed: Vec<&'a FilmRecord>,
}

impl<'a> KeyedFilms<'a> {
    fn build(films: &'a [FilmRecord]) -> Self {
        let mut order = Vec::with_capacity(films.len());
        let mut by_key = HashMap::with_capacity(films.len());
        let mut unkeyed = Vec::new();
        for film in films {
            let key = film.key();
            if key.is_empty() {
                unkeyed.push(film);
            } else if by_key.insert(key.clone(), film).is_none() {
                order.push(key);
            }
        }
        Self { order, by_key, unkeyed }
    }

    fn len(&self) -> usize {
        self.order.len() + self.unkeyed.len()
    }

    fn get(&self, key: &str) -> Option<&'a FilmRecord> {
        self.by_key.get(key).copied()
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &'a FilmRecord)> + '_ {
        self.order
            .iter()
            .filter_map(|key| self.by_key.get(key).map(|film| (key.as_str(), *film)))
    }
}

/// Partition two collections into shared and exclusive films by canonical key.
///
/// Duplicate keys within one side collapse (last write wins), for shared and
/// exclusive films alike. The overlap denominator is the size of each side's
/// key map, so duplicates don't dilute it.
pub fn match_collections(collection1: &[FilmRecord], collection2: &[FilmRecord]) -> MatchOutcome {
    let side1 = KeyedFilms::build(collection1);
    let side2 = KeyedFilms::build(collection2);

    let mut shared = Vec::new();
    let mut exclusive1 = Vec::new();
    for (key, film1) in side1.iter() {
        match side2.get(key) {
            Some(film2) => shared.push(SharedFilm::new(
                film1.name.clone(),
                film1.year.clone(),
                film1.rating,
                film2.rating,
            )),
            None => exclusive1.push(film1.clone()),
        }
    }
    exclusive1.extend(side1.unkeyed.iter().map(|film| (*film).clone()));

    let mut exclusive2: Vec<FilmRecord> = side2
        .iter()
        .filter(|(key, _)| side1.get(key).is_none())
        .map(|(_, film)| film.clone())
        .collect();
    exclusive2.extend(side2.unkeyed.iter().map(|film| (*film).clone()));

    let denominator = side1.len().max(side2.len());
    let overlap_ratio = if denominator == 0 {
        0.0
    } else {
        (shared.len() as f64 / denominator as f64).clamp(0.0, 1.0)
    };

    MatchOutcome {
        shared,
        exclusive1,
        exclusive2,
        overlap_ratio,
    }
}
