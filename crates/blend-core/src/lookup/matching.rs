use blend_models::normalize::{canonical_key, extract_year};
use blend_sources::SearchHit;

/// Strict best-match policy for a title search.
///
/// Only hits whose title or original title normalizes to exactly the query
/// title qualify. With a year, the hit's release year must equal it (no
/// nearest-year fallback); without one, the first qualifying hit wins.
pub fn select_best_match<'a>(name: &str, year: Option<&str>, hits: &'a [SearchHit]) -> Option<&'a SearchHit> {
    let target = canonical_key(name);
    if target.is_empty() {
        return None;
    }

    let title_matches = |hit: &&SearchHit| {
        [hit.title.as_deref(), hit.original_title.as_deref()]
            .into_iter()
            .flatten()
            .any(|title| canonical_key(title) == target)
    };

    match year.and_then(extract_year) {
        Some(year) => hits
            .iter()
            .filter(title_matches)
            .find(|hit| hit.release_year() == Some(year.as_str())),
        None => hits.iter().find(title_matches),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: u64, title: &str, original: &str, date: &str) -> SearchHit {
        SearchHit {
            id,
            title: Some(title.to_string()),
            original_title: Some(original.to_string()),
            release_date: Some(date.to_string()),
            popularity: 10.0,
            vote_count: 100,
            vote_average: 7.0,
        }
    }

    #[test]
    fn test_year_selects_exact_release() {
        let hits = vec![hit(1, "Heat", "Heat", "2022-03-01"), hit(949, "Heat", "Heat", "1995-12-15")];
        let best = select_best_match("Heat", Some("1995"), &hits).unwrap();
        assert_eq!(best.id, 949);
    }

    #[test]
    fn test_year_mismatch_is_no_match() {
        let hits = vec![hit(1, "Heat", "Heat", "2022-03-01")];
        assert!(select_best_match("Heat", Some("1995"), &hits).is_none());
    }

    #[test]
    fn test_without_year_first_exact_title() {
        let hits = vec![
            hit(5, "Heat Wave", "Heat Wave", "1990-01-01"),
            hit(1, "Heat", "Heat", "2022-03-01"),
            hit(949, "Heat", "Heat", "1995-12-15"),
        ];
        assert_eq!(select_best_match("heat", None, &hits).unwrap().id, 1);
    }

    #[test]
    fn test_original_title_matches() {
        let hits = vec![hit(194, "Amelie", "Le Fabuleux Destin d'Amélie Poulain", "2001-04-25")];
        assert_eq!(
            select_best_match("Le fabuleux destin d'Amelie Poulain", Some("2001"), &hits).unwrap().id,
            194
        );
    }

    #[test]
    fn test_near_title_rejected() {
        let hits = vec![hit(2, "Heat 2", "Heat 2", "1995-01-01")];
        assert!(select_best_match("Heat", Some("1995"), &hits).is_none());
    }

    #[test]
    fn test_year_taken_from_date_string() {
        let hits = vec![hit(949, "Heat", "Heat", "1995-12-15")];
        assert!(select_best_match("Heat", Some("1995-12-15"), &hits).is_some());
    }
}
