use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Canonical matching key for a film title.
///
/// Lowercases, folds diacritics (NFKD with combining marks dropped) and keeps
/// only `[a-z0-9]`. "Amélie" and "AMELIE!!" both become `amelie`.
/// Total function: an empty or all-punctuation name yields an empty key.
pub fn canonical_key(name: &str) -> String {
    name.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// First four consecutive ASCII digits in a free-form year/date string.
///
/// `"2016-11-11"` → `"2016"`, `"released 1995"` → `"1995"`, `"n/a"` → `None`.
pub fn extract_year(value: &str) -> Option<String> {
    let mut run = 0;
    for (i, b) in value.bytes().enumerate() {
        if b.is_ascii_digit() {
            run += 1;
            if run == 4 {
                return Some(value[i - 3..=i].to_string());
            }
        } else {
            run = 0;
        }
    }
    None
}

/// Numeric form of [`extract_year`].
pub fn year_number(value: &str) -> Option<u16> {
    extract_year(value).and_then(|y| y.parse().ok())
}

pub fn decade_of(year: u16) -> u16 {
    year / 10 * 10
}

/// Dedup/cache key combining the canonical title with the extracted year:
/// `"heat:1995"`, or `"heat:"` when no year could be extracted.
pub fn lookup_key(name: &str, year: Option<&str>) -> String {
    let year = year.and_then(extract_year).unwrap_or_default();
    format!("{}:{}", canonical_key(name), year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_canonical_key_strips_case_and_punctuation() {
        assert_eq!(canonical_key("Arrival"), "arrival");
        assert_eq!(canonical_key("arrival"), "arrival");
        assert_eq!(canonical_key("Spider-Man: Into the Spider-Verse"), "spidermanintothespiderverse");
        assert_eq!(canonical_key("WALL·E"), "walle");
        assert_eq!(canonical_key("2001: A Space Odyssey"), "2001aspaceodyssey");
    }

    #[test]
    fn test_canonical_key_folds_diacritics() {
        assert_eq!(canonical_key("Amélie"), "amelie");
        assert_eq!(canonical_key("AMELIE!!"), "amelie");
        assert_eq!(canonical_key("Léon: The Professional"), "leontheprofessional");
    }

    #[test]
    fn test_canonical_key_empty() {
        assert_eq!(canonical_key(""), "");
        assert_eq!(canonical_key("!?"), "");
        // Non-Latin scripts have no ASCII folding and collapse to empty
        assert_eq!(canonical_key("千と千尋"), "");
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year("2016"), Some("2016".to_string()));
        assert_eq!(extract_year("2016-11-11"), Some("2016".to_string()));
        assert_eq!(extract_year("released 1995 (US)"), Some("1995".to_string()));
        assert_eq!(extract_year("95"), None);
        assert_eq!(extract_year(""), None);
        assert_eq!(extract_year("12-3456"), Some("3456".to_string()));
    }

    #[test]
    fn test_year_number_and_decade() {
        assert_eq!(year_number("1999-01-01"), Some(1999));
        assert_eq!(year_number("unknown"), None);
        assert_eq!(decade_of(1999), 1990);
        assert_eq!(decade_of(2000), 2000);
    }

    #[test]
    fn test_lookup_key() {
        assert_eq!(lookup_key("Heat", Some("1995")), "heat:1995");
        assert_eq!(lookup_key("HEAT!", Some("1995-12-15")), "heat:1995");
        assert_eq!(lookup_key("Heat", None), "heat:");
        assert_eq!(lookup_key("Heat", Some("tba")), "heat:");
    }

    proptest! {
        #[test]
        fn canonical_key_ignores_case_and_punctuation(
            title in "[A-Za-z0-9 ]{1,24}",
            noise in "[!?.,:;'\\- ]{0,6}"
        ) {
            let shouted = format!("{}{}", title.to_uppercase(), noise);
            prop_assert_eq!(canonical_key(&title), canonical_key(&shouted));
        }

        #[test]
        fn canonical_key_is_idempotent(title in "\\PC{0,32}") {
            let once = canonical_key(&title);
            prop_assert_eq!(canonical_key(&once), once.clone());
            prop_assert!(once.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }
}
