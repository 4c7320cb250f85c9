use super::*;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const WATCHED: &str = "Date,Name,Year,Letterboxd URI
2023-01-02,Arrival,2016,https://boxd.it/a
2023-01-03,Heat,1995,https://boxd.it/b
2023-01-04,,2001,https://boxd.it/c
2023-01-05,\"Crouching Tiger, Hidden Dragon\",2000,https://boxd.it/d
";

const RATINGS: &str = "Date,Name,Year,Letterboxd URI,Rating
2023-01-02,Arrival,2016,https://boxd.it/a,4.5
2023-01-05,\"CROUCHING TIGER HIDDEN DRAGON\",2000,https://boxd.it/d,3
";

const DIARY: &str = "Date,Name,Year,Letterboxd URI,Rating,Rewatch,Tags,Watched Date
2023-02-01,Heat,1995,https://boxd.it/e,5,Yes,,2023-01-30
2023-02-10,Arrival,2016,https://boxd.it/f,4.5,,,2023-02-09
2023-03-01,Heat,1995,https://boxd.it/g,4.5,Yes,,
2023-01-01,Paddington 2,2017,https://boxd.it/h,,No,,2022-12-31
";

fn write_csv(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

#[test]
fn test_parse_films_csv() {
    let file = write_csv(WATCHED);
    let films = parse_films_csv(file.path()).unwrap();

    assert_eq!(films.len(), 3);
    assert_eq!(films[0].name, "Arrival");
    assert_eq!(films[0].year.as_deref(), Some("2016"));
    assert_eq!(films[0].rating, None);
    assert_eq!(films[2].name, "Crouching Tiger, Hidden Dragon");
}

#[test]
fn test_missing_name_column_is_error() {
    let result = parse_films("Title,Year\nArrival,2016\n".as_bytes());
    let err = result.unwrap_err().to_string();
    assert!(err.contains("Name"), "unexpected error: {}", err);
}

#[test]
fn test_ratings_parsed_and_out_of_range_dropped() {
    let csv = "Name,Year,Rating\nArrival,2016,4.5\nHeat,1995,\nCats,2019,9\n";
    let films = parse_films(csv.as_bytes()).unwrap();
    assert_eq!(films[0].rating, Some(4.5));
    assert_eq!(films[1].rating, None);
    assert_eq!(films[2].rating, None);
}

#[test]
fn test_short_rows_are_tolerated() {
    let csv = "Date,Name,Year,Letterboxd URI,Rating\n2023-01-01,Arrival\n";
    let films = parse_films(csv.as_bytes()).unwrap();
    assert_eq!(films.len(), 1);
    assert_eq!(films[0].year, None);
}

#[test]
fn test_merge_watched_and_ratings() {
    let watched = parse_films(WATCHED.as_bytes()).unwrap();
    let ratings = parse_films(RATINGS.as_bytes()).unwrap();
    let merged = merge_watched_and_ratings(watched, &ratings);

    assert_eq!(merged.len(), 3);
    assert_eq!(merged[0].rating, Some(4.5));
    assert_eq!(merged[1].rating, None);
    // Matched through the canonical key despite punctuation and case
    assert_eq!(merged[2].rating, Some(3.0));
}

#[test]
fn test_merge_keeps_existing_rating() {
    let watched = vec![FilmRecord::new("Heat", Some("1995"), Some(5.0))];
    let ratings = vec![FilmRecord::new("Heat", Some("1995"), Some(2.0))];
    let merged = merge_watched_and_ratings(watched, &ratings);
    assert_eq!(merged[0].rating, Some(5.0));
}

#[test]
fn test_parse_diary_dates_and_rewatches() {
    let diary = parse_diary(DIARY.as_bytes()).unwrap();
    assert_eq!(diary.len(), 4);
    assert_eq!(diary[0].watched_date, NaiveDate::from_ymd_opt(2023, 1, 30));
    assert!(diary[0].rewatch);
    // Falls back to the logging date
    assert_eq!(diary[2].watched_date, NaiveDate::from_ymd_opt(2023, 3, 1));
    assert!(!diary[3].rewatch);
    assert_eq!(diary[3].rating, None);
}

#[test]
fn test_apply_diary_rewatches() {
    let diary = parse_diary(DIARY.as_bytes()).unwrap();
    let mut films = parse_films(WATCHED.as_bytes()).unwrap();
    apply_diary_rewatches(&mut films, &diary);

    let heat = films.iter().find(|f| f.name == "Heat").unwrap();
    assert_eq!(heat.rewatch_count, 2);
    assert!(heat.rewatched);

    let arrival = films.iter().find(|f| f.name == "Arrival").unwrap();
    assert_eq!(arrival.rewatch_weight(), 0);
}

#[test]
fn test_recent_diary_newest_first() {
    let diary = parse_diary(DIARY.as_bytes()).unwrap();
    let recent = recent_diary(&diary, 2);

    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].name, "Heat");
    assert_eq!(recent[0].watched_date, NaiveDate::from_ymd_opt(2023, 3, 1));
    assert_eq!(recent[1].name, "Arrival");
}

#[test]
fn test_recent_diary_undated_last() {
    let diary = vec![
        DiaryEntry {
            name: "Undated".to_string(),
            year: None,
            rating: None,
            watched_date: None,
            rewatch: false,
        },
        DiaryEntry {
            name: "Dated".to_string(),
            year: None,
            rating: None,
            watched_date: NaiveDate::from_ymd_opt(2020, 5, 1),
            rewatch: false,
        },
    ];
    let recent = recent_diary(&diary, 5);
    assert_eq!(recent[0].name, "Dated");
    assert_eq!(recent[1].name, "Undated");
}

#[test]
fn test_load_export_dir() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("watched.csv"), WATCHED).unwrap();
    std::fs::write(dir.path().join("ratings.csv"), RATINGS).unwrap();
    std::fs::write(dir.path().join("diary.csv"), DIARY).unwrap();

    let export = load_export_dir(dir.path()).unwrap();
    assert_eq!(export.films.len(), 3);
    assert_eq!(export.diary.len(), 4);
    assert_eq!(export.films[0].rating, Some(4.5));
    assert_eq!(export.films[1].rewatch_count, 2);
}

#[test]
fn test_load_export_dir_ratings_only() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("ratings.csv"), RATINGS).unwrap();

    let export = load_export_dir(dir.path()).unwrap();
    assert_eq!(export.films.len(), 2);
    assert!(export.diary.is_empty());
}

#[test]
fn test_load_export_dir_empty_is_error() {
    let dir = TempDir::new().unwrap();
    assert!(load_export_dir(dir.path()).is_err());
}

#[test]
fn test_load_single_csv_file() {
    let file = write_csv(RATINGS);
    let export = load_export_dir(file.path()).unwrap();
    assert_eq!(export.films.len(), 2);
}
