//! Letterboxd data export ingestion (`watched.csv`, `ratings.csv`, `diary.csv`).

pub mod parser;

pub use parser::{
    apply_diary_rewatches, load_export_dir, merge_watched_and_ratings, parse_diary, parse_diary_csv,
    parse_films, parse_films_csv, recent_diary, LetterboxdExport,
};
