use anyhow::{anyhow, Context, Result};
use blend_models::film::{parse_flag, parse_rating};
use blend_models::normalize::canonical_key;
use blend_models::{DiaryEntry, FilmRecord};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const WATCHED_FILE: &str = "watched.csv";
const RATINGS_FILE: &str = "ratings.csv";
const DIARY_FILE: &str = "diary.csv";

/// Column lookup by header name; the export's column order is not stable.
struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let index: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().trim_start_matches('\u{feff}').to_string(), i))
            .collect();

        if !index.contains_key("Name") {
            let available: Vec<&str> = headers.iter().collect();
            return Err(anyhow!("Missing required column: Name. Available columns: {:?}", available));
        }
        Ok(Self { index })
    }

    fn get<'r>(&self, record: &'r StringRecord, column: &str) -> Option<&'r str> {
        self.index
            .get(column)
            .and_then(|&i| record.get(i))
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Parse a film list (`watched.csv`, `ratings.csv` or any CSV with a `Name`
/// column). Rows without a name are dropped.
pub fn parse_films<R: Read>(reader: R) -> Result<Vec<FilmRecord>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = Columns::from_headers(reader.headers()?)?;

    let mut films = Vec::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        let record = result?;
        let Some(name) = columns.get(&record, "Name") else {
            skipped += 1;
            continue;
        };

        let mut film = FilmRecord::new(
            name,
            columns.get(&record, "Year"),
            columns.get(&record, "Rating").and_then(parse_rating),
        );
        film.rewatched = columns.get(&record, "Rewatch").map(parse_flag).unwrap_or(false);
        films.push(film);
    }

    if skipped > 0 {
        debug!(skipped, "Skipped rows without a film name");
    }
    Ok(films)
}

pub fn parse_films_csv<P: AsRef<Path>>(path: P) -> Result<Vec<FilmRecord>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let films = parse_films(file).with_context(|| format!("Failed to parse {}", path.display()))?;
    debug!(path = %path.display(), films = films.len(), "Parsed film list");
    Ok(films)
}

/// Parse `diary.csv`. The watch date comes from `Watched Date`, falling back
/// to the logging `Date`.
pub fn parse_diary<R: Read>(reader: R) -> Result<Vec<DiaryEntry>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = Columns::from_headers(reader.headers()?)?;

    let mut entries = Vec::new();
    for result in reader.records() {
        let record = result?;
        let Some(name) = columns.get(&record, "Name") else {
            continue;
        };

        let watched_date = columns
            .get(&record, "Watched Date")
            .or_else(|| columns.get(&record, "Date"))
            .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok());

        entries.push(DiaryEntry {
            name: name.to_string(),
            year: columns.get(&record, "Year").map(str::to_string),
            rating: columns.get(&record, "Rating").and_then(parse_rating),
            watched_date,
            rewatch: columns.get(&record, "Rewatch").map(parse_flag).unwrap_or(false),
        });
    }
    Ok(entries)
}

pub fn parse_diary_csv<P: AsRef<Path>>(path: P) -> Result<Vec<DiaryEntry>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    parse_diary(file).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Inject ratings into a watched list by canonical title. A rating already
/// present on the watched record wins.
pub fn merge_watched_and_ratings(watched: Vec<FilmRecord>, ratings: &[FilmRecord]) -> Vec<FilmRecord> {
    let rating_by_key: HashMap<String, f64> = ratings
        .iter()
        .filter_map(|film| film.rating.map(|rating| (film.key(), rating)))
        .collect();

    watched
        .into_iter()
        .map(|mut film| {
            if film.rating.is_none() {
                film.rating = rating_by_key.get(&film.key()).copied();
            }
            film
        })
        .collect()
}

/// Count diary rows flagged as rewatches against the matching film.
pub fn apply_diary_rewatches(films: &mut [FilmRecord], diary: &[DiaryEntry]) {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for entry in diary.iter().filter(|e| e.rewatch) {
        *counts.entry(canonical_key(&entry.name)).or_default() += 1;
    }
    if counts.is_empty() {
        return;
    }

    for film in films.iter_mut() {
        if let Some(&count) = counts.get(&film.key()) {
            film.rewatch_count = film.rewatch_count.max(count);
            film.rewatched = true;
        }
    }
}

/// Most recent `limit` diary entries, newest first. Undated rows sort last.
pub fn recent_diary(diary: &[DiaryEntry], limit: usize) -> Vec<DiaryEntry> {
    let mut entries = diary.to_vec();
    entries.sort_by(|a, b| b.watched_date.cmp(&a.watched_date));
    entries.truncate(limit);
    entries
}

/// Everything read from one person's unzipped export directory.
#[derive(Debug, Clone, Default)]
pub struct LetterboxdExport {
    pub films: Vec<FilmRecord>,
    pub diary: Vec<DiaryEntry>,
}

/// Load an unzipped export directory. `watched.csv` is the base list when
/// present, otherwise `ratings.csv`; ratings are merged in and diary
/// rewatches applied. A plain CSV file path is accepted as a single list.
pub fn load_export_dir<P: AsRef<Path>>(path: P) -> Result<LetterboxdExport> {
    let path = path.as_ref();
    if path.is_file() {
        return Ok(LetterboxdExport {
            films: parse_films_csv(path)?,
            diary: Vec::new(),
        });
    }
    if !path.is_dir() {
        return Err(anyhow!("Export path not found: {}", path.display()));
    }

    let existing = |name: &str| -> Option<PathBuf> {
        let candidate = path.join(name);
        candidate.is_file().then_some(candidate)
    };

    let ratings = match existing(RATINGS_FILE) {
        Some(file) => parse_films_csv(file)?,
        None => Vec::new(),
    };

    let films = match existing(WATCHED_FILE) {
        Some(file) => merge_watched_and_ratings(parse_films_csv(file)?, &ratings),
        None if !ratings.is_empty() => {
            warn!(dir = %path.display(), "No watched.csv, using ratings.csv as the film list");
            ratings
        }
        None => {
            return Err(anyhow!(
                "No {} or {} found in {}",
                WATCHED_FILE,
                RATINGS_FILE,
                path.display()
            ))
        }
    };

    let diary = match existing(DIARY_FILE) {
        Some(file) => parse_diary_csv(file)?,
        None => Vec::new(),
    };

    let mut films = films;
    apply_diary_rewatches(&mut films, &diary);

    info!(
        dir = %path.display(),
        films = films.len(),
        rated = films.iter().filter(|f| f.is_rated()).count(),
        diary = diary.len(),
        "Loaded Letterboxd export"
    );
    Ok(LetterboxdExport { films, diary })
}

#[cfg(test)]
mod tests;
