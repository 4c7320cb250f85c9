//! In-process `MetadataProvider` for tests. Counts calls and can fail on demand.

use async_trait::async_trait;
use blend_models::normalize::canonical_key;
use blend_sources::{MetadataProvider, MovieDetails, ProviderError, SearchHit};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::time::Instant;

#[derive(Default)]
pub struct FakeProvider {
    search_results: HashMap<String, Vec<SearchHit>>,
    details: HashMap<u64, MovieDetails>,
    failing: HashSet<String>,
    fail_everything: bool,
    search_calls: AtomicUsize,
    detail_calls: AtomicUsize,
    call_times: Mutex<Vec<Instant>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a film that searches for `title` will return.
    pub fn with_film(mut self, id: u64, title: &str, date: &str, runtime: u32, popularity: f64, votes: u64) -> Self {
        self.search_results
            .entry(canonical_key(title))
            .or_default()
            .push(SearchHit {
                id,
                title: Some(title.to_string()),
                original_title: Some(title.to_string()),
                release_date: Some(date.to_string()),
                popularity,
                vote_count: votes,
                vote_average: 7.0,
            });
        self.details.insert(
            id,
            MovieDetails {
                id,
                title: Some(title.to_string()),
                runtime: Some(runtime),
                ..MovieDetails::default()
            },
        );
        self
    }

    pub fn failing_on(mut self, title: &str) -> Self {
        self.failing.insert(canonical_key(title));
        self
    }

    pub fn failing_everything(mut self) -> Self {
        self.fail_everything = true;
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }

    fn record_call(&self) {
        self.call_times.lock().unwrap().push(Instant::now());
    }
}

#[async_trait]
impl MetadataProvider for FakeProvider {
    fn provider_name(&self) -> &str {
        "fake"
    }

    async fn search_movie(&self, query: &str, _year: Option<&str>) -> Result<Vec<SearchHit>, ProviderError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.record_call();
        let key = canonical_key(query);
        if self.fail_everything || self.failing.contains(&key) {
            return Err(ProviderError::Status {
                status: 503,
                body: format!("search failed for {}", query),
            });
        }
        Ok(self.search_results.get(&key).cloned().unwrap_or_default())
    }

    async fn movie_details(&self, id: u64) -> Result<MovieDetails, ProviderError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.record_call();
        if self.fail_everything {
            return Err(ProviderError::Status {
                status: 503,
                body: "down".to_string(),
            });
        }
        self.details
            .get(&id)
            .cloned()
            .ok_or_else(|| ProviderError::Status {
                status: 404,
                body: "not found".to_string(),
            })
    }
}
