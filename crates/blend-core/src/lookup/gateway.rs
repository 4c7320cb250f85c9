use crate::error::GatewayError;
use crate::lookup::dispatch::DispatchQueue;
use crate::lookup::matching::select_best_match;
use crate::lookup::ttl_cache::TtlCache;
use blend_config::TmdbConfig;
use blend_models::{Candidate, MetadataRecord};
use blend_sources::{MetadataProvider, MovieDetails, ProviderError};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_CALLS_PER_SECOND: u32 = 40;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(6 * 60 * 60);

#[derive(Debug, Clone, Copy)]
pub struct GatewayOptions {
    pub max_calls_per_second: u32,
    pub cache_ttl: Duration,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            max_calls_per_second: DEFAULT_MAX_CALLS_PER_SECOND,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl From<&TmdbConfig> for GatewayOptions {
    fn from(config: &TmdbConfig) -> Self {
        Self {
            max_calls_per_second: config.max_calls_per_second,
            cache_ttl: Duration::from_secs(config.cache_ttl_hours.saturating_mul(60 * 60)),
        }
    }
}

/// Rate-limited, cached resolver from (title, year) to popularity metadata.
///
/// One instance per process, shared by reference (or `Arc`) between callers:
/// it owns the dispatch queue and both caches.
pub struct LookupGateway {
    provider: Arc<dyn MetadataProvider>,
    queue: DispatchQueue,
    search_cache: TtlCache<String, Option<MetadataRecord>>,
    details_cache: TtlCache<u64, MovieDetails>,
}

impl LookupGateway {
    pub fn new(provider: Arc<dyn MetadataProvider>, options: GatewayOptions) -> Self {
        Self {
            provider,
            queue: DispatchQueue::per_second(options.max_calls_per_second),
            search_cache: TtlCache::new(options.cache_ttl),
            details_cache: TtlCache::new(options.cache_ttl),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// Outbound calls released through the dispatch queue so far.
    pub fn dispatch_count(&self) -> u64 {
        self.queue.dispatched()
    }

    /// Resolve one candidate. `Ok(None)` means no confident match (or it was
    /// too short); `Err` is an upstream failure.
    pub async fn resolve(
        &self,
        candidate: &Candidate,
        min_runtime_minutes: u32,
    ) -> Result<Option<MetadataRecord>, ProviderError> {
        let year = candidate.year_token();
        let record_key = candidate.lookup_key();
        let cache_key = format!("{}:{}", record_key, min_runtime_minutes);

        // A stricter runtime threshold misses through its own key, so a cached
        // outcome is always valid for this query. `None` is a cached no-match.
        if let Some(cached) = self.search_cache.get(&cache_key).await {
            debug!(key = %cache_key, matched = cached.is_some(), "Search cache hit");
            return Ok(cached);
        }

        let hits = self
            .queue
            .run(self.provider.search_movie(&candidate.name, year.as_deref()))
            .await?;

        let Some(best) = select_best_match(&candidate.name, year.as_deref(), &hits).filter(|hit| hit.id != 0) else {
            debug!(title = %candidate.name, year = ?year, hits = hits.len(), "No match");
            self.search_cache.insert(cache_key, None).await;
            return Ok(None);
        };

        let details = match self.details_cache.get(&best.id).await {
            Some(details) => {
                debug!(id = best.id, "Details cache hit");
                details
            }
            None => {
                let details = self.queue.run(self.provider.movie_details(best.id)).await?;
                self.details_cache.insert(best.id, details.clone()).await;
                details
            }
        };

        let runtime = details.runtime_minutes();
        if min_runtime_minutes > 0 && runtime < min_runtime_minutes {
            debug!(title = %candidate.name, runtime, min_runtime_minutes, "Match below runtime threshold");
            self.search_cache.insert(cache_key, None).await;
            return Ok(None);
        }

        let record = MetadataRecord {
            key: record_key,
            input_name: candidate.name.clone(),
            input_year: year.clone(),
            resolved_id: best.id,
            title: best.title.clone().unwrap_or_else(|| candidate.name.clone()),
            year: best
                .release_year()
                .map(str::to_string)
                .or(year)
                .unwrap_or_default(),
            popularity: best.popularity.max(0.0),
            vote_count: best.vote_count,
            vote_average: best.vote_average,
            runtime,
        };
        self.search_cache.insert(cache_key, Some(record.clone())).await;
        Ok(Some(record))
    }

    /// Resolve a batch, one output slot per input candidate in input order.
    ///
    /// Identical (title, year) pairs are looked up once. Blank names and
    /// per-candidate failures become `None`. The batch itself fails only when
    /// every lookup it attempted failed upstream.
    pub async fn resolve_batch(
        &self,
        candidates: &[Candidate],
        min_runtime_minutes: u32,
    ) -> Result<Vec<Option<MetadataRecord>>, GatewayError> {
        let mut unique: Vec<Candidate> = Vec::new();
        let mut slot_of_key: HashMap<String, usize> = HashMap::new();
        let slots: Vec<Option<usize>> = candidates
            .iter()
            .map(|candidate| {
                let name = candidate.name.trim();
                if name.is_empty() {
                    return None;
                }
                let normalized = Candidate {
                    name: name.to_string(),
                    year: candidate.year_token(),
                };
                let key = normalized.lookup_key();
                Some(*slot_of_key.entry(key).or_insert_with(|| {
                    unique.push(normalized);
                    unique.len() - 1
                }))
            })
            .collect();

        let outcomes = join_all(
            unique
                .iter()
                .map(|candidate| self.resolve(candidate, min_runtime_minutes)),
        )
        .await;

        let mut failures = 0usize;
        let mut last_error = None;
        let resolved: Vec<Option<MetadataRecord>> = outcomes
            .into_iter()
            .zip(&unique)
            .map(|(outcome, candidate)| match outcome {
                Ok(record) => record,
                Err(e) => {
                    warn!(title = %candidate.name, year = ?candidate.year, error = %e, "Metadata lookup failed");
                    failures += 1;
                    last_error = Some(e);
                    None
                }
            })
            .collect();

        if let Some(error) = last_error.as_ref().filter(|_| failures == unique.len()) {
            return Err(GatewayError::unavailable(failures, error));
        }

        info!(
            candidates = candidates.len(),
            unique = unique.len(),
            resolved = resolved.iter().filter(|r| r.is_some()).count(),
            failed = failures,
            dispatched = self.queue.dispatched(),
            "Metadata batch resolved"
        );

        Ok(slots
            .into_iter()
            .map(|slot| slot.and_then(|i| resolved[i].clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests;
