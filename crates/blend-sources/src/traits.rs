use async_trait::async_trait;

use crate::error::ProviderError;
use crate::tmdb::api::{MovieDetails, SearchHit};

/// External title-search + details service consumed by the lookup gateway.
///
/// Implementations perform exactly one outbound request per call; throttling,
/// caching and match selection belong to the caller.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    fn provider_name(&self) -> &str;

    /// Title search, optionally narrowed to a release year
    async fn search_movie(&self, query: &str, year: Option<&str>) -> Result<Vec<SearchHit>, ProviderError>;

    async fn movie_details(&self, id: u64) -> Result<MovieDetails, ProviderError>;
}
