use crate::error::ProviderError;
use crate::tmdb::api::{MovieDetails, SearchHit, SearchResponse};
use crate::traits::MetadataProvider;
use async_trait::async_trait;
use blend_config::{TmdbConfig, TmdbCredentials};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Thin HTTP client for the TMDB v3 API. One call, one request.
#[derive(Clone)]
pub struct TmdbClient {
    client: Arc<Client>,
    base_url: String,
    credentials: TmdbCredentials,
    include_adult: bool,
}

impl TmdbClient {
    pub fn new(credentials: TmdbCredentials) -> Result<Self, ProviderError> {
        Self::with_base_url(credentials, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(credentials: TmdbCredentials, base_url: &str) -> Result<Self, ProviderError> {
        if !credentials.is_configured() {
            return Err(ProviderError::NotConfigured(
                "set TMDB_API_KEY or TMDB_BEARER_TOKEN, or add tmdb_api_key to credentials.toml".to_string(),
            ));
        }

        Ok(Self {
            client: Arc::new(Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            include_adult: false,
        })
    }

    pub fn from_config(config: &TmdbConfig, credentials: TmdbCredentials) -> Result<Self, ProviderError> {
        if !config.enabled {
            return Err(ProviderError::NotConfigured("tmdb lookups are disabled in config".to_string()));
        }
        let mut client = Self::with_base_url(credentials, &config.base_url)?;
        client.include_adult = config.include_adult;
        Ok(client)
    }

    pub fn search_url(&self, query: &str, year: Option<&str>) -> String {
        let mut url = format!(
            "{}/search/movie?query={}&include_adult={}",
            self.base_url,
            urlencoding::encode(query),
            self.include_adult
        );
        if let Some(key) = &self.credentials.api_key {
            url.push_str(&format!("&api_key={}", urlencoding::encode(key)));
        }
        if let Some(year) = year.filter(|y| !y.is_empty()) {
            url.push_str(&format!("&year={}", urlencoding::encode(year)));
        }
        url
    }

    pub fn details_url(&self, id: u64) -> String {
        let mut url = format!("{}/movie/{}", self.base_url, id);
        if let Some(key) = &self.credentials.api_key {
            url.push_str(&format!("?api_key={}", urlencoding::encode(key)));
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProviderError> {
        let mut request = self.client.get(url).header("Accept", "application/json");
        if let Some(token) = &self.credentials.bearer_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;
        let response = check_status(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    fn provider_name(&self) -> &str {
        "tmdb"
    }

    async fn search_movie(&self, query: &str, year: Option<&str>) -> Result<Vec<SearchHit>, ProviderError> {
        debug!(query = %query, year = ?year, "TMDB search");
        let response: SearchResponse = self.get_json(&self.search_url(query, year)).await?;
        debug!(query = %query, hits = response.results.len(), "TMDB search complete");
        Ok(response.results)
    }

    async fn movie_details(&self, id: u64) -> Result<MovieDetails, ProviderError> {
        debug!(id, "TMDB details");
        self.get_json(&self.details_url(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_only() -> TmdbCredentials {
        TmdbCredentials {
            api_key: Some("abc123".to_string()),
            bearer_token: None,
        }
    }

    #[test]
    fn test_requires_credentials() {
        let result = TmdbClient::new(TmdbCredentials::default());
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }

    #[test]
    fn test_disabled_config_is_not_configured() {
        let config = TmdbConfig {
            enabled: false,
            ..TmdbConfig::default()
        };
        let result = TmdbClient::from_config(&config, key_only());
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }

    #[test]
    fn test_search_url_with_year() {
        let client = TmdbClient::new(key_only()).unwrap();
        assert_eq!(
            client.search_url("Heat", Some("1995")),
            "https://api.themoviedb.org/3/search/movie?query=Heat&include_adult=false&api_key=abc123&year=1995"
        );
    }

    #[test]
    fn test_search_url_encodes_query() {
        let client = TmdbClient::new(key_only()).unwrap();
        let url = client.search_url("Amélie & Co", None);
        assert!(url.contains("query=Am%C3%A9lie%20%26%20Co&"));
        assert!(!url.contains("year="));
    }

    #[test]
    fn test_bearer_only_omits_api_key() {
        let client = TmdbClient::with_base_url(
            TmdbCredentials {
                api_key: None,
                bearer_token: Some("token".to_string()),
            },
            "http://localhost:9999/3/",
        )
        .unwrap();
        assert_eq!(client.details_url(949), "http://localhost:9999/3/movie/949");
        assert!(!client.search_url("Heat", None).contains("api_key"));
    }

    #[test]
    fn test_details_url_with_key() {
        let client = TmdbClient::new(key_only()).unwrap();
        assert_eq!(
            client.details_url(949),
            "https://api.themoviedb.org/3/movie/949?api_key=abc123"
        );
    }
}
