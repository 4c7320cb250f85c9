use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub blend: BlendConfig,
}

/// Metadata lookup gateway settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmdbConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,
    /// Global outbound call ceiling; dispatches are spaced by `ceil(1000 / n)` ms
    #[serde(default = "default_max_calls_per_second")]
    pub max_calls_per_second: u32,
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,
    /// Resolved films shorter than this are discarded (shorts, specials)
    #[serde(default = "default_min_runtime_minutes")]
    pub min_runtime_minutes: u32,
    #[serde(default)]
    pub include_adult: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    #[serde(default = "default_session_ttl_seconds")]
    pub ttl_seconds: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
    /// Multiplier applied to the poll interval after each empty poll
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    #[serde(default = "default_max_poll_interval_ms")]
    pub max_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlendConfig {
    /// Diary entries shown per side in the recency list
    #[serde(default = "default_recent_count")]
    pub recent_count: usize,
    /// Clashes shown by the CLI (the engine keeps the full list)
    #[serde(default = "default_clash_count")]
    pub clash_count: usize,
}

fn default_true() -> bool {
    true
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_max_calls_per_second() -> u32 {
    40
}

fn default_cache_ttl_hours() -> u64 {
    6
}

fn default_min_runtime_minutes() -> u32 {
    45
}

fn default_session_ttl_seconds() -> u64 {
    60 * 60 * 24
}

fn default_poll_interval_ms() -> u64 {
    2500
}

fn default_max_poll_attempts() -> u32 {
    120
}

fn default_backoff_factor() -> f64 {
    1.0
}

fn default_max_poll_interval_ms() -> u64 {
    10_000
}

fn default_recent_count() -> usize {
    5
}

fn default_clash_count() -> usize {
    5
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            base_url: default_tmdb_base_url(),
            max_calls_per_second: default_max_calls_per_second(),
            cache_ttl_hours: default_cache_ttl_hours(),
            min_runtime_minutes: default_min_runtime_minutes(),
            include_adult: false,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_session_ttl_seconds(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            backoff_factor: default_backoff_factor(),
            max_poll_interval_ms: default_max_poll_interval_ms(),
        }
    }
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            recent_count: default_recent_count(),
            clash_count: default_clash_count(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let config = Self::load_from_file(path)?;
            config.validate()?;
            Ok(config)
        } else {
            debug!("No config file at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.tmdb.max_calls_per_second == 0 {
            return Err(anyhow::anyhow!("tmdb.max_calls_per_second must be greater than zero"));
        }
        if self.tmdb.cache_ttl_hours == 0 {
            return Err(anyhow::anyhow!("tmdb.cache_ttl_hours must be greater than zero"));
        }
        if self.tmdb.base_url.trim().is_empty() {
            return Err(anyhow::anyhow!("tmdb.base_url cannot be empty"));
        }
        if self.session.max_poll_attempts == 0 {
            return Err(anyhow::anyhow!("session.max_poll_attempts must be greater than zero"));
        }
        if !(self.session.backoff_factor >= 1.0) {
            return Err(anyhow::anyhow!("session.backoff_factor must be at least 1.0"));
        }
        if self.session.max_poll_interval_ms < self.session.poll_interval_ms {
            return Err(anyhow::anyhow!("session.max_poll_interval_ms must not be below poll_interval_ms"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.tmdb.max_calls_per_second = 10;
        config.tmdb.min_runtime_minutes = 60;
        config.session.backoff_factor = 1.5;

        config.save_to_file(file.path()).unwrap();

        let loaded = Config::load_from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.tmdb.max_calls_per_second, 10);
        assert_eq!(loaded.session.backoff_factor, 1.5);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[tmdb]\nmin_runtime_minutes = 30\n").unwrap();

        let loaded = Config::load_from_file(file.path()).unwrap();
        assert_eq!(loaded.tmdb.min_runtime_minutes, 30);
        assert_eq!(loaded.tmdb.max_calls_per_second, 40);
        assert_eq!(loaded.tmdb.cache_ttl_hours, 6);
        assert_eq!(loaded.session, SessionConfig::default());
        assert_eq!(loaded.blend.recent_count, 5);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_config_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.tmdb.max_calls_per_second = 0;
        assert!(config.validate().is_err());
        config.tmdb.max_calls_per_second = 40;

        config.session.backoff_factor = 0.5;
        assert!(config.validate().is_err());
        config.session.backoff_factor = 2.0;
        assert!(config.validate().is_ok());

        config.session.max_poll_interval_ms = 100;
        assert!(config.validate().is_err());
    }
}
