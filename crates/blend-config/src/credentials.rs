use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;

const TMDB_API_KEY: &str = "tmdb_api_key";
const TMDB_BEARER_TOKEN: &str = "tmdb_bearer_token";

const API_KEY_ENV: &[&str] = &["TMDB_API_KEY"];
const BEARER_ENV: &[&str] = &["TMDB_BEARER_TOKEN", "TMDB_READ_ACCESS_TOKEN"];

/// Flat `key = "value"` TOML file kept next to the config file.
#[derive(Debug, Default)]
pub struct CredentialStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            entries: BTreeMap::new(),
        }
    }

    /// A missing file leaves the store empty.
    pub fn load(&mut self) -> Result<()> {
        if !self.path.is_file() {
            return Ok(());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        self.entries = toml::from_str(&raw).with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, toml::to_string(&self.entries)?)
            .with_context(|| format!("writing {}", self.path.display()))
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.entries.get(key)
    }

    pub fn set(&mut self, key: String, value: String) {
        self.entries.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    pub fn get_tmdb_api_key(&self) -> Option<&String> {
        self.get(TMDB_API_KEY)
    }

    pub fn set_tmdb_api_key(&mut self, key: String) {
        self.set(TMDB_API_KEY.into(), key);
    }

    pub fn get_tmdb_bearer_token(&self) -> Option<&String> {
        self.get(TMDB_BEARER_TOKEN)
    }

    pub fn set_tmdb_bearer_token(&mut self, token: String) {
        self.set(TMDB_BEARER_TOKEN.into(), token);
    }
}

/// Static key and/or bearer credential for the metadata service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TmdbCredentials {
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
}

impl TmdbCredentials {
    /// Environment variables first, then the credential store.
    pub fn resolve(store: Option<&CredentialStore>) -> Self {
        Self::resolve_with(|name| std::env::var(name).ok(), store)
    }

    pub fn resolve_with<F>(env: F, store: Option<&CredentialStore>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_env = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| env(name))
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty())
        };
        let from_store = |value: Option<&String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            api_key: from_env(API_KEY_ENV).or_else(|| from_store(store.and_then(|s| s.get_tmdb_api_key()))),
            bearer_token: from_env(BEARER_ENV).or_else(|| from_store(store.and_then(|s| s.get_tmdb_bearer_token()))),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() || self.bearer_token.is_some()
    }
}
