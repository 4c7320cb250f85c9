pub mod blend;
pub mod config;
pub mod render;
pub mod session;

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

use blend_config::{Config, CredentialStore, PathManager, TmdbCredentials};
use blend_core::{GatewayOptions, LookupGateway};
use blend_sources::letterboxd::load_export_dir;
use blend_sources::{LetterboxdExport, TmdbClient};
use color_eyre::eyre::{eyre, Result};
use tracing::{debug, info, warn};

/// Load the config file if present, otherwise defaults.
pub fn load_config(paths: &PathManager) -> Result<Config> {
    let config_file = paths.config_file();
    let config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config
        .validate()
        .map_err(|e| eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;
    debug!(config_file = %config_file.display(), "Configuration loaded");
    Ok(config)
}

pub fn load_credentials(paths: &PathManager) -> Result<CredentialStore> {
    let mut store = CredentialStore::new(paths.credentials_file());
    store
        .load()
        .map_err(|e| eyre!("Failed to read credentials: {}", e))?;
    Ok(store)
}

/// A gateway over the TMDB client, or `None` when lookups are disabled or
/// no credential is configured. Callers fall back to local niche picks.
pub fn build_gateway(config: &Config, paths: &PathManager) -> Option<LookupGateway> {
    let store = match load_credentials(paths) {
        Ok(store) => Some(store),
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable credentials file");
            None
        }
    };
    let credentials = TmdbCredentials::resolve(store.as_ref());

    match TmdbClient::from_config(&config.tmdb, credentials) {
        Ok(client) => {
            let options = GatewayOptions::from(&config.tmdb);
            info!(
                max_calls_per_second = options.max_calls_per_second,
                "Metadata lookups enabled"
            );
            Some(LookupGateway::new(Arc::new(client), options))
        }
        Err(e) => {
            warn!(error = %e, "Metadata lookups disabled");
            None
        }
    }
}

/// One side of a comparison: display name plus parsed export.
pub struct Side {
    pub name: String,
    pub export: LetterboxdExport,
}

pub fn load_side(path: &Path, name: Option<String>) -> Result<Side> {
    let export = load_export_dir(path)
        .map_err(|e| eyre!("Failed to read export at {}: {}", path.display(), e))?;
    let name = name.unwrap_or_else(|| default_name(path));
    info!(
        name = %name,
        films = export.films.len(),
        diary = export.diary.len(),
        "Export loaded"
    );
    Ok(Side { name, export })
}

/// `letterboxd-alice-2024-01-01-00-00-utc` style directory names become `alice`.
pub fn default_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let trimmed = stem.strip_prefix("letterboxd-").unwrap_or(&stem);
    let name = trimmed.split('-').next().unwrap_or_default();
    if name.is_empty() {
        "Someone".to_string()
    } else {
        name.to_string()
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_name_from_export_dir() {
        assert_eq!(
            default_name(&PathBuf::from("/tmp/letterboxd-alice-2024-05-01-10-12-utc")),
            "alice"
        );
        assert_eq!(default_name(&PathBuf::from("bob.csv")), "bob");
        assert_eq!(default_name(&PathBuf::from("/")), "Someone");
    }
}
