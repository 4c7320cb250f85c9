use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};

const BASE_PATH_ENV: &str = "CINEMABLEND_BASE_PATH";
const CONTAINER_BASE: &str = "/app";

/// `CINEMABLEND_BASE_PATH`, or `/app` inside the container image.
pub fn container_base_path() -> PathBuf {
    std::env::var_os(BASE_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONTAINER_BASE))
}

/// Everything lives under one base directory:
///
/// ```text
/// <base>/config.toml
/// <base>/credentials.toml
/// <base>/data/sessions/
/// <base>/logs/cinemablend.log
/// ```
#[derive(Debug, Clone)]
pub struct PathManager {
    base: PathBuf,
}

impl PathManager {
    /// Platform config directory, e.g. `~/.config/cinemablend` on Linux.
    pub fn new() -> Result<Self> {
        let config_root = dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(Self::from_base(config_root.join("cinemablend")))
    }

    pub fn from_base(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn config_dir(&self) -> &Path {
        &self.base
    }

    pub fn data_dir(&self) -> PathBuf {
        self.base.join("data")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.base.join("logs")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir().join("sessions")
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.toml")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.base.join("credentials.toml")
    }

    pub fn default_log_file(&self) -> PathBuf {
        self.log_dir().join("cinemablend.log")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [self.base.clone(), self.sessions_dir(), self.log_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| anyhow!("Failed to create {}: {}", dir.display(), e))?;
        }
        Ok(())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        let container = container_base_path();
        if std::env::var_os(BASE_PATH_ENV).is_some() || container.exists() {
            return Self::from_base(container);
        }
        Self::new().unwrap_or_else(|_| Self::from_base(container))
    }
}
