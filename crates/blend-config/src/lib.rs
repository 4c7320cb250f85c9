pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{BlendConfig, Config, SessionConfig, TmdbConfig};
pub use credentials::{CredentialStore, TmdbCredentials};
pub use paths::{container_base_path, PathManager};
