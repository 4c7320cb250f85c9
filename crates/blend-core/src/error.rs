use blend_sources::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Every candidate in the batch hit an upstream failure
    #[error("metadata service unavailable: all {attempted} lookups failed (last error: {last_error})")]
    Unavailable { attempted: usize, last_error: String },
}

impl GatewayError {
    pub(crate) fn unavailable(attempted: usize, last_error: &ProviderError) -> Self {
        GatewayError::Unavailable {
            attempted,
            last_error: last_error.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session {0} not found or expired")]
    NotFound(String),

    #[error("session {0} already has a second person")]
    AlreadyJoined(String),

    #[error("gave up waiting for a partner after {attempts} checks")]
    TimedOut { attempts: u32 },

    #[error("session store error: {0}")]
    Store(#[from] anyhow::Error),

    #[error("session record is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
