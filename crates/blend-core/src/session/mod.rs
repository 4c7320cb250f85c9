//! Two-party rendezvous: one side creates a session under a short code, the
//! other joins it, and the creator waits for the join.

pub mod store;

use crate::error::SessionError;
use blend_config::SessionConfig;
use blend_models::FilmRecord;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub use store::{FileSessionStore, MemorySessionStore, SessionStore};

const KEY_PREFIX: &str = "blend:";

/// Compact wire form of a film for session storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlimFilm {
    pub n: String,
    #[serde(default)]
    pub y: Option<String>,
    #[serde(default)]
    pub r: Option<f64>,
    /// Rewatch weight, omitted when zero
    #[serde(default, skip_serializing_if = "is_zero")]
    pub w: u32,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl From<&FilmRecord> for SlimFilm {
    fn from(film: &FilmRecord) -> Self {
        Self {
            n: film.name.clone(),
            y: film.year.clone(),
            r: film.rating,
            w: film.rewatch_weight(),
        }
    }
}

impl From<&SlimFilm> for FilmRecord {
    fn from(slim: &SlimFilm) -> Self {
        FilmRecord::new(slim.n.clone(), slim.y.as_deref(), slim.r).with_rewatches(slim.w)
    }
}

pub fn slim_films(films: &[FilmRecord]) -> Vec<SlimFilm> {
    films.iter().map(SlimFilm::from).collect()
}

pub fn fatten_films(films: &[SlimFilm]) -> Vec<FilmRecord> {
    films.iter().map(FilmRecord::from).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlendSession {
    pub p1_name: String,
    pub p1_films: Vec<SlimFilm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p2_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p2_films: Option<Vec<SlimFilm>>,
    /// Creation time, epoch milliseconds
    pub created: i64,
}

impl BlendSession {
    pub fn is_joined(&self) -> bool {
        self.p2_films.is_some()
    }

    /// Both sides as full records, once joined.
    pub fn collections(&self) -> Option<(Vec<FilmRecord>, Vec<FilmRecord>)> {
        self.p2_films
            .as_ref()
            .map(|p2| (fatten_films(&self.p1_films), fatten_films(p2)))
    }
}

/// Storage key for a session code. Codes are case-insensitive.
pub fn session_key(code: &str) -> String {
    format!("{}{}", KEY_PREFIX, code.trim().to_uppercase())
}

/// Bounded polling schedule for [`Sessions::wait_for_partner`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    /// Interval multiplier per attempt; 1.0 polls at a fixed rate
    pub backoff_factor: f64,
    pub max_interval: Duration,
}

impl PollPolicy {
    fn next_interval(&self, current: Duration) -> Duration {
        let scaled = current.as_secs_f64() * self.backoff_factor.max(1.0);
        Duration::try_from_secs_f64(scaled)
            .unwrap_or(self.max_interval)
            .min(self.max_interval)
    }
}

impl From<&SessionConfig> for PollPolicy {
    fn from(config: &SessionConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.poll_interval_ms),
            max_attempts: config.max_poll_attempts,
            backoff_factor: config.backoff_factor,
            max_interval: Duration::from_millis(config.max_poll_interval_ms),
        }
    }
}

/// Session operations against a [`SessionStore`].
pub struct Sessions {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
    poll: PollPolicy,
}

impl Sessions {
    pub fn new(store: Arc<dyn SessionStore>, ttl: Duration, poll: PollPolicy) -> Self {
        Self { store, ttl, poll }
    }

    pub fn from_config(store: Arc<dyn SessionStore>, config: &SessionConfig) -> Self {
        Self::new(store, Duration::from_secs(config.ttl_seconds), PollPolicy::from(config))
    }

    async fn save(&self, code: &str, session: &BlendSession) -> Result<(), SessionError> {
        let json = serde_json::to_string(session)?;
        self.store.set(&session_key(code), json, self.ttl).await?;
        Ok(())
    }

    /// Store the first side's films under `code`.
    pub async fn create(&self, code: &str, name: &str, films: &[FilmRecord]) -> Result<BlendSession, SessionError> {
        let session = BlendSession {
            p1_name: name.to_string(),
            p1_films: slim_films(films),
            p2_name: None,
            p2_films: None,
            created: Utc::now().timestamp_millis(),
        };
        self.save(code, &session).await?;
        info!(code = %code, films = films.len(), "Session created");
        Ok(session)
    }

    pub async fn lookup(&self, code: &str) -> Result<Option<BlendSession>, SessionError> {
        match self.store.get(&session_key(code)).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Attach the second side. Rejects a session that already has one.
    pub async fn join(&self, code: &str, name: &str, films: &[FilmRecord]) -> Result<BlendSession, SessionError> {
        let mut session = self
            .lookup(code)
            .await?
            .ok_or_else(|| SessionError::NotFound(code.to_string()))?;
        if session.is_joined() {
            return Err(SessionError::AlreadyJoined(code.to_string()));
        }

        session.p2_name = Some(name.to_string());
        session.p2_films = Some(slim_films(films));
        self.save(code, &session).await?;
        info!(code = %code, films = films.len(), "Joined session");
        Ok(session)
    }

    /// Poll until the second side joins. Gives up after the policy's attempt
    /// budget; drop the future to cancel early.
    pub async fn wait_for_partner(&self, code: &str) -> Result<BlendSession, SessionError> {
        let mut interval = self.poll.interval;
        for attempt in 1..=self.poll.max_attempts {
            let session = self
                .lookup(code)
                .await?
                .ok_or_else(|| SessionError::NotFound(code.to_string()))?;
            if session.is_joined() {
                debug!(code = %code, attempt, "Partner joined");
                return Ok(session);
            }
            if attempt < self.poll.max_attempts {
                debug!(code = %code, attempt, wait_ms = interval.as_millis() as u64, "Waiting for partner");
                tokio::time::sleep(interval).await;
                interval = self.poll.next_interval(interval);
            }
        }
        Err(SessionError::TimedOut {
            attempts: self.poll.max_attempts,
        })
    }
}
