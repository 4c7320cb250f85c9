pub mod error;
pub mod lookup;
pub mod matcher;
pub mod niche;
pub mod rankings;
pub mod scoring;
pub mod session;

pub use blend_models::normalize;

pub use error::{GatewayError, SessionError};
pub use lookup::{GatewayOptions, LookupGateway};
pub use matcher::{match_collections, MatchOutcome};
pub use niche::{blend_with_metadata, compare_niche};
pub use scoring::{blend, blend_with_weights, label_for, ScoreWeights};
pub use session::{BlendSession, FileSessionStore, MemorySessionStore, PollPolicy, SessionStore, Sessions};
