//! Lookup gateway: throttled, cached resolution of film candidates to
//! external popularity metadata.

pub mod dispatch;
pub mod gateway;
pub mod matching;
pub mod ttl_cache;

#[cfg(test)]
pub(crate) mod fake;

pub use dispatch::DispatchQueue;
pub use gateway::{GatewayOptions, LookupGateway, DEFAULT_CACHE_TTL, DEFAULT_MAX_CALLS_PER_SECOND};
pub use matching::select_best_match;
pub use ttl_cache::TtlCache;
