pub mod api;
pub mod client;

pub use api::{MovieDetails, SearchHit, SearchResponse};
pub use client::TmdbClient;
