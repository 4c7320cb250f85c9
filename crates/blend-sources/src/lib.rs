pub mod error;
pub mod letterboxd;
pub mod tmdb;
pub mod traits;

pub use error::ProviderError;
pub use letterboxd::LetterboxdExport;
pub use tmdb::{MovieDetails, SearchHit, TmdbClient};
pub use traits::MetadataProvider;
