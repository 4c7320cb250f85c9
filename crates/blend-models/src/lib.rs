pub mod comparison;
pub mod film;
pub mod metadata;
pub mod normalize;
pub mod result;

pub use comparison::SharedFilm;
pub use film::{DiaryEntry, FilmRecord};
pub use metadata::{Candidate, MetadataRecord};
pub use normalize::{canonical_key, extract_year, lookup_key};
pub use result::{
    BlendResult, BlendStats, EraHistogram, FavouriteYear, Generosity, GuiltyPleasure, NicheComparison, NichePick,
    NicheSource, Pair, RewatchLeader, RewatchLeaders, ScoreBreakdown, Side,
};
