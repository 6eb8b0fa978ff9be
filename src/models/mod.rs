pub mod movie;
pub mod recommendation;
pub mod user;

/// Numeric catalog id of a movie
pub type MovieId = u64;

pub use movie::{
    CastMember, CatalogMovie, Credits, CrewMember, Genre, MovieDetails, MovieRecord, RecordShape, Video,
};
pub use recommendation::{Recommendation, RecommendationEnvelope, StoredRecommendation};
pub use user::{UserId, UserProfile, UserRecord, WatchlistAction};
