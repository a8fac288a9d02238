pub mod mood;
pub mod movie;

pub use mood::{MoodCatalog, MoodProfile, MoodSummary, MoodWeights, RuntimePreference, YearPreference};
pub use movie::{
    Candidate, Movie, MovieDetails, MovieId, MovieMetadata, RecommendedMovie, SimilarMovie, UserId,
    NO_OVERVIEW,
};
