mod movie;
mod preferences;

pub use movie::{CandidateMovie, Edge, EdgeBasis, GraphStats, Movie, MovieText, RatingSnapshot};
pub use preferences::{AnimationStyle, EraPreference, FilmmakingStyle, StatedPreference, TonePreference};
