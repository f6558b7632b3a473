pub mod embeddings;
pub mod graph;
pub mod lifecycle;
pub mod personalization;
pub mod providers;
pub mod ranking;
pub mod similarity;
pub mod text_synthesis;

pub use embeddings::EmbeddingClient;
pub use graph::{build_graph, GraphNode, MovieGraph};
pub use lifecycle::{BuildTicket, GraphLifecycle};
pub use personalization::{apply_preferences, apply_ratings, PreferenceVectorTable};
pub use ranking::{similar_items, BaseQualityRanking, GraphRanking, RankedMovie, RankingStrategy, SimilarMovie};
pub use text_synthesis::synthesize_semantic_text;
