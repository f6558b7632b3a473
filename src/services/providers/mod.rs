/// External collaborator abstractions
///
/// The engine consumes two collaborators: a catalog (movie metadata, genre
/// membership, review text) and an embedding provider (text to vector). Each
/// sits behind a trait so the engine can be exercised against mocks and so
/// providers stay swappable without touching the graph code.
use std::collections::{BTreeSet, HashMap};

use crate::{
    error::AppResult,
    models::{CandidateMovie, MovieText},
};

pub mod openai;
pub mod tmdb;

pub use openai::OpenAiEmbeddings;
pub use tmdb::TmdbCatalog;

/// One embedding paired with the index of the input text it belongs to.
///
/// Providers may reorder results internally; correspondence to the input is
/// restored from this index, never assumed from arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedEmbedding {
    pub index: usize,
    pub embedding: Vec<f32>,
}

/// Trait for catalog data providers (TMDB in production)
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetch candidate movies matching the given genre filters
    async fn fetch_candidate_movies(
        &self,
        genre_filters: &[i64],
        page_count: u32,
    ) -> AppResult<Vec<CandidateMovie>>;

    /// Fetch the genre id set for each movie id
    ///
    /// A movie whose lookup fails is absent from the result, not an error.
    async fn fetch_genre_membership(
        &self,
        movie_ids: &[i64],
    ) -> AppResult<HashMap<i64, BTreeSet<i64>>>;

    /// Fetch the free-text fields used for semantic embedding
    async fn fetch_movie_text(&self, movie_id: i64) -> AppResult<MovieText>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Trait for embedding providers (OpenAI-compatible in production)
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, returning one vector per input.
    ///
    /// The whole batch succeeds or fails as a unit; no partial results.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<IndexedEmbedding>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
