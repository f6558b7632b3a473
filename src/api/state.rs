use std::sync::Arc;

use crate::config::Config;
use crate::services::{
    providers::{CatalogProvider, EmbeddingProvider, OpenAiEmbeddings, TmdbCatalog},
    BaseQualityRanking, EmbeddingClient, GraphLifecycle, GraphRanking, PreferenceVectorTable,
    RankingStrategy,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<GraphLifecycle>,
    pub catalog: Arc<dyn CatalogProvider>,
    pub embeddings: Arc<EmbeddingClient>,
    pub preference_table: Arc<PreferenceVectorTable>,
    pub ranking: Arc<dyn RankingStrategy>,
    /// Edges retained per node during sparsification
    pub edge_top_k: usize,
}

impl AppState {
    /// Creates state over explicit providers (tests inject stubs here)
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        embedding_concurrency: usize,
        edge_top_k: usize,
        graph_ranking: bool,
    ) -> Self {
        let ranking: Arc<dyn RankingStrategy> = if graph_ranking {
            Arc::new(GraphRanking)
        } else {
            Arc::new(BaseQualityRanking)
        };

        Self {
            lifecycle: Arc::new(GraphLifecycle::new()),
            catalog,
            embeddings: Arc::new(EmbeddingClient::new(
                embedding_provider,
                embedding_concurrency,
            )),
            preference_table: Arc::new(PreferenceVectorTable::new()),
            ranking,
            edge_top_k,
        }
    }

    /// Creates state with the production providers
    pub fn from_config(config: &Config) -> Self {
        let catalog = Arc::new(TmdbCatalog::new(
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
        ));
        let embedding_provider = Arc::new(OpenAiEmbeddings::new(
            config.embedding_api_key.clone(),
            config.embedding_api_url.clone(),
            config.embedding_model.clone(),
        ));

        Self::new(
            catalog,
            embedding_provider,
            config.embedding_concurrency,
            config.edge_top_k,
            config.graph_ranking,
        )
    }
}
