use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB API key (catalog collaborator)
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Embedding provider API key
    ///
    /// Optional: when absent the engine still runs, but embedding calls fail
    /// with a configuration error and graph builds degrade to genre-only
    /// similarity.
    #[serde(default)]
    pub embedding_api_key: Option<String>,

    /// Embedding provider base URL (OpenAI-compatible)
    #[serde(default = "default_embedding_api_url")]
    pub embedding_api_url: String,

    /// Embedding model identifier
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Maximum simultaneous in-flight embedding requests
    #[serde(default = "default_embedding_concurrency")]
    pub embedding_concurrency: usize,

    /// Edges retained per node during graph sparsification
    #[serde(default = "default_edge_top_k")]
    pub edge_top_k: usize,

    /// When false, ranking falls back to sorting by public rating only
    #[serde(default = "default_graph_ranking")]
    pub graph_ranking: bool,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_embedding_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_concurrency() -> usize {
    6
}

fn default_edge_top_k() -> usize {
    10
}

fn default_graph_ranking() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
