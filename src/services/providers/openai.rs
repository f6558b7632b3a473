/// OpenAI-compatible embedding provider
///
/// POSTs the whole input batch to /embeddings and returns index-tagged
/// vectors. The response's `index` field is authoritative for input
/// correspondence; arrival order is not trusted.
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    services::providers::{EmbeddingProvider, IndexedEmbedding},
};

#[derive(Clone)]
pub struct OpenAiEmbeddings {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbeddings {
    pub fn new(api_key: Option<String>, api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            model,
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<IndexedEmbedding>> {
        // Missing credential is a configuration error: fatal for this call,
        // never retried. The caller decides whether to degrade.
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::Configuration("EMBEDDING_API_KEY is not set".to_string())
        })?;

        let url = format!("{}/embeddings", self.api_url);
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                "Embedding API request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "Embedding API returned status {}: {}",
                status, body
            )));
        }

        let body: EmbeddingResponse = response.json().await?;

        Ok(body
            .data
            .into_iter()
            .map(|d| IndexedEmbedding {
                index: d.index,
                embedding: d.embedding,
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
