use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::{
    error::{AppError, AppResult},
    services::providers::{EmbeddingProvider, IndexedEmbedding},
};

/// Texts per provider call when embedding a whole candidate set
const CHUNK_SIZE: usize = 16;

/// Batch embedding client
///
/// Wraps an [`EmbeddingProvider`] with the ordering and concurrency guarantees
/// the graph builder relies on: output[i] always corresponds to input[i], and
/// large candidate sets are embedded through a bounded worker pool rather than
/// one unbounded task per movie.
pub struct EmbeddingClient {
    provider: Arc<dyn EmbeddingProvider>,
    permits: Arc<Semaphore>,
}

impl EmbeddingClient {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, concurrency: usize) -> Self {
        Self {
            provider,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Embeds a batch of texts, preserving input order.
    ///
    /// Empty input returns an empty result without calling the provider. Any
    /// provider failure fails the whole batch as one unit; no partial results
    /// are fabricated.
    pub async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let indexed = self.provider.embed_batch(texts).await?;
        restore_order(indexed, texts.len())
    }

    /// Embeds a single text (a batch of one)
    pub async fn embed_text(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| AppError::Embedding("Provider returned no embedding".to_string()))
    }

    /// Embeds synthesized texts for many movies at once.
    ///
    /// Texts are chunked and the chunks run in parallel behind the concurrency
    /// ceiling. A failed chunk drops its movies from the result with a warning
    /// rather than failing the pass; a movie missing here simply gets no
    /// semantic edges. An empty result degrades the build to genre-only
    /// similarity.
    pub async fn embed_for_movies(
        &self,
        texts: Vec<(i64, String)>,
    ) -> HashMap<i64, Vec<f32>> {
        let mut tasks = Vec::new();

        for chunk in texts.chunks(CHUNK_SIZE) {
            let ids: Vec<i64> = chunk.iter().map(|(id, _)| *id).collect();
            let chunk_texts: Vec<String> = chunk.iter().map(|(_, t)| t.clone()).collect();
            let provider = Arc::clone(&self.provider);
            let permits = Arc::clone(&self.permits);

            let task = tokio::spawn(async move {
                let _permit = permits.acquire().await;
                let indexed = provider.embed_batch(&chunk_texts).await?;
                let vectors = restore_order(indexed, chunk_texts.len())?;
                Ok::<_, AppError>((ids, vectors))
            });
            tasks.push(task);
        }

        let mut embeddings = HashMap::new();
        let mut failed_chunks = 0usize;

        for task in tasks {
            match task.await {
                Ok(Ok((ids, vectors))) => {
                    for (id, vector) in ids.into_iter().zip(vectors) {
                        embeddings.insert(id, vector);
                    }
                }
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "Embedding chunk failed, dropping its movies");
                    failed_chunks += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Embedding task join error");
                    failed_chunks += 1;
                }
            }
        }

        if failed_chunks > 0 {
            tracing::warn!(
                embedded_count = embeddings.len(),
                failed_chunks,
                "Partial embedding pass"
            );
        }

        embeddings
    }
}

/// Restores input correspondence from the provider's index metadata.
///
/// Providers may return results in any order; position in the response is
/// never trusted.
fn restore_order(indexed: Vec<IndexedEmbedding>, expected: usize) -> AppResult<Vec<Vec<f32>>> {
    if indexed.len() != expected {
        return Err(AppError::Embedding(format!(
            "Provider returned {} embeddings for {} inputs",
            indexed.len(),
            expected
        )));
    }

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for item in indexed {
        if item.index >= expected {
            return Err(AppError::Embedding(format!(
                "Provider returned out-of-range index {}",
                item.index
            )));
        }
        if slots[item.index].is_some() {
            return Err(AppError::Embedding(format!(
                "Provider returned duplicate index {}",
                item.index
            )));
        }
        slots[item.index] = Some(item.embedding);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            slot.ok_or_else(|| AppError::Embedding(format!("Provider returned no index {}", i)))
        })
        .collect()
}
