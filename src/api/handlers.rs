use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{GraphStats, RatingSnapshot, StatedPreference};
use crate::services::{
    build_graph, personalization, providers::CatalogProvider, similar_items,
    synthesize_semantic_text, RankedMovie, RankingStrategy, SimilarMovie,
};

use super::AppState;

/// Most recommendations or neighbors a single query may return
const MAX_LIMIT: usize = 100;
const DEFAULT_LIMIT: usize = 10;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct BuildGraphRequest {
    pub genre_ids: Vec<i64>,
    /// Catalog pages of candidates to pull (default 1)
    pub pages: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct BuildGraphResponse {
    /// False when a newer build or a reset superseded this one
    pub published: bool,
    pub stats: GraphStats,
}

#[derive(Debug, Deserialize)]
pub struct RatingsRequest {
    /// Movie id to rating on a 1-5 scale
    pub ratings: RatingSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct PreferencesRequest {
    pub preferences: Vec<StatedPreference>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationsRequest {
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SimilarParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
}

fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Builds a fresh similarity graph and publishes it as current.
///
/// Fetches candidates, genre membership and per-movie text from the catalog,
/// embeds the synthesized texts through the bounded batch client, and builds
/// the graph. Embedding failures degrade the build to genre-only similarity;
/// a stale ticket (newer request or reset while this one ran) drops the
/// result instead of publishing it.
pub async fn build(
    State(state): State<AppState>,
    Json(request): Json<BuildGraphRequest>,
) -> AppResult<Json<BuildGraphResponse>> {
    let ticket = state.lifecycle.begin_build().await;
    let pages = request.pages.unwrap_or(1);

    let candidates = state
        .catalog
        .fetch_candidate_movies(&request.genre_ids, pages)
        .await?;
    let ids: Vec<i64> = candidates.iter().map(|c| c.id).collect();

    let membership = state.catalog.fetch_genre_membership(&ids).await?;

    // Per-movie text fetch; a failed movie just loses its semantic signal
    let mut tasks = Vec::new();
    for candidate in &candidates {
        let catalog = Arc::clone(&state.catalog);
        let movie_id = candidate.id;
        let overview = candidate.overview.clone();
        tasks.push(tokio::spawn(async move {
            let text = catalog.fetch_movie_text(movie_id).await?;
            Ok::<_, AppError>((
                movie_id,
                synthesize_semantic_text(overview.as_deref(), &text),
            ))
        }));
    }

    let mut texts: HashMap<i64, String> = HashMap::new();
    for task in tasks {
        match task.await {
            Ok(Ok((movie_id, text))) => {
                // Empty synthesis means no embedding is possible for it
                if !text.is_empty() {
                    texts.insert(movie_id, text);
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Movie text fetch failed, dropping semantic signal");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Movie text task join error");
            }
        }
    }

    // Stable input order keeps embedding batches deterministic
    let mut text_pairs: Vec<(i64, String)> = texts
        .iter()
        .map(|(id, text)| (*id, text.clone()))
        .collect();
    text_pairs.sort_by_key(|(id, _)| *id);
    let embeddings = state.embeddings.embed_for_movies(text_pairs).await;

    if embeddings.is_empty() && !texts.is_empty() {
        tracing::warn!("No embeddings available, building genre-only graph");
    }

    let graph = build_graph(candidates, &membership, &texts, &embeddings, state.edge_top_k);
    let published = state.lifecycle.publish(ticket, graph).await;
    let stats = state.lifecycle.stats().await;

    Ok(Json(BuildGraphResponse { published, stats }))
}

/// Applies a rating snapshot to the current graph's scores
pub async fn apply_ratings(
    State(state): State<AppState>,
    Json(request): Json<RatingsRequest>,
) -> AppResult<Json<GraphStats>> {
    for (&id, &rating) in &request.ratings {
        if !(1.0..=5.0).contains(&rating) {
            return Err(AppError::InvalidInput(format!(
                "Rating {} for movie {} is outside the 1-5 scale",
                rating, id
            )));
        }
    }

    state
        .lifecycle
        .with_current_mut(|graph| personalization::apply_ratings(graph, &request.ratings))
        .await;

    Ok(Json(state.lifecycle.stats().await))
}

/// Applies stated categorical preferences to the current graph's scores
pub async fn apply_preferences(
    State(state): State<AppState>,
    Json(request): Json<PreferencesRequest>,
) -> AppResult<Json<GraphStats>> {
    if !request.preferences.is_empty() {
        let vectors = state
            .preference_table
            .resolve(&request.preferences, &state.embeddings)
            .await?;

        state
            .lifecycle
            .with_current_mut(|graph| personalization::apply_preferences(graph, &vectors))
            .await;
    }

    Ok(Json(state.lifecycle.stats().await))
}

/// Ranked recommendations for a genre set
pub async fn recommendations(
    State(state): State<AppState>,
    Json(request): Json<RecommendationsRequest>,
) -> Json<Vec<RankedMovie>> {
    let genre_ids: BTreeSet<i64> = request.genre_ids.iter().copied().collect();
    let limit = clamp_limit(request.limit);

    let ranked = state
        .lifecycle
        .with_current(|graph| state.ranking.recommendations(graph, &genre_ids, limit))
        .await;

    tracing::debug!(
        strategy = state.ranking.name(),
        result_count = ranked.len(),
        "Recommendations served"
    );

    Json(ranked)
}

/// Nearest neighbors of one movie
pub async fn similar(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
    Query(params): Query<SimilarParams>,
) -> Json<Vec<SimilarMovie>> {
    let limit = clamp_limit(params.limit);
    let neighbors = state
        .lifecycle
        .with_current(|graph| similar_items(graph, movie_id, limit))
        .await;
    Json(neighbors)
}

/// Current graph statistics
pub async fn graph_stats(State(state): State<AppState>) -> Json<GraphStats> {
    Json(state.lifecycle.stats().await)
}

/// Current graph readiness
pub async fn graph_ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    Json(ReadyResponse {
        ready: state.lifecycle.is_ready().await,
    })
}

/// Discards the current graph and all personalization
pub async fn reset_graph(State(state): State<AppState>) -> StatusCode {
    state.lifecycle.reset().await;
    StatusCode::NO_CONTENT
}
