/// TMDB catalog provider
///
/// API flow:
/// 1. Candidates: /discover/movie filtered by genre, one call per page
/// 2. Genre membership: /movie/{id} per movie, fanned out behind a
///    concurrency limit with per-movie failure isolation
/// 3. Text: /movie/{id}?append_to_response=keywords,reviews in a single call
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use reqwest::Client as HttpClient;
use serde::Deserialize;
use tokio::sync::Semaphore;

use crate::{
    error::{AppError, AppResult},
    models::{CandidateMovie, MovieText},
    services::providers::CatalogProvider,
};

/// Ceiling on simultaneous per-movie detail requests
const FETCH_CONCURRENCY: usize = 8;

#[derive(Clone)]
pub struct TmdbCatalog {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    fetch_permits: Arc<Semaphore>,
}

// TMDB wire types

#[derive(Debug, Deserialize)]
struct DiscoverResponse {
    results: Vec<DiscoverMovie>,
}

#[derive(Debug, Deserialize)]
struct DiscoverMovie {
    id: i64,
    title: String,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    vote_average: f32,
}

#[derive(Debug, Deserialize)]
struct MovieDetails {
    #[serde(default)]
    genres: Vec<GenreEntry>,
    #[serde(default)]
    tagline: Option<String>,
    #[serde(default)]
    keywords: Option<KeywordList>,
    #[serde(default)]
    reviews: Option<ReviewList>,
}

#[derive(Debug, Deserialize)]
struct GenreEntry {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct KeywordList {
    #[serde(default)]
    keywords: Vec<Keyword>,
}

#[derive(Debug, Deserialize)]
struct Keyword {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ReviewList {
    #[serde(default)]
    results: Vec<Review>,
}

#[derive(Debug, Deserialize)]
struct Review {
    content: String,
}

impl TmdbCatalog {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            fetch_permits: Arc::new(Semaphore::new(FETCH_CONCURRENCY)),
        }
    }

    async fn get_movie_details(&self, movie_id: i64, append: Option<&str>) -> AppResult<MovieDetails> {
        let url = format!("{}/movie/{}", self.api_url, movie_id);

        let mut request = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())]);
        if let Some(append) = append {
            request = request.query(&[("append_to_response", append)]);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApi(format!(
                "TMDB movie lookup for {} returned status {}",
                movie_id, status
            )));
        }

        Ok(response.json().await?)
    }

    /// Helper to clone provider for parallel tasks
    fn clone_for_task(&self) -> Self {
        self.clone()
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbCatalog {
    async fn fetch_candidate_movies(
        &self,
        genre_filters: &[i64],
        page_count: u32,
    ) -> AppResult<Vec<CandidateMovie>> {
        let genres = genre_filters
            .iter()
            .map(|g| g.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let mut candidates = Vec::new();
        let mut seen = BTreeSet::new();

        for page in 1..=page_count.max(1) {
            let url = format!("{}/discover/movie", self.api_url);
            let response = self
                .http_client
                .get(&url)
                .query(&[
                    ("api_key", self.api_key.as_str()),
                    ("with_genres", genres.as_str()),
                    ("sort_by", "popularity.desc"),
                    ("page", &page.to_string()),
                ])
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                return Err(AppError::ExternalApi(format!(
                    "TMDB discover returned status {}",
                    status
                )));
            }

            let body: DiscoverResponse = response.json().await?;
            for movie in body.results {
                if seen.insert(movie.id) {
                    candidates.push(CandidateMovie {
                        id: movie.id,
                        title: movie.title,
                        overview: movie.overview,
                        vote_average: movie.vote_average,
                    });
                }
            }
        }

        tracing::info!(
            candidate_count = candidates.len(),
            pages = page_count,
            "Fetched candidate movies from TMDB"
        );

        Ok(candidates)
    }

    async fn fetch_genre_membership(
        &self,
        movie_ids: &[i64],
    ) -> AppResult<HashMap<i64, BTreeSet<i64>>> {
        let mut tasks = Vec::new();

        for &movie_id in movie_ids {
            let provider = self.clone_for_task();
            let task = tokio::spawn(async move {
                // Permit bounds fan-out to FETCH_CONCURRENCY in-flight requests
                let _permit = provider.fetch_permits.acquire().await;
                let details = provider.get_movie_details(movie_id, None).await?;
                let genre_ids: BTreeSet<i64> = details.genres.iter().map(|g| g.id).collect();
                Ok::<_, AppError>((movie_id, genre_ids))
            });
            tasks.push(task);
        }

        let mut membership = HashMap::new();
        let mut failures = 0usize;

        for task in tasks {
            match task.await {
                Ok(Ok((movie_id, genre_ids))) => {
                    membership.insert(movie_id, genre_ids);
                }
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "Genre membership fetch failed for movie");
                    failures += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Genre membership task join error");
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            tracing::warn!(
                success_count = membership.len(),
                failure_count = failures,
                "Partial genre membership fetch"
            );
        }

        Ok(membership)
    }

    async fn fetch_movie_text(&self, movie_id: i64) -> AppResult<MovieText> {
        let _permit = self.fetch_permits.acquire().await;
        let details = self
            .get_movie_details(movie_id, Some("keywords,reviews"))
            .await?;

        Ok(MovieText {
            tagline: details.tagline.filter(|t| !t.is_empty()),
            keywords: details
                .keywords
                .map(|k| k.keywords.into_iter().map(|kw| kw.name).collect())
                .unwrap_or_default(),
            review_excerpts: details
                .reviews
                .map(|r| r.results.into_iter().map(|rev| rev.content).collect())
                .unwrap_or_default(),
        })
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
