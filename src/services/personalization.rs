use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::{
    error::AppResult,
    models::{RatingSnapshot, StatedPreference},
    services::{embeddings::EmbeddingClient, graph::MovieGraph, similarity::cosine_similarity},
};

/// A rating at this value contributes nothing (1-5 scale)
const RATING_NEUTRAL: f32 = 3.0;

/// Scale from centered rating to score boost
const RATING_BOOST_SCALE: f32 = 0.5;

/// Geometric decay applied at each propagation hop
const HOP_DECAY: f32 = 0.5;

/// Propagation stays within this many hops of a rated node
const MAX_HOPS: usize = 2;

/// Scale for preference-similarity score adjustments
const PREFERENCE_WEIGHT: f32 = 1.0;

/// Applies a rating snapshot to the graph's node scores.
///
/// Each rated node present in the graph gets a seed boost linear in its
/// centered rating, then the boost propagates outward: at every hop the
/// carried signal is multiplied by the edge weight and by [`HOP_DECAY`], for
/// at most [`MAX_HOPS`] hops. Contributions are additive across rated sources
/// and across paths; a path never steps back onto its own source. Calling this
/// twice compounds the boosts; rebuild the graph to undo.
pub fn apply_ratings(graph: &mut MovieGraph, snapshot: &RatingSnapshot) {
    let mut contributions: HashMap<i64, f32> = HashMap::new();
    let mut applied = 0usize;

    for (&source, &rating) in snapshot {
        if !graph.contains(source) {
            continue;
        }
        let boost = (rating - RATING_NEUTRAL) * RATING_BOOST_SCALE;
        if boost == 0.0 {
            continue;
        }
        applied += 1;
        *contributions.entry(source).or_default() += boost;

        let mut frontier: Vec<(i64, f32)> = vec![(source, boost)];
        for _ in 0..MAX_HOPS {
            let mut next = Vec::new();
            for (node, signal) in frontier {
                for edge in graph.edges_of(node) {
                    let neighbor = edge.other(node);
                    if neighbor == source {
                        continue;
                    }
                    let contribution = signal * edge.weight * HOP_DECAY;
                    if contribution == 0.0 {
                        continue;
                    }
                    *contributions.entry(neighbor).or_default() += contribution;
                    next.push((neighbor, contribution));
                }
            }
            frontier = next;
        }
    }

    let touched = contributions.len();
    for (id, delta) in contributions {
        graph.add_score(id, delta);
    }

    tracing::info!(
        rated_sources = applied,
        nodes_touched = touched,
        "Applied rating snapshot"
    );
}

/// Applies stated-preference query vectors to the graph's node scores.
///
/// The resolved vectors are averaged into a single query vector; every node
/// with an embedding gains its (non-negative) cosine similarity against that
/// query, scaled by [`PREFERENCE_WEIGHT`]. Nodes without embeddings are left
/// untouched. Like rating application, repeat calls compound.
pub fn apply_preferences(graph: &mut MovieGraph, query_vectors: &[Vec<f32>]) {
    let Some(query) = average_vectors(query_vectors) else {
        return;
    };

    let adjustments: Vec<(i64, f32)> = graph
        .nodes()
        .filter_map(|node| {
            let embedding = node.movie.embedding.as_ref()?;
            let similarity = cosine_similarity(&query, embedding);
            if similarity > 0.0 {
                Some((node.movie.id, similarity * PREFERENCE_WEIGHT))
            } else {
                None
            }
        })
        .collect();

    let touched = adjustments.len();
    for (id, delta) in adjustments {
        graph.add_score(id, delta);
    }

    tracing::info!(nodes_touched = touched, "Applied stated preferences");
}

/// Component-wise average; vectors whose length disagrees with the first are
/// dropped with a warning. `None` when nothing usable remains.
fn average_vectors(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    let first = vectors.iter().find(|v| !v.is_empty())?;
    let dim = first.len();

    let mut sum = vec![0.0f32; dim];
    let mut count = 0usize;
    for vector in vectors {
        if vector.len() != dim {
            tracing::warn!(
                expected = dim,
                got = vector.len(),
                "Skipping preference vector with mismatched dimensionality"
            );
            continue;
        }
        for (acc, x) in sum.iter_mut().zip(vector) {
            *acc += x;
        }
        count += 1;
    }

    if count == 0 {
        return None;
    }
    for acc in &mut sum {
        *acc /= count as f32;
    }
    Some(sum)
}

/// Fixed table resolving preference categories to representative vectors.
///
/// Descriptions are static; their embeddings are fetched once through the
/// batch client and cached for the life of the process.
pub struct PreferenceVectorTable {
    cache: Mutex<HashMap<StatedPreference, Vec<f32>>>,
}

impl Default for PreferenceVectorTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferenceVectorTable {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves each stated preference to its representative vector,
    /// embedding any descriptions not yet cached in a single batch.
    pub async fn resolve(
        &self,
        preferences: &[StatedPreference],
        client: &EmbeddingClient,
    ) -> AppResult<Vec<Vec<f32>>> {
        let mut cache = self.cache.lock().await;

        let mut missing: Vec<StatedPreference> = Vec::new();
        for preference in preferences {
            if !cache.contains_key(preference) && !missing.contains(preference) {
                missing.push(*preference);
            }
        }

        if !missing.is_empty() {
            let texts: Vec<String> = missing
                .iter()
                .map(|p| p.description().to_string())
                .collect();
            let vectors = client.embed_batch(&texts).await?;
            for (preference, vector) in missing.into_iter().zip(vectors) {
                cache.insert(preference, vector);
            }
        }

        preferences
            .iter()
            .map(|p| {
                cache.get(p).cloned().ok_or_else(|| {
                    crate::error::AppError::Internal(format!(
                        "Preference vector missing after resolution: {:?}",
                        p
                    ))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateMovie;
    use crate::services::graph::build_graph;
    use std::collections::BTreeSet;

    fn candidate(id: i64) -> CandidateMovie {
        CandidateMovie {
            id,
            title: format!("Movie {}", id),
            overview: None,
            vote_average: 7.0,
        }
    }

    /// Chain graph 1 - 2 - 3 built from genre sets chosen for exact Jaccard
    /// weights: both edges are 0.5 and the ends are disjoint.
    fn chain_graph() -> MovieGraph {
        let mut membership = HashMap::new();
        membership.insert(1, [10].into_iter().collect::<BTreeSet<i64>>());
        membership.insert(2, [10, 20].into_iter().collect());
        membership.insert(3, [20].into_iter().collect());

        build_graph(
            vec![candidate(1), candidate(2), candidate(3)],
            &membership,
            &HashMap::new(),
            &HashMap::new(),
            10,
        )
    }

    fn score_of(graph: &MovieGraph, id: i64) -> f32 {
        graph.node(id).unwrap().score
    }

    #[test]
    fn test_rating_seeds_rated_node() {
        let mut graph = chain_graph();
        let snapshot: RatingSnapshot = [(1, 5.0)].into_iter().collect();
        apply_ratings(&mut graph, &snapshot);

        // (5 - 3) * 0.5
        assert!((score_of(&graph, 1) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_one_hop_propagation_value() {
        // 1-2 edge weight is Jaccard(={10}, {10,20}) = 0.5
        let mut graph = chain_graph();
        let snapshot: RatingSnapshot = [(1, 5.0)].into_iter().collect();
        apply_ratings(&mut graph, &snapshot);

        // boost 1.0, edge 0.5, decay 0.5
        let expected = 1.0 * 0.5 * 0.5;
        assert!((score_of(&graph, 2) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_two_hop_propagation_value() {
        let mut graph = chain_graph();
        let snapshot: RatingSnapshot = [(1, 5.0)].into_iter().collect();
        apply_ratings(&mut graph, &snapshot);

        // hop 1 to node 2: 1.0 * 0.5 * 0.5 = 0.25
        // hop 2 to node 3 over the 0.5-weight edge: 0.25 * 0.5 * 0.5
        let expected = 0.25 * 0.5 * 0.5;
        assert!((score_of(&graph, 3) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_unconnected_node_receives_nothing() {
        let mut membership = HashMap::new();
        membership.insert(1, [10].into_iter().collect::<BTreeSet<i64>>());
        membership.insert(2, [10].into_iter().collect());
        membership.insert(3, [99].into_iter().collect());
        let mut graph = build_graph(
            vec![candidate(1), candidate(2), candidate(3)],
            &membership,
            &HashMap::new(),
            &HashMap::new(),
            10,
        );

        let snapshot: RatingSnapshot = [(1, 5.0)].into_iter().collect();
        apply_ratings(&mut graph, &snapshot);

        assert!(score_of(&graph, 2) > 0.0);
        assert_eq!(score_of(&graph, 3), 0.0);
    }

    #[test]
    fn test_neutral_rating_contributes_nothing() {
        let mut graph = chain_graph();
        let snapshot: RatingSnapshot = [(1, 3.0)].into_iter().collect();
        apply_ratings(&mut graph, &snapshot);

        assert_eq!(score_of(&graph, 1), 0.0);
        assert_eq!(score_of(&graph, 2), 0.0);
    }

    #[test]
    fn test_low_rating_propagates_negative_signal() {
        let mut graph = chain_graph();
        let snapshot: RatingSnapshot = [(1, 1.0)].into_iter().collect();
        apply_ratings(&mut graph, &snapshot);

        assert!(score_of(&graph, 1) < 0.0);
        assert!(score_of(&graph, 2) < 0.0);
    }

    #[test]
    fn test_rating_for_unknown_movie_ignored() {
        let mut graph = chain_graph();
        let snapshot: RatingSnapshot = [(999, 5.0)].into_iter().collect();
        apply_ratings(&mut graph, &snapshot);

        for &id in &[1i64, 2, 3] {
            assert_eq!(score_of(&graph, id), 0.0);
        }
    }

    #[test]
    fn test_propagation_additive_across_sources() {
        let mut graph = chain_graph();
        let snapshot: RatingSnapshot = [(1, 5.0), (3, 5.0)].into_iter().collect();
        apply_ratings(&mut graph, &snapshot);

        let mut single = chain_graph();
        apply_ratings(&mut single, &[(1, 5.0)].into_iter().collect());
        let from_one = score_of(&single, 2);

        // Node 2 hears from both ends of the chain
        assert!(score_of(&graph, 2) > from_one);
    }

    #[test]
    fn test_second_application_compounds() {
        let mut graph = chain_graph();
        let snapshot: RatingSnapshot = [(1, 5.0)].into_iter().collect();
        apply_ratings(&mut graph, &snapshot);
        let once = score_of(&graph, 1);
        apply_ratings(&mut graph, &snapshot);

        assert!((score_of(&graph, 1) - 2.0 * once).abs() < 1e-6);
    }

    fn embedded_graph() -> MovieGraph {
        let mut embeddings = HashMap::new();
        embeddings.insert(1, vec![1.0, 0.0]);
        embeddings.insert(2, vec![0.0, 1.0]);
        // movie 3 has no embedding
        build_graph(
            vec![candidate(1), candidate(2), candidate(3)],
            &HashMap::new(),
            &HashMap::new(),
            &embeddings,
            10,
        )
    }

    #[test]
    fn test_preferences_boost_by_cosine() {
        let mut graph = embedded_graph();
        apply_preferences(&mut graph, &[vec![1.0, 0.0]]);

        // Aligned with movie 1, orthogonal to movie 2
        assert!((score_of(&graph, 1) - 1.0).abs() < 1e-6);
        assert_eq!(score_of(&graph, 2), 0.0);
    }

    #[test]
    fn test_preferences_skip_embeddingless_nodes() {
        let mut graph = embedded_graph();
        apply_preferences(&mut graph, &[vec![1.0, 1.0]]);
        assert_eq!(score_of(&graph, 3), 0.0);
    }

    #[test]
    fn test_preference_vectors_are_averaged() {
        let mut graph = embedded_graph();
        apply_preferences(&mut graph, &[vec![1.0, 0.0], vec![0.0, 1.0]]);

        // Query averages to (0.5, 0.5): equal similarity to both embeddings
        let a = score_of(&graph, 1);
        let b = score_of(&graph, 2);
        assert!(a > 0.0);
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn test_empty_preference_set_is_noop() {
        let mut graph = embedded_graph();
        apply_preferences(&mut graph, &[]);
        assert_eq!(score_of(&graph, 1), 0.0);
    }

    mod table {
        use super::*;
        use crate::models::{AnimationStyle, TonePreference};
        use crate::services::providers::{IndexedEmbedding, MockEmbeddingProvider};
        use std::sync::Arc;

        #[tokio::test]
        async fn test_descriptions_embedded_once() {
            let mut provider = MockEmbeddingProvider::new();
            provider.expect_embed_batch().times(1).returning(|texts| {
                Ok(texts
                    .iter()
                    .enumerate()
                    .map(|(i, _)| IndexedEmbedding {
                        index: i,
                        embedding: vec![i as f32, 1.0],
                    })
                    .collect())
            });

            let client = EmbeddingClient::new(Arc::new(provider), 2);
            let table = PreferenceVectorTable::new();
            let prefs = [
                StatedPreference::Animation(AnimationStyle::HandDrawn),
                StatedPreference::Tone(TonePreference::Dark),
            ];

            let first = table.resolve(&prefs, &client).await.unwrap();
            assert_eq!(first.len(), 2);

            // Second resolution hits the cache; times(1) above enforces it
            let second = table.resolve(&prefs, &client).await.unwrap();
            assert_eq!(first, second);
        }

        #[tokio::test]
        async fn test_duplicate_preferences_share_vector() {
            let mut provider = MockEmbeddingProvider::new();
            provider.expect_embed_batch().times(1).returning(|texts| {
                assert_eq!(texts.len(), 1);
                Ok(vec![IndexedEmbedding {
                    index: 0,
                    embedding: vec![0.5],
                }])
            });

            let client = EmbeddingClient::new(Arc::new(provider), 2);
            let table = PreferenceVectorTable::new();
            let pref = StatedPreference::Animation(AnimationStyle::StopMotion);

            let vectors = table.resolve(&[pref, pref], &client).await.unwrap();
            assert_eq!(vectors.len(), 2);
            assert_eq!(vectors[0], vectors[1]);
        }
    }
}
