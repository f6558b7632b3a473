use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::{EdgeBasis, Movie};
use crate::services::graph::MovieGraph;

/// Flat bonus for nodes whose genres intersect the requested set
const GENRE_MATCH_BONUS: f32 = 1.5;

/// A recommended movie with the total score it ranked under
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankedMovie {
    #[serde(flatten)]
    pub movie: Movie,
    pub score: f32,
}

/// A neighbor returned by the similar-items query
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SimilarMovie {
    pub id: i64,
    pub title: String,
    pub vote_average: f32,
    pub weight: f32,
    pub basis: EdgeBasis,
}

/// Ranking strategy over a built graph
///
/// Two implementations exist: the graph-personalized ranking and a
/// base-quality fallback. Which one serves requests is a configuration
/// choice, not an inline conditional in the query path.
pub trait RankingStrategy: Send + Sync {
    fn recommendations(
        &self,
        graph: &MovieGraph,
        genre_ids: &BTreeSet<i64>,
        limit: usize,
    ) -> Vec<RankedMovie>;

    /// Strategy name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Graph-personalized ranking: base quality plus accumulated personalization
/// score plus a direct genre-match bonus.
pub struct GraphRanking;

impl RankingStrategy for GraphRanking {
    fn recommendations(
        &self,
        graph: &MovieGraph,
        genre_ids: &BTreeSet<i64>,
        limit: usize,
    ) -> Vec<RankedMovie> {
        // Not ready is an expected caller state, answered with emptiness
        if !graph.is_ready() {
            return Vec::new();
        }

        let mut ranked: Vec<RankedMovie> = graph
            .nodes()
            .map(|node| {
                let genre_bonus = if node.movie.genre_ids.intersection(genre_ids).next().is_some()
                {
                    GENRE_MATCH_BONUS
                } else {
                    0.0
                };
                RankedMovie {
                    score: node.movie.vote_average + node.score + genre_bonus,
                    movie: node.movie.clone(),
                }
            })
            .collect();

        sort_ranked(&mut ranked);
        ranked.truncate(limit);
        ranked
    }

    fn name(&self) -> &'static str {
        "graph"
    }
}

/// Fallback ranking: public average rating only, restricted to genre matches
/// when a genre filter is given. Ignores personalization entirely.
pub struct BaseQualityRanking;

impl RankingStrategy for BaseQualityRanking {
    fn recommendations(
        &self,
        graph: &MovieGraph,
        genre_ids: &BTreeSet<i64>,
        limit: usize,
    ) -> Vec<RankedMovie> {
        if !graph.is_ready() {
            return Vec::new();
        }

        let mut ranked: Vec<RankedMovie> = graph
            .nodes()
            .filter(|node| {
                genre_ids.is_empty()
                    || node.movie.genre_ids.intersection(genre_ids).next().is_some()
            })
            .map(|node| RankedMovie {
                score: node.movie.vote_average,
                movie: node.movie.clone(),
            })
            .collect();

        sort_ranked(&mut ranked);
        ranked.truncate(limit);
        ranked
    }

    fn name(&self) -> &'static str {
        "base_quality"
    }
}

/// Total score descending, then base quality descending, then id ascending:
/// fully deterministic order.
fn sort_ranked(ranked: &mut [RankedMovie]) {
    ranked.sort_by(|x, y| {
        y.score
            .total_cmp(&x.score)
            .then_with(|| y.movie.vote_average.total_cmp(&x.movie.vote_average))
            .then_with(|| x.movie.id.cmp(&y.movie.id))
    });
}

/// Nearest neighbors of one movie by edge weight.
///
/// Empty when the graph is not ready or the id is unknown; an unknown id is an
/// expected caller state, not an error. Never returns the movie itself, only
/// positive-weight neighbors, at most `limit` of them.
pub fn similar_items(graph: &MovieGraph, movie_id: i64, limit: usize) -> Vec<SimilarMovie> {
    if !graph.is_ready() || !graph.contains(movie_id) {
        return Vec::new();
    }

    let mut edges: Vec<_> = graph
        .edges_of(movie_id)
        .iter()
        .filter(|e| e.weight > 0.0)
        .collect();
    edges.sort_by(|x, y| {
        y.weight
            .total_cmp(&x.weight)
            .then_with(|| x.other(movie_id).cmp(&y.other(movie_id)))
    });

    edges
        .into_iter()
        .take(limit)
        .filter_map(|edge| {
            let neighbor = graph.node(edge.other(movie_id))?;
            Some(SimilarMovie {
                id: neighbor.movie.id,
                title: neighbor.movie.title.clone(),
                vote_average: neighbor.movie.vote_average,
                weight: edge.weight,
                basis: edge.basis,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateMovie;
    use crate::services::graph::build_graph;
    use crate::services::personalization::apply_ratings;
    use std::collections::HashMap;

    fn candidate(id: i64, vote_average: f32) -> CandidateMovie {
        CandidateMovie {
            id,
            title: format!("Movie {}", id),
            overview: None,
            vote_average,
        }
    }

    fn genre_set(ids: &[i64]) -> BTreeSet<i64> {
        ids.iter().copied().collect()
    }

    fn sample_graph() -> MovieGraph {
        let mut membership = HashMap::new();
        membership.insert(1, genre_set(&[28]));
        membership.insert(2, genre_set(&[28]));
        membership.insert(3, genre_set(&[35]));

        build_graph(
            vec![candidate(1, 7.0), candidate(2, 6.0), candidate(3, 9.0)],
            &membership,
            &HashMap::new(),
            &HashMap::new(),
            10,
        )
    }

    #[test]
    fn test_not_ready_graph_yields_empty() {
        let graph = MovieGraph::empty();
        let strategy = GraphRanking;
        assert!(strategy
            .recommendations(&graph, &genre_set(&[28]), 10)
            .is_empty());
        assert!(similar_items(&graph, 1, 10).is_empty());
    }

    #[test]
    fn test_genre_bonus_reorders() {
        let graph = sample_graph();
        let strategy = GraphRanking;

        // 1: 7.0 + 1.5 = 8.5, 2: 6.0 + 1.5 = 7.5, 3: 9.0 (no match)
        let ranked = strategy.recommendations(&graph, &genre_set(&[28]), 10);
        let ids: Vec<i64> = ranked.iter().map(|r| r.movie.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);

        assert!((ranked[1].score - 8.5).abs() < 1e-6);
        assert!((ranked[2].score - 7.5).abs() < 1e-6);
    }

    #[test]
    fn test_personalization_feeds_ranking() {
        let mut graph = sample_graph();
        // Loving movie 2 lifts it and its neighbor; hating movie 3 sinks it
        apply_ratings(&mut graph, &[(2, 5.0), (3, 1.0)].into_iter().collect());

        let strategy = GraphRanking;
        let ranked = strategy.recommendations(&graph, &genre_set(&[28]), 10);
        let ids: Vec<i64> = ranked.iter().map(|r| r.movie.id).collect();

        // 1: 7.0 + 0.5 (propagated) + 1.5 = 9.0
        // 2: 6.0 + 1.0 (rated)      + 1.5 = 8.5
        // 3: 9.0 - 1.0 (rated)      + 0   = 8.0
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_tie_breaks_are_deterministic() {
        let graph = build_graph(
            vec![candidate(5, 7.0), candidate(4, 7.0), candidate(6, 7.0)],
            &HashMap::new(),
            &HashMap::new(),
            &HashMap::new(),
            10,
        );
        let strategy = GraphRanking;
        let ranked = strategy.recommendations(&graph, &BTreeSet::new(), 10);
        let ids: Vec<i64> = ranked.iter().map(|r| r.movie.id).collect();
        assert_eq!(ids, vec![4, 5, 6]);
    }

    #[test]
    fn test_limit_truncates() {
        let graph = sample_graph();
        let strategy = GraphRanking;
        let ranked = strategy.recommendations(&graph, &BTreeSet::new(), 2);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_base_quality_strategy_ignores_personalization() {
        let mut graph = sample_graph();
        apply_ratings(&mut graph, &[(2, 5.0)].into_iter().collect());

        let strategy = BaseQualityRanking;
        let ranked = strategy.recommendations(&graph, &BTreeSet::new(), 10);
        let ids: Vec<i64> = ranked.iter().map(|r| r.movie.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_base_quality_strategy_filters_by_genre() {
        let graph = sample_graph();
        let strategy = BaseQualityRanking;
        let ranked = strategy.recommendations(&graph, &genre_set(&[35]), 10);
        let ids: Vec<i64> = ranked.iter().map(|r| r.movie.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn test_similar_items_contract() {
        let graph = sample_graph();
        let similar = similar_items(&graph, 1, 5);

        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].id, 2);
        assert!(similar[0].weight > 0.0);
        assert!(similar.iter().all(|s| s.id != 1), "never its own neighbor");
    }

    #[test]
    fn test_similar_items_unknown_id_is_empty() {
        let graph = sample_graph();
        assert!(similar_items(&graph, 999, 5).is_empty());
    }

    #[test]
    fn test_similar_items_respects_limit() {
        // Star topology: movie 1 connected to several others
        let mut membership = HashMap::new();
        membership.insert(1, genre_set(&[28, 35, 18, 16]));
        membership.insert(2, genre_set(&[28]));
        membership.insert(3, genre_set(&[35]));
        membership.insert(4, genre_set(&[18]));
        let graph = build_graph(
            vec![
                candidate(1, 7.0),
                candidate(2, 7.0),
                candidate(3, 7.0),
                candidate(4, 7.0),
            ],
            &membership,
            &HashMap::new(),
            &HashMap::new(),
            10,
        );

        let similar = similar_items(&graph, 1, 2);
        assert_eq!(similar.len(), 2);
    }

    #[test]
    fn test_similar_items_sorted_by_weight() {
        // 1-2 share 1 of 2 genres (0.5); 1-3 share 1 of 3 (1/3)
        let mut membership = HashMap::new();
        membership.insert(1, genre_set(&[28]));
        membership.insert(2, genre_set(&[28, 35]));
        membership.insert(3, genre_set(&[28, 35, 18]));
        let graph = build_graph(
            vec![candidate(1, 7.0), candidate(2, 7.0), candidate(3, 7.0)],
            &membership,
            &HashMap::new(),
            &HashMap::new(),
            10,
        );

        let similar = similar_items(&graph, 1, 5);
        assert_eq!(similar[0].id, 2);
        assert_eq!(similar[1].id, 3);
        assert!(similar[0].weight > similar[1].weight);
    }
}
