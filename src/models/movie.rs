use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Rating snapshot consumed at personalization time
///
/// Captured once per pass; later changes to the external rating store do not
/// retroactively affect an already-personalized graph.
pub type RatingSnapshot = HashMap<i64, f32>;

/// A candidate movie as returned by the catalog collaborator, before the
/// graph builder attaches genre membership, semantic text and embeddings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateMovie {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    /// External quality signal (public average rating, 0-10)
    #[serde(default)]
    pub vote_average: f32,
}

/// A movie node's metadata, snapshotted at graph-build time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    /// External quality signal (public average rating, 0-10)
    pub vote_average: f32,
    pub genre_ids: BTreeSet<i64>,
    /// Semantic embedding; absent when generation failed or no text existed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// The synthesized text the embedding was generated from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_text: Option<String>,
}

/// Free-text fields fetched per movie for semantic embedding
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MovieText {
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub review_excerpts: Vec<String>,
}

/// Which similarity signal an edge weight derives from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EdgeBasis {
    /// Genre overlap only
    Genre,
    /// Embedding cosine similarity only
    Semantic,
    /// Both signals blended
    Blended,
}

/// Undirected weighted relation between two distinct movies
///
/// The id pair is kept in canonical order (`a < b`) so an unordered pair has
/// exactly one representation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    pub a: i64,
    pub b: i64,
    /// Always in [0, 1]
    pub weight: f32,
    pub basis: EdgeBasis,
}

impl Edge {
    /// Creates an edge with the id pair in canonical order.
    ///
    /// Returns `None` for a self-edge; callers never get to represent one.
    pub fn new(x: i64, y: i64, weight: f32, basis: EdgeBasis) -> Option<Self> {
        if x == y {
            return None;
        }
        let (a, b) = if x < y { (x, y) } else { (y, x) };
        Some(Self { a, b, weight, basis })
    }

    /// Given one endpoint, returns the other
    pub fn other(&self, id: i64) -> i64 {
        if id == self.a {
            self.b
        } else {
            self.a
        }
    }
}

/// Summary statistics for the current graph
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub average_degree: f32,
    pub version: u64,
    pub ready: bool,
}

impl GraphStats {
    /// Stats value reported before any graph has been built
    pub fn empty() -> Self {
        Self {
            node_count: 0,
            edge_count: 0,
            average_degree: 0.0,
            version: 0,
            ready: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_canonical_order() {
        let edge = Edge::new(42, 7, 0.5, EdgeBasis::Genre).unwrap();
        assert_eq!(edge.a, 7);
        assert_eq!(edge.b, 42);
        assert_eq!(edge.other(7), 42);
        assert_eq!(edge.other(42), 7);
    }

    #[test]
    fn test_edge_rejects_self_edge() {
        assert!(Edge::new(3, 3, 1.0, EdgeBasis::Semantic).is_none());
    }

    #[test]
    fn test_empty_stats() {
        let stats = GraphStats::empty();
        assert_eq!(stats.node_count, 0);
        assert_eq!(stats.edge_count, 0);
        assert!(!stats.ready);
    }
}
