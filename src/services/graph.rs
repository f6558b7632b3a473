use std::collections::{BTreeSet, HashMap, HashSet};

use crate::models::{CandidateMovie, Edge, EdgeBasis, GraphStats, Movie};
use crate::services::similarity::{cosine_similarity, genre_overlap};

/// Blend weights when both similarity signals exist for a pair
const GENRE_BLEND_WEIGHT: f32 = 0.4;
const SEMANTIC_BLEND_WEIGHT: f32 = 0.6;

/// A movie node plus its accumulated personalization score
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub movie: Movie,
    pub score: f32,
}

/// In-memory similarity graph over one candidate set
///
/// Nodes map movie ids to metadata-plus-score; adjacency maps each id to its
/// incident edges (each undirected edge appears in both endpoints' lists).
/// Personalization only ever adjusts node scores; the node and edge sets are
/// fixed once built.
#[derive(Debug, Clone)]
pub struct MovieGraph {
    nodes: HashMap<i64, GraphNode>,
    adjacency: HashMap<i64, Vec<Edge>>,
    edge_count: usize,
    version: u64,
    ready: bool,
}

impl MovieGraph {
    /// An empty, not-ready graph (the reset state)
    pub fn empty() -> Self {
        Self {
            nodes: HashMap::new(),
            adjacency: HashMap::new(),
            edge_count: 0,
            version: 0,
            ready: false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn contains(&self, id: i64) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: i64) -> Option<&GraphNode> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// Incident edges of a node; empty for unknown ids
    pub fn edges_of(&self, id: i64) -> &[Edge] {
        self.adjacency.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Adds to a node's personalization score; unknown ids are ignored
    pub fn add_score(&mut self, id: i64, delta: f32) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.score += delta;
        }
    }

    pub fn stats(&self) -> GraphStats {
        let average_degree = if self.nodes.is_empty() {
            0.0
        } else {
            (2 * self.edge_count) as f32 / self.nodes.len() as f32
        };
        GraphStats {
            node_count: self.nodes.len(),
            edge_count: self.edge_count,
            average_degree,
            version: self.version,
            ready: self.ready,
        }
    }
}

/// Builds a similarity graph from a candidate set.
///
/// One node per movie, score zero. Per unordered pair the genre and semantic
/// signals are blended 0.4/0.6 when both exist, a single signal is used as-is
/// when only one exists, and the pair is skipped when neither does. The edge
/// set is then sparsified to the top-K strongest edges per node (an edge
/// survives if it ranks in either endpoint's top K). Deterministic for
/// identical inputs; the returned graph is ready.
pub fn build_graph(
    candidates: Vec<CandidateMovie>,
    membership: &HashMap<i64, BTreeSet<i64>>,
    texts: &HashMap<i64, String>,
    embeddings: &HashMap<i64, Vec<f32>>,
    top_k: usize,
) -> MovieGraph {
    let mut nodes: HashMap<i64, GraphNode> = HashMap::with_capacity(candidates.len());
    for candidate in candidates {
        let movie = Movie {
            genre_ids: membership.get(&candidate.id).cloned().unwrap_or_default(),
            embedding: embeddings.get(&candidate.id).cloned(),
            semantic_text: texts.get(&candidate.id).cloned(),
            id: candidate.id,
            title: candidate.title,
            vote_average: candidate.vote_average,
        };
        nodes.insert(movie.id, GraphNode { movie, score: 0.0 });
    }

    // Sorted ids keep pair iteration (and so tie behavior) deterministic
    let mut ids: Vec<i64> = nodes.keys().copied().collect();
    ids.sort_unstable();

    let mut candidate_edges: Vec<Edge> = Vec::new();
    for (i, &a) in ids.iter().enumerate() {
        for &b in &ids[i + 1..] {
            let weight = pair_weight(&nodes[&a].movie, &nodes[&b].movie);
            if let Some((weight, basis)) = weight {
                if let Some(edge) = Edge::new(a, b, weight, basis) {
                    candidate_edges.push(edge);
                }
            }
        }
    }

    let kept = sparsify(&ids, &candidate_edges, top_k);
    let edges: Vec<Edge> = candidate_edges
        .into_iter()
        .filter(|e| kept.contains(&(e.a, e.b)))
        .collect();

    let mut adjacency: HashMap<i64, Vec<Edge>> = HashMap::with_capacity(nodes.len());
    for &id in &ids {
        adjacency.insert(id, Vec::new());
    }
    let edge_count = edges.len();
    for edge in edges {
        if let Some(incident) = adjacency.get_mut(&edge.a) {
            incident.push(edge);
        }
        if let Some(incident) = adjacency.get_mut(&edge.b) {
            incident.push(edge);
        }
    }

    tracing::info!(
        node_count = nodes.len(),
        edge_count,
        top_k,
        "Similarity graph built"
    );

    MovieGraph {
        nodes,
        adjacency,
        edge_count,
        version: 0,
        ready: true,
    }
}

/// Computes the blended weight for one pair, or `None` when no signal exists
/// or the combined weight is zero.
fn pair_weight(a: &Movie, b: &Movie) -> Option<(f32, EdgeBasis)> {
    let genre = if a.genre_ids.is_empty() || b.genre_ids.is_empty() {
        None
    } else {
        Some(genre_overlap(&a.genre_ids, &b.genre_ids))
    };

    let semantic = match (&a.embedding, &b.embedding) {
        // Negative cosine means "dissimilar", which carries no edge weight
        (Some(x), Some(y)) => Some(cosine_similarity(x, y).clamp(0.0, 1.0)),
        _ => None,
    };

    let (weight, basis) = match (genre, semantic) {
        (Some(g), Some(s)) => (
            GENRE_BLEND_WEIGHT * g + SEMANTIC_BLEND_WEIGHT * s,
            EdgeBasis::Blended,
        ),
        (Some(g), None) => (g, EdgeBasis::Genre),
        (None, Some(s)) => (s, EdgeBasis::Semantic),
        (None, None) => return None,
    };

    if weight > 0.0 {
        Some((weight.min(1.0), basis))
    } else {
        None
    }
}

/// Selects the canonical pairs to retain: each node nominates its top-K
/// strongest incident candidates, and an edge survives if either endpoint
/// nominated it.
fn sparsify(ids: &[i64], candidate_edges: &[Edge], top_k: usize) -> HashSet<(i64, i64)> {
    let mut incident: HashMap<i64, Vec<&Edge>> = HashMap::with_capacity(ids.len());
    for edge in candidate_edges {
        incident.entry(edge.a).or_default().push(edge);
        incident.entry(edge.b).or_default().push(edge);
    }

    let mut kept = HashSet::new();
    for edges in incident.values_mut() {
        edges.sort_by(|x, y| {
            y.weight
                .partial_cmp(&x.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| (x.a, x.b).cmp(&(y.a, y.b)))
        });
        for edge in edges.iter().take(top_k) {
            kept.insert((edge.a, edge.b));
        }
    }
    kept
}
