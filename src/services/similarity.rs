use std::collections::BTreeSet;

/// Cosine similarity between two embedding vectors, in [-1, 1].
///
/// Returns exactly 0.0 for mismatched lengths or zero-magnitude inputs:
/// "no defined similarity" rather than an error, so a bad vector degrades a
/// single pair instead of crashing a build.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Jaccard overlap between two genre id sets, in [0, 1].
///
/// 0.0 when both sets are empty (no evidence of similarity either way).
pub fn genre_overlap(a: &BTreeSet<i64>, b: &BTreeSet<i64>) -> f32 {
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();

    if union == 0 {
        return 0.0;
    }

    intersection as f32 / union as f32
}
