//! Brute-force cosine similarity search over a [`VectorMatrix`].
//!
//! Every stored row is scored against the query (O(n·d)); the k best are
//! returned in descending score order. Equal scores keep index order.


use tracing::debug;

use crate::index::VectorMatrix;
use crate::{RagError, Result};

/// A retrieved chunk with its position in the index and its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub index: usize,
    pub score: f64,
    pub text: String,
}

/// Cosine of the angle between `a` and `b`.
///
/// `None` when the lengths differ, either vector is empty or has zero norm, or
/// the result is not finite.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return None;
    }

    let score = dot / denom;
    score.is_finite().then_some(score)
}

/// Return up to `k` chunks most similar to `query`, best first.
///
/// Rows whose similarity is undefined (zero norm) are never returned. A
/// non-empty index whose dimension differs from the query's fails with
/// [`RagError::DimensionMismatch`].
#[inline]
pub fn search(
    query: &[f32],
    vectors: &VectorMatrix,
    chunks: &[String],
    k: usize,
) -> Result<Vec<ScoredChunk>> {
    if chunks.len() != vectors.len() {
        return Err(RagError::IndexInconsistent(format!(
            "{} chunks but {} vectors",
            chunks.len(),
            vectors.len()
        )));
    }

    if vectors.is_empty() || k == 0 {
        return Ok(Vec::new());
    }

    if query.len() != vectors.dimension() {
        return Err(RagError::DimensionMismatch {
            expected: vectors.dimension(),
            actual: query.len(),
        });
    }

    let mut scored: Vec<(usize, f64)> = vectors
        .rows()
        .enumerate()
        .filter_map(|(index, row)| cosine_similarity(query, row).map(|score| (index, score)))
        .collect();

    // Stable sort: equal scores stay in index order.
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(k);

    debug!(
        "Scored {} vectors, returning {} (best {:?})",
        vectors.len(),
        scored.len(),
        scored.first().map(|&(_, score)| score)
    );

    Ok(scored
        .into_iter()
        .map(|(index, score)| ScoredChunk {
            index,
            score,
            text: chunks[index].clone(),
        })
        .collect())
}
