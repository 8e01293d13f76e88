//! Maximal Marginal Relevance selection.

use crate::embedding::cosine_similarity;

/// Selects up to `k` candidates balancing relevance against redundancy.
///
/// `relevance[i]` is candidate `i`'s similarity to the query and
/// `vectors[i]` its embedding. Each step picks the candidate maximising
///
/// ```text
/// lambda * relevance - (1 - lambda) * max_similarity_to_already_selected
/// ```
///
/// so `lambda = 1.0` reduces to plain relevance ranking and `lambda = 0.0`
/// to pure diversity. Ties go to the lower index, which keeps the result
/// deterministic when candidates arrive sorted by relevance.
///
/// Returns candidate indices in selection order.
///
/// # Examples
///
/// ```
/// use transcript_qa::retrieval::mmr_select;
///
/// let vectors = vec![vec![1.0, 0.0], vec![0.99, 0.01], vec![0.0, 1.0]];
/// let relevance = vec![0.9, 0.89, 0.5];
///
/// // Pure relevance keeps score order.
/// assert_eq!(mmr_select(&relevance, &vectors, 2, 1.0), vec![0, 1]);
/// // Favouring diversity skips the near-duplicate.
/// assert_eq!(mmr_select(&relevance, &vectors, 2, 0.3), vec![0, 2]);
/// ```
#[must_use]
pub fn mmr_select(relevance: &[f32], vectors: &[Vec<f32>], k: usize, lambda: f32) -> Vec<usize> {
    let n = relevance.len().min(vectors.len());
    let mut remaining: Vec<usize> = (0..n).collect();
    let mut selected: Vec<usize> = Vec::with_capacity(k.min(n));

    while selected.len() < k && !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_gain = f32::NEG_INFINITY;

        for (pos, &idx) in remaining.iter().enumerate() {
            let gain = mmr_gain(relevance[idx], &vectors[idx], &selected, vectors, lambda);
            if gain > best_gain {
                best_gain = gain;
                best_pos = pos;
            }
        }

        selected.push(remaining.remove(best_pos));
    }

    selected
}

fn mmr_gain(
    relevance: f32,
    vector: &[f32],
    selected: &[usize],
    vectors: &[Vec<f32>],
    lambda: f32,
) -> f32 {
    let redundancy = selected
        .iter()
        .map(|&s| cosine_similarity(vector, &vectors[s]))
        .fold(f32::NEG_INFINITY, f32::max);
    let redundancy = if redundancy.is_finite() { redundancy } else { 0.0 };

    lambda.mul_add(relevance, -(1.0 - lambda) * redundancy)
}
