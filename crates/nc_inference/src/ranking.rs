use nc_core::cosine_similarity;

pub const DEFAULT_TOP_K: usize = 7;

/// A candidate together with its similarity to the query.
#[derive(Debug, Clone)]
pub struct Ranked<T> {
    pub item: T,
    pub score: f32,
    pub embedding: Vec<f32>,
}

/// Score every candidate against `query` and keep the best `k`.
///
/// Sorting is stable, so candidates with equal scores keep their input
/// order. Degenerate vectors score 0.
pub fn rank<T>(query: &[f32], candidates: Vec<(T, Vec<f32>)>, k: usize) -> Vec<Ranked<T>> {
    let mut ranked: Vec<Ranked<T>> = candidates
        .into_iter()
        .map(|(item, embedding)| Ranked {
            score: cosine_similarity(query, &embedding),
            item,
            embedding,
        })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(k);
    ranked
}
