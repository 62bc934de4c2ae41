//! Ranking of output scores.

use std::cmp::Ordering;

/// Indices of the `n` highest `scores`, best first.
///
/// Equal scores keep their index order and NaN ranks below everything else.
/// `n` larger than the number of scores returns every index.
pub fn top_results(n: usize, scores: &[f32]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| compare(scores[b], scores[a]).then(a.cmp(&b)));
    indices.truncate(n);
    indices
}

fn compare(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.total_cmp(&b),
    }
}
