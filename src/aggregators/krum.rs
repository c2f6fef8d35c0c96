//! Krum and multi-Krum selection (Blanchard et al., 2017)
//!
//! Each client is scored by the sum of squared distances to its `n - f - 2`
//! nearest neighbors, where `f` is the assumed number of malicious clients.
//! Multi-Krum keeps the `k` lowest-scoring clients and averages them;
//! classic Krum is the `k = 1` special case.
//!
//! Reference: "Machine Learning with Adversaries: Byzantine Tolerant
//! Gradient Descent"

use std::cmp::Ordering;

use crate::aggregators::fedavg::weighted_mean_indices;
use crate::aggregators::Aggregate;
use crate::error::AegisError;
use crate::math::squared_distance;

/// Compute the Krum score for every client.
///
/// score_i = sum of squared distances from client i to its `n - f - 2`
/// nearest neighbors. Requires at least 3 clients; when `n <= f + 2` the
/// neighbor count is clamped to 1 so the score is still defined.
pub fn krum_scores(updates: &[&[f32]], f: usize) -> Result<Vec<f32>, AegisError> {
    let n = updates.len();
    if n < 3 {
        return Err(AegisError::InsufficientClients {
            needed: 3,
            actual: n,
        });
    }
    // Theoretical requirement is n >= 2f + 3; below it the scores are still
    // defined, so proceed best-effort.
    if n < 2 * f + 3 {
        log::warn!("Krum condition not met (n={} < 2f+3={})", n, 2 * f + 3);
    }

    // Symmetric pairwise squared distances, computed once.
    let mut dist = vec![vec![0.0f32; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = squared_distance(updates[i], updates[j])?;
            dist[i][j] = d;
            dist[j][i] = d;
        }
    }

    let k = if n > f + 2 { n - f - 2 } else { 1 };

    let scores = (0..n)
        .map(|i| {
            let mut row: Vec<f32> = (0..n).filter(|&j| j != i).map(|j| dist[i][j]).collect();
            row.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            row.iter().take(k).sum()
        })
        .collect();
    Ok(scores)
}

/// Multi-Krum aggregation.
///
/// Selects the `to_keep` clients with the smallest Krum scores (ties broken
/// by lowest client index) and returns their weighted mean together with the
/// kept index set, sorted ascending.
pub fn multi_krum(
    updates: &[Vec<f32>],
    weights: &[f32],
    f: usize,
    to_keep: usize,
) -> Result<Aggregate, AegisError> {
    let views: Vec<&[f32]> = updates.iter().map(|u| u.as_slice()).collect();
    let scores = krum_scores(&views, f)?;

    let n = updates.len();
    if to_keep == 0 {
        return Err(AegisError::InsufficientClients {
            needed: 1,
            actual: 0,
        });
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        scores[a]
            .partial_cmp(&scores[b])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut kept: Vec<usize> = order.into_iter().take(to_keep.min(n)).collect();
    kept.sort_unstable();

    let params = weighted_mean_indices(updates, weights, &kept)?;
    Ok(Aggregate { params, kept })
}
