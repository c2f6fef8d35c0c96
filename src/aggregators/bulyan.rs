//! Bulyan aggregation (El Mhamdi et al., 2018)
//!
//! Two stages: iterated Krum selection shrinks the candidate set to
//! `theta = n - 2f` clients, then a coordinate-wise trimmed mean over the
//! selected updates discards the `beta` largest and smallest values per
//! coordinate before averaging. The selection stage bounds which clients
//! can contribute at all; the trimming stage bounds how much any survivor
//! can move a single coordinate.

use std::cmp::Ordering;

use crate::aggregators::krum::krum_scores;
use crate::aggregators::Aggregate;
use crate::error::AegisError;

/// Bulyan aggregation.
///
/// # Arguments
///
/// * `updates` - Flat client updates, one per client
/// * `f` - Assumed number of malicious clients
/// * `beta` - Values trimmed from each end of every coordinate in stage two
///
/// Fails with [`AegisError::InsufficientClients`] when `n - 2f < 1` or when
/// `theta - 2*beta < 1`.
pub fn bulyan(
    updates: &[Vec<f32>],
    f: usize,
    beta: usize,
) -> Result<Aggregate, AegisError> {
    if updates.is_empty() {
        return Err(AegisError::EmptyUpdates);
    }
    let n = updates.len();
    let dim = updates[0].len();
    for u in &updates[1..] {
        if u.len() != dim {
            return Err(AegisError::DimensionMismatch);
        }
    }

    let theta = match n.checked_sub(2 * f) {
        Some(t) if t >= 1 => t,
        _ => {
            return Err(AegisError::InsufficientClients {
                needed: 2 * f + 1,
                actual: n,
            })
        }
    };
    if theta < 2 * beta + 1 {
        return Err(AegisError::InsufficientClients {
            needed: 2 * beta + 1,
            actual: theta,
        });
    }

    // Stage one: repeatedly run Krum over the remaining pool, moving the
    // best-scoring client (lowest index on ties) into the selection set.
    // Once the pool is below Krum's minimum of 3 there is no score left to
    // distinguish by; the tail joins in index order.
    let mut remaining: Vec<usize> = (0..n).collect();
    let mut selected: Vec<usize> = Vec::with_capacity(theta);
    while selected.len() < theta {
        if remaining.len() < 3 {
            let missing = theta - selected.len();
            selected.extend(remaining.drain(..missing.min(remaining.len())));
            break;
        }
        let pool: Vec<&[f32]> = remaining.iter().map(|&i| updates[i].as_slice()).collect();
        let scores = krum_scores(&pool, f)?;
        let best_pos = (0..pool.len())
            .min_by(|&a, &b| {
                scores[a]
                    .partial_cmp(&scores[b])
                    .unwrap_or(Ordering::Equal)
                    .then(remaining[a].cmp(&remaining[b]))
            })
            .ok_or(AegisError::EmptyUpdates)?;
        selected.push(remaining.remove(best_pos));
    }
    selected.sort_unstable();

    // Stage two: beta-trimmed coordinate-wise mean over the selected updates.
    let mut params = vec![0.0f32; dim];
    for (coord, out) in params.iter_mut().enumerate() {
        let mut values: Vec<f32> = selected.iter().map(|&i| updates[i][coord]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let kept = &values[beta..values.len() - beta];
        *out = kept.iter().sum::<f32>() / kept.len() as f32;
    }

    Ok(Aggregate {
        params,
        kept: selected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulyan_excludes_outliers() {
        // 8 honest near 1.0, 2 malicious at 100.0; n=10, f=2 -> theta=6
        let mut updates: Vec<Vec<f32>> = (0..8).map(|i| vec![1.0 + i as f32 * 0.01]).collect();
        updates.push(vec![100.0]);
        updates.push(vec![100.0]);

        let result = bulyan(&updates, 2, 1).unwrap();
        assert!(!result.kept.contains(&8));
        assert!(!result.kept.contains(&9));
        assert_eq!(result.kept.len(), 6);
        assert!((result.params[0] - 1.0).abs() < 0.1);
    }

    #[test]
    fn test_bulyan_honest_only_matches_mean() {
        let updates = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0], vec![5.0]];
        // f=0 -> theta=5, beta=0: plain mean over everyone
        let result = bulyan(&updates, 0, 0).unwrap();
        assert_eq!(result.kept, vec![0, 1, 2, 3, 4]);
        assert!((result.params[0] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_bulyan_insufficient_for_theta() {
        let updates = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
        // n=4, f=2 -> theta=0
        assert!(matches!(
            bulyan(&updates, 2, 0),
            Err(AegisError::InsufficientClients { .. })
        ));
    }

    #[test]
    fn test_bulyan_beta_too_large() {
        let updates = vec![vec![1.0]; 6];
        // theta = 6, beta = 3 -> nothing left per coordinate
        assert!(matches!(
            bulyan(&updates, 0, 3),
            Err(AegisError::InsufficientClients { .. })
        ));
    }

    #[test]
    fn test_bulyan_empty() {
        let updates: Vec<Vec<f32>> = vec![];
        assert!(matches!(bulyan(&updates, 0, 0), Err(AegisError::EmptyUpdates)));
    }

    #[test]
    fn test_bulyan_dimension_mismatch() {
        let updates = vec![vec![1.0, 2.0], vec![1.0], vec![1.0, 2.0]];
        assert!(matches!(
            bulyan(&updates, 0, 0),
            Err(AegisError::DimensionMismatch)
        ));
    }

    #[test]
    fn test_bulyan_determinism() {
        let updates: Vec<Vec<f32>> = (0..10)
            .map(|i| vec![(i as f32 * 0.37).sin(), (i as f32 * 0.11).cos()])
            .collect();
        let a = bulyan(&updates, 2, 1).unwrap();
        let b = bulyan(&updates, 2, 1).unwrap();
        assert_eq!(a.kept, b.kept);
        assert_eq!(a.params, b.params);
    }
}
