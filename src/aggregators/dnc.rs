//! Divide-and-conquer (DnC) spectral aggregation (Shejwalkar & Houmansadr, 2021)
//!
//! A coordinated attack perturbs updates along a common direction, which
//! shows up as the dominant right singular vector of the centered update
//! matrix. Each iteration scores clients by their projection onto that
//! direction and drops the highest-scoring ones; repeating with fresh random
//! coordinate subsampling prevents an attacker from crafting an update that
//! evades a single fixed projection. The final kept set is the intersection
//! across iterations.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::Rng;

use crate::aggregators::fedavg::weighted_mean_indices;
use crate::aggregators::Aggregate;
use crate::error::AegisError;

/// Singular values at or below this are treated as a degenerate spectrum.
const SPECTRUM_EPS: f32 = 1e-9;

/// Divide-and-conquer aggregation.
///
/// # Arguments
///
/// * `updates` - Flat client updates, one per client
/// * `weights` - Client weights (local example counts)
/// * `c` - Filtering aggressiveness: `to_keep = n - c * num_malicious`
/// * `b` - Coordinate subsampling width; 0 disables subsampling
/// * `niters` - Number of score-and-filter iterations to intersect
/// * `num_malicious` - Assumed number of malicious clients
/// * `rng` - Caller-supplied seeded source for the coordinate draws
///
/// Fails with [`AegisError::InsufficientClients`] when `to_keep < 1` or the
/// intersection of kept sets across iterations is empty. A degenerate SVD
/// (no convergence or an all-zero spectrum) scores every client equally, so
/// the iteration keeps the lowest `to_keep` indices.
pub fn dnc(
    updates: &[Vec<f32>],
    weights: &[f32],
    c: f32,
    b: usize,
    niters: usize,
    num_malicious: usize,
    rng: &mut StdRng,
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

    let to_keep = (n as f64 - c as f64 * num_malicious as f64).floor();
    if to_keep < 1.0 {
        return Err(AegisError::InsufficientClients {
            needed: 1,
            actual: 0,
        });
    }
    let to_keep = (to_keep as usize).min(n);

    // Running intersection, seeded with the first iteration's kept set.
    let mut survivors: Option<BTreeSet<usize>> = None;

    for _ in 0..niters.max(1) {
        // Shared coordinate subsample for this iteration (with replacement,
        // as a uniform independent draw per slot).
        let projected: Vec<Vec<f32>> = if b > 0 && dim > b {
            let coords: Vec<usize> = (0..b).map(|_| rng.gen_range(0..dim)).collect();
            updates
                .iter()
                .map(|u| coords.iter().map(|&i| u[i]).collect())
                .collect()
        } else {
            updates.to_vec()
        };

        let width = projected[0].len();
        let mut mu = vec![0.0f32; width];
        for u in &projected {
            for (m, &x) in mu.iter_mut().zip(u.iter()) {
                *m += x;
            }
        }
        for m in &mut mu {
            *m /= n as f32;
        }

        let centered: Vec<Vec<f32>> = projected
            .iter()
            .map(|u| u.iter().zip(mu.iter()).map(|(x, m)| x - m).collect())
            .collect();

        let scores: Vec<f32> = match dominant_direction(&centered) {
            Some(v) => centered
                .iter()
                .map(|row| {
                    let dot: f32 = row.iter().zip(v.iter()).map(|(a, b)| a * b).sum();
                    dot * dot
                })
                .collect(),
            // Degenerate spectrum: every client scores equally.
            None => vec![0.0; n],
        };

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            scores[a]
                .partial_cmp(&scores[b])
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        });
        let kept: BTreeSet<usize> = order.into_iter().take(to_keep).collect();

        survivors = Some(match survivors {
            None => kept,
            Some(acc) => acc.intersection(&kept).copied().collect(),
        });
    }

    let kept: Vec<usize> = survivors.unwrap_or_default().into_iter().collect();
    if kept.is_empty() {
        return Err(AegisError::InsufficientClients {
            needed: 1,
            actual: 0,
        });
    }

    let params = weighted_mean_indices(updates, weights, &kept)?;
    Ok(Aggregate { params, kept })
}

/// Dominant right singular vector of the centered update matrix, or `None`
/// when the SVD does not converge or the spectrum is numerically zero.
fn dominant_direction(rows: &[Vec<f32>]) -> Option<Vec<f32>> {
    let n = rows.len();
    let width = rows[0].len();
    if width == 0 {
        return None;
    }
    let matrix = DMatrix::from_fn(n, width, |r, c| rows[r][c]);
    let svd = matrix.try_svd(false, true, SPECTRUM_EPS, 250)?;
    let v_t = svd.v_t?;

    let (best, sigma) = svd
        .singular_values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(Ordering::Equal))?;
    if *sigma <= SPECTRUM_EPS {
        return None;
    }
    Some(v_t.row(best).iter().copied().collect())
}
