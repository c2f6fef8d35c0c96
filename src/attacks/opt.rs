//! Optimization-based attacks: Fang (OPT) and MinMax (AGR-MM).
//!
//! Both craft the most disruptive update that still evades the deployed
//! defense's typical distance test, via a small bounded search instead of a
//! closed form. The search knobs live in [`OptPolicy`] so the adversarial
//! objective stays configurable.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::aggregators::krum::krum_scores;
use crate::attacks::{honest_indices, honest_mean};
use crate::error::AegisError;
use crate::math::{euclidean_distance, l2_norm};

/// Search policy for the optimization-based attacks.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptPolicy {
    /// Maximum search iterations
    pub max_iters: usize,
    /// Initial perturbation scale (λ for Fang, γ upper bound for MinMax)
    pub init_scale: f32,
    /// Convergence tolerance on the scale
    pub tol: f32,
}

impl Default for OptPolicy {
    fn default() -> Self {
        Self {
            max_iters: 20,
            init_scale: 10.0,
            tol: 1e-4,
        }
    }
}

/// Fang directed-deviation attack.
///
/// Crafts `mean - λ * sign(mean)` and halves λ until a Krum-style selection
/// over the honest updates plus `f` crafted copies would pick the crafted
/// vector, so the poisoned direction rides through a Krum-family defense.
pub fn fang_attack(
    updates: &mut [Vec<f32>],
    malicious: &[usize],
    policy: &OptPolicy,
) -> Result<(), AegisError> {
    let n = updates.len();
    let f = malicious.len();
    if f >= n {
        return Err(AegisError::InvalidConfig(format!(
            "{} malicious of {} clients leaves no honest basis",
            f, n
        )));
    }

    let honest = honest_indices(n, malicious);
    let mu = honest_mean(updates, &honest)?;
    let direction: Vec<f32> = mu.iter().map(|&x| if x >= 0.0 { 1.0 } else { -1.0 }).collect();

    let mut lambda = policy.init_scale;
    for _ in 0..policy.max_iters {
        let crafted = craft(&mu, &direction, -lambda);
        if krum_selects_crafted(updates, &honest, &crafted, f)? {
            break;
        }
        lambda *= 0.5;
        if lambda < policy.tol {
            break;
        }
    }

    let crafted = craft(&mu, &direction, -lambda);
    for &i in malicious {
        updates[i] = crafted.clone();
    }
    Ok(())
}

/// MinMax attack.
///
/// Pushes along the negative honest-mean direction with the largest scale γ
/// such that the crafted update is no farther from any honest update than
/// the honest updates are from each other, found by bisection.
pub fn minmax_attack(
    updates: &mut [Vec<f32>],
    malicious: &[usize],
    policy: &OptPolicy,
) -> Result<(), AegisError> {
    let n = updates.len();
    let f = malicious.len();
    if f >= n {
        return Err(AegisError::InvalidConfig(format!(
            "{} malicious of {} clients leaves no honest basis",
            f, n
        )));
    }

    let honest = honest_indices(n, malicious);
    let mu = honest_mean(updates, &honest)?;

    let direction = perturbation_direction(&mu);

    // Largest pairwise distance among honest updates bounds how far the
    // crafted update may sit from any of them.
    let mut max_pair = 0.0f32;
    for (a, &i) in honest.iter().enumerate() {
        for &j in &honest[a + 1..] {
            let d = euclidean_distance(&updates[i], &updates[j])?;
            if d > max_pair {
                max_pair = d;
            }
        }
    }

    let mut lo = 0.0f32;
    let mut hi = policy.init_scale;
    let mut gamma = 0.0f32;
    for _ in 0..policy.max_iters {
        let mid = 0.5 * (lo + hi);
        let crafted = craft(&mu, &direction, mid);
        let worst = honest
            .iter()
            .map(|&i| euclidean_distance(&crafted, &updates[i]))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
            .unwrap_or(0.0);
        if worst <= max_pair {
            gamma = mid;
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < policy.tol {
            break;
        }
    }

    let crafted = craft(&mu, &direction, gamma);
    for &i in malicious {
        updates[i] = crafted.clone();
    }
    Ok(())
}

/// `mu + scale * direction`, coordinate-wise.
fn craft(mu: &[f32], direction: &[f32], scale: f32) -> Vec<f32> {
    mu.iter()
        .zip(direction.iter())
        .map(|(&m, &d)| m + scale * d)
        .collect()
}

/// Unit vector opposing the honest mean; falls back to a uniform direction
/// when the mean has no direction to oppose.
fn perturbation_direction(mu: &[f32]) -> Vec<f32> {
    let norm = l2_norm(mu);
    if norm > 0.0 {
        mu.iter().map(|&x| -x / norm).collect()
    } else {
        let uniform = (mu.len() as f32).sqrt().recip();
        vec![-uniform; mu.len()]
    }
}

/// Whether a Krum selection over honest updates plus `f` copies of the
/// crafted vector would pick a crafted copy.
fn krum_selects_crafted(
    updates: &[Vec<f32>],
    honest: &[usize],
    crafted: &[f32],
    f: usize,
) -> Result<bool, AegisError> {
    let mut pool: Vec<&[f32]> = honest.iter().map(|&i| updates[i].as_slice()).collect();
    let crafted_start = pool.len();
    for _ in 0..f.max(1) {
        pool.push(crafted);
    }
    if pool.len() < 3 {
        // Too few candidates for a meaningful selection; treat as accepted.
        return Ok(true);
    }
    let scores = krum_scores(&pool, f)?;
    let selected = (0..pool.len())
        .min_by(|&a, &b| {
            scores[a]
                .partial_cmp(&scores[b])
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        })
        .unwrap_or(0);
    Ok(selected >= crafted_start)
}
