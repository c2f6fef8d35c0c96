//! FedAvg baseline aggregation (no poisoning defense)
//!
//! Standard federated averaging as described by McMahan et al. (2017).
//! Vulnerable to even a single malicious client. Included as the no-defense
//! baseline and reused by the selection-based defenses to average their
//! surviving updates.

use crate::error::AegisError;

/// Standard FedAvg aggregation (no defense).
///
/// Computes a (optionally weighted) arithmetic mean across flat client
/// updates. A single malicious client can corrupt the aggregate.
///
/// # Arguments
///
/// * `updates` - Flat client updates, one per client
/// * `weights` - Optional client weights (proportional to local example counts)
pub fn fedavg(updates: &[Vec<f32>], weights: Option<&[f32]>) -> Result<Vec<f32>, AegisError> {
    if updates.is_empty() {
        return Err(AegisError::EmptyUpdates);
    }
    let all: Vec<usize> = (0..updates.len()).collect();
    match weights {
        Some(w) if w.len() != updates.len() => Err(AegisError::DimensionMismatch),
        Some(w) => weighted_mean_indices(updates, w, &all),
        None => {
            let uniform = vec![1.0; updates.len()];
            weighted_mean_indices(updates, &uniform, &all)
        }
    }
}

/// Weighted mean over a subset of updates chosen by index.
///
/// Shared by every selection-based strategy (Krum, DnC, the history-aware
/// detector) to average the clients it kept.
pub(crate) fn weighted_mean_indices(
    updates: &[Vec<f32>],
    weights: &[f32],
    indices: &[usize],
) -> Result<Vec<f32>, AegisError> {
    if updates.is_empty() || indices.is_empty() {
        return Err(AegisError::EmptyUpdates);
    }
    if weights.len() != updates.len() {
        return Err(AegisError::DimensionMismatch);
    }
    let dim = updates[0].len();
    for u in &updates[1..] {
        if u.len() != dim {
            return Err(AegisError::DimensionMismatch);
        }
    }

    let weight_sum: f32 = indices.iter().map(|&i| weights[i]).sum();
    if weight_sum <= 0.0 {
        return Err(AegisError::InsufficientClients {
            needed: 1,
            actual: 0,
        });
    }

    let mut acc = vec![0.0f32; dim];
    for &i in indices {
        let w = weights[i];
        for (a, &x) in acc.iter_mut().zip(updates[i].iter()) {
            *a += w * x;
        }
    }
    for a in &mut acc {
        *a /= weight_sum;
    }
    Ok(acc)
}
