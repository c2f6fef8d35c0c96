//! Coordinate-wise trimmed mean aggregation
//!
//! Achieves robustness by trimming outliers per parameter coordinate:
//! attackers cannot corrupt the aggregate by poisoning individual
//! parameters, because the extremes of every coordinate are discarded
//! before averaging.

use std::cmp::Ordering;

use rayon::prelude::*;

use crate::error::AegisError;

/// Coordinate-wise trimmed mean aggregation.
///
/// For each parameter coordinate, sorts values across all client updates,
/// trims the top and bottom `trim_fraction` values, then averages the rest.
/// Filtering happens per-coordinate, not per-client, so the kept set is
/// conceptually "all clients".
///
/// # Arguments
///
/// * `updates` - Flat client updates, one per client
/// * `trim_fraction` - Fraction to trim from each end (0.0..0.5, typically 0.2)
///
/// # Note
///
/// Example-count weights are intentionally not supported: sorting destroys
/// the correspondence between values and their original client weights. Use
/// [`super::fedavg`] for weighted aggregation without robustness.
pub fn trimmed_mean(updates: &[Vec<f32>], trim_fraction: f32) -> Result<Vec<f32>, AegisError> {
    if updates.is_empty() {
        return Err(AegisError::EmptyUpdates);
    }
    if !(0.0..=0.5).contains(&trim_fraction) {
        return Err(AegisError::InvalidTrimFraction(trim_fraction));
    }

    let n_clients = updates.len();
    let dim = updates[0].len();
    for u in &updates[1..] {
        if u.len() != dim {
            return Err(AegisError::DimensionMismatch);
        }
    }

    let n_trim = (n_clients as f32 * trim_fraction).ceil() as usize;
    let n_keep = n_clients.saturating_sub(2 * n_trim);
    if n_keep < 1 {
        return Err(AegisError::InsufficientClients {
            needed: 1,
            actual: n_keep,
        });
    }

    let result: Vec<f32> = (0..dim)
        .into_par_iter()
        .map(|coord| {
            let mut values: Vec<f32> = updates.iter().map(|u| u[coord]).collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            let trimmed = &values[n_trim..n_clients - n_trim];
            trimmed.iter().sum::<f32>() / trimmed.len() as f32
        })
        .collect();

    Ok(result)
}
