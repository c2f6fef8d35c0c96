//! Coordinate-wise median aggregation
//!
//! More robust than trimmed mean but discards more information. The median
//! is unchanged as long as the majority of clients per coordinate is honest.

use std::cmp::Ordering;

use rayon::prelude::*;

use crate::error::AegisError;

/// Coordinate-wise median aggregation (FedMedian).
///
/// For each parameter coordinate, computes the median across all client
/// updates. Like the trimmed mean, filtering is per-coordinate; the kept
/// set is conceptually "all clients".
pub fn median(updates: &[Vec<f32>]) -> Result<Vec<f32>, AegisError> {
    if updates.is_empty() {
        return Err(AegisError::EmptyUpdates);
    }

    let dim = updates[0].len();
    for u in &updates[1..] {
        if u.len() != dim {
            return Err(AegisError::DimensionMismatch);
        }
    }

    let result: Vec<f32> = (0..dim)
        .into_par_iter()
        .map(|coord| {
            let mut values: Vec<f32> = updates.iter().map(|u| u[coord]).collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            let mid = values.len() / 2;
            if values.len() % 2 == 0 {
                (values[mid - 1] + values[mid]) / 2.0
            } else {
                values[mid]
            }
        })
        .collect();

    Ok(result)
}
