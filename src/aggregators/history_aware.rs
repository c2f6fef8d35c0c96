//! History-aware deviation detector
//!
//! Forecasts each client's expected update from a sliding window of past
//! rounds and flags clients whose submitted update deviates too far from
//! their own trajectory. A poisoned update has to stay consistent with the
//! client's entire recorded history to slip through, which is much harder
//! than fooling a single-round distance test.
//!
//! During the first `window` rounds no filtering occurs: every client is
//! kept unconditionally so the store accumulates enough history to forecast
//! from.

use std::cmp::Ordering;

use crate::aggregators::fedavg::weighted_mean_indices;
use crate::aggregators::Aggregate;
use crate::error::AegisError;
use crate::history::HistoryStore;
use crate::math::euclidean_distance;

/// Parameters for the history-aware detector.
#[derive(Clone, Debug)]
pub struct HistoryAwareParams {
    /// Number of past rounds used for forecasting
    pub window: usize,
    /// Deviation above this flags a client for exclusion; non-finite or
    /// non-positive disables the threshold cut
    pub threshold: f32,
    /// Number of lowest-deviation clients to keep after filtering
    pub to_keep: usize,
    /// When set, the configured malicious ids are dropped directly instead
    /// of relying on the deviation threshold
    pub omniscient: bool,
}

/// History-aware aggregation.
///
/// Deviation per client is the Euclidean distance between its submitted
/// update and a linear extrapolation of its last `window` recorded
/// snapshots. The `to_keep` lowest-deviation survivors are averaged.
pub fn history_aware(
    updates: &[Vec<f32>],
    weights: &[f32],
    params: &HistoryAwareParams,
    malicious: &[usize],
    history: &HistoryStore,
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

    // Warmup: not enough history to forecast from.
    if history.len() < params.window || params.window == 0 {
        let kept: Vec<usize> = (0..n).collect();
        let agg = weighted_mean_indices(updates, weights, &kept)?;
        return Ok(Aggregate { params: agg, kept });
    }

    let window = history.last(params.window);
    let mut deviation = vec![0.0f32; n];
    for (i, dev) in deviation.iter_mut().enumerate() {
        let series: Vec<&[f32]> = window
            .iter()
            .filter_map(|r| r.client_params.get(i).map(|p| p.as_slice()))
            .collect();
        if series.is_empty() {
            // No recorded trajectory for this client yet; nothing to deviate from.
            continue;
        }
        for s in &series {
            if s.len() != dim {
                return Err(AegisError::DimensionMismatch);
            }
        }
        let forecast = extrapolate(&series);
        *dev = euclidean_distance(&updates[i], &forecast)?;
    }

    let candidates: Vec<usize> = if params.omniscient {
        (0..n).filter(|i| !malicious.contains(i)).collect()
    } else if params.threshold.is_finite() && params.threshold > 0.0 {
        (0..n).filter(|&i| deviation[i] <= params.threshold).collect()
    } else {
        (0..n).collect()
    };
    if candidates.is_empty() {
        return Err(AegisError::InsufficientClients {
            needed: 1,
            actual: 0,
        });
    }

    let mut order = candidates;
    order.sort_by(|&a, &b| {
        deviation[a]
            .partial_cmp(&deviation[b])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    let keep = params.to_keep.max(1).min(order.len());
    let mut kept: Vec<usize> = order.into_iter().take(keep).collect();
    kept.sort_unstable();

    let agg = weighted_mean_indices(updates, weights, &kept)?;
    Ok(Aggregate { params: agg, kept })
}

/// Linear extrapolation over a client's snapshot series: the last
/// observation plus the mean first-difference across the window.
fn extrapolate(series: &[&[f32]]) -> Vec<f32> {
    let last = series[series.len() - 1];
    if series.len() == 1 {
        return last.to_vec();
    }
    let first = series[0];
    let steps = (series.len() - 1) as f32;
    last.iter()
        .zip(first.iter())
        .map(|(&l, &f)| l + (l - f) / steps)
        .collect()
}
