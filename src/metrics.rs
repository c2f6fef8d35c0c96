//! Centralized evaluation metrics for one round.

use serde::{Deserialize, Serialize};

/// Metrics produced by the centralized evaluation of the global model.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundMetrics {
    /// Centralized test loss
    pub loss: f32,
    /// Centralized test accuracy
    pub accuracy: f32,
    /// Area under the ROC curve
    pub auc: f32,
    /// Confusion matrix: true positives
    pub true_pos: u64,
    /// Confusion matrix: true negatives
    pub true_neg: u64,
    /// Confusion matrix: false positives
    pub false_pos: u64,
    /// Confusion matrix: false negatives
    pub false_neg: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_serde_roundtrip() {
        let m = RoundMetrics {
            loss: 0.25,
            accuracy: 0.9,
            auc: 0.95,
            true_pos: 40,
            true_neg: 50,
            false_pos: 5,
            false_neg: 5,
        };
        let json = serde_json::to_string(&m).unwrap();
        let restored: RoundMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, m);
    }
}
