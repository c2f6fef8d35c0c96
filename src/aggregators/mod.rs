//! Robust aggregation strategies for poisoned federated rounds.
//!
//! Seven strategies with varying defense mechanisms:
//!
//! | Strategy | Defense | Filtering |
//! |----------|---------|-----------|
//! | [`fedavg()`] | none (baseline) | — |
//! | [`multi_krum()`] | nearest-neighbor scores | per-client |
//! | [`bulyan()`] | Krum shrink + trimmed mean | per-client + per-coordinate |
//! | [`trimmed_mean()`] | trim coordinate extremes | per-coordinate |
//! | [`median()`] | coordinate median | per-coordinate |
//! | [`dnc()`] | spectral outlier scores | per-client, iterated |
//! | [`history_aware()`] | forecast deviation | per-client, windowed |
//!
//! All strategies share one contract: a round's flat updates plus weights in,
//! one aggregated update plus the kept client index set out. Every strategy
//! is deterministic given fixed input order and a fixed seed; randomness
//! (DnC subsampling) comes only from the caller-supplied source in
//! [`RoundContext`].

pub mod bulyan;
pub mod dnc;
pub mod fedavg;
pub mod history_aware;
pub mod krum;
pub mod median;
pub mod trimmed_mean;

pub use bulyan::bulyan;
pub use dnc::dnc;
pub use fedavg::fedavg;
pub use history_aware::{history_aware, HistoryAwareParams};
pub use krum::{krum_scores, multi_krum};
pub use median::median;
pub use trimmed_mean::trimmed_mean;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::AegisError;
use crate::history::HistoryStore;

/// Result of one aggregation: the new global update and which clients were
/// judged good.
#[derive(Clone, Debug, PartialEq)]
pub struct Aggregate {
    /// Aggregated flat update
    pub params: Vec<f32>,
    /// Indices of the clients that contributed, sorted ascending
    pub kept: Vec<usize>,
}

/// Per-round context handed to the strategy dispatch.
///
/// Strategies receive read-only history (rounds strictly before the current
/// one) and a mutable handle on the run's seeded random source.
pub struct RoundContext<'a> {
    /// History of finalized past rounds
    pub history: &'a HistoryStore,
    /// Client indices configured as malicious (consumed only in omniscient mode)
    pub malicious: &'a [usize],
    /// Seeded random source owned by the orchestrator
    pub rng: &'a mut StdRng,
}

/// Numeric parameters for the chosen strategy, bound once at experiment
/// start. Fields not used by the selected strategy are ignored.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Assumed number of malicious clients (Krum/Bulyan `f`, DnC `m`)
    pub num_malicious: usize,
    /// Clients to keep after selection; defaults to `n - num_malicious`
    pub num_to_keep: Option<usize>,
    /// Trim fraction for the trimmed mean (0.0..0.5)
    pub trim_fraction: f32,
    /// Values trimmed per coordinate in Bulyan's second stage; defaults to
    /// `num_malicious`
    pub beta: Option<usize>,
    /// DnC filtering aggressiveness
    pub c: f32,
    /// DnC coordinate subsampling width (0 disables)
    pub b: usize,
    /// DnC iteration count
    pub niters: usize,
    /// History window for the history-aware detector
    pub window: usize,
    /// Deviation threshold for the history-aware detector
    pub threshold: f32,
    /// Omniscient mode: the detector drops the configured malicious ids
    pub omniscient: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            num_malicious: 0,
            num_to_keep: None,
            trim_fraction: 0.2,
            beta: None,
            c: 1.0,
            b: 0,
            niters: 1,
            window: 0,
            threshold: 0.0,
            omniscient: false,
        }
    }
}

/// Aggregation strategy, resolved once at startup from its configured name.
#[derive(Clone, Debug, PartialEq)]
pub enum Strategy {
    /// Weighted mean over all updates (no defense)
    FedAvg,
    /// Multi-Krum selection of the lowest-scoring clients
    Krum {
        /// Assumed malicious count
        f: usize,
        /// Clients to keep; `None` means `n - f` at aggregation time
        to_keep: Option<usize>,
    },
    /// Krum shrink to `n - 2f`, then beta-trimmed coordinate mean
    Bulyan {
        /// Assumed malicious count
        f: usize,
        /// Per-coordinate trim count
        beta: usize,
    },
    /// Coordinate-wise trimmed mean
    TrimmedMean {
        /// Fraction trimmed from each end per coordinate
        trim_fraction: f32,
    },
    /// Coordinate-wise median
    FedMedian,
    /// Divide-and-conquer spectral filtering
    Dnc {
        /// Filtering aggressiveness
        c: f32,
        /// Subsampling width (0 disables)
        b: usize,
        /// Iteration count
        niters: usize,
        /// Assumed malicious count
        num_malicious: usize,
    },
    /// Forecast-deviation detector over the round history
    HistoryAware {
        /// Past rounds used for forecasting
        window: usize,
        /// Deviation threshold
        threshold: f32,
        /// Clients to keep; `None` means `n - num_malicious`
        to_keep: Option<usize>,
        /// Assumed malicious count
        num_malicious: usize,
        /// Drop configured malicious ids directly
        omniscient: bool,
    },
}

impl Strategy {
    /// Resolve a strategy from its configured name.
    ///
    /// Recognized names: `fedavg`, `krum`, `bulyan`, `trimmedmean`,
    /// `fedmedian`, `dnc`, `history_aware`. Unknown names fail fast with
    /// [`AegisError::UnknownStrategy`] before any round runs.
    pub fn from_name(name: &str, cfg: &StrategyConfig) -> Result<Self, AegisError> {
        match name {
            "fedavg" => Ok(Strategy::FedAvg),
            "krum" => Ok(Strategy::Krum {
                f: cfg.num_malicious,
                to_keep: cfg.num_to_keep,
            }),
            "bulyan" => Ok(Strategy::Bulyan {
                f: cfg.num_malicious,
                beta: cfg.beta.unwrap_or(cfg.num_malicious),
            }),
            "trimmedmean" => Ok(Strategy::TrimmedMean {
                trim_fraction: cfg.trim_fraction,
            }),
            "fedmedian" => Ok(Strategy::FedMedian),
            "dnc" => Ok(Strategy::Dnc {
                c: cfg.c,
                b: cfg.b,
                niters: cfg.niters,
                num_malicious: cfg.num_malicious,
            }),
            "history_aware" => Ok(Strategy::HistoryAware {
                window: cfg.window,
                threshold: cfg.threshold,
                to_keep: cfg.num_to_keep,
                num_malicious: cfg.num_malicious,
                omniscient: cfg.omniscient,
            }),
            other => Err(AegisError::UnknownStrategy(other.to_string())),
        }
    }

    /// The strategy's canonical configuration name.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::FedAvg => "fedavg",
            Strategy::Krum { .. } => "krum",
            Strategy::Bulyan { .. } => "bulyan",
            Strategy::TrimmedMean { .. } => "trimmedmean",
            Strategy::FedMedian => "fedmedian",
            Strategy::Dnc { .. } => "dnc",
            Strategy::HistoryAware { .. } => "history_aware",
        }
    }

    /// Aggregate one round of flat updates.
    ///
    /// `updates` and `weights` are in client order; the kept set in the
    /// result refers to positions in that order.
    pub fn aggregate(
        &self,
        updates: &[Vec<f32>],
        weights: &[f32],
        ctx: &mut RoundContext<'_>,
    ) -> Result<Aggregate, AegisError> {
        let n = updates.len();
        match self {
            Strategy::FedAvg => {
                let params = fedavg(updates, Some(weights))?;
                Ok(Aggregate {
                    params,
                    kept: (0..n).collect(),
                })
            }
            Strategy::Krum { f, to_keep } => {
                let keep = to_keep.unwrap_or_else(|| n.saturating_sub(*f));
                multi_krum(updates, weights, *f, keep)
            }
            Strategy::Bulyan { f, beta } => bulyan(updates, *f, *beta),
            Strategy::TrimmedMean { trim_fraction } => {
                let params = trimmed_mean(updates, *trim_fraction)?;
                Ok(Aggregate {
                    params,
                    kept: (0..n).collect(),
                })
            }
            Strategy::FedMedian => {
                let params = median(updates)?;
                Ok(Aggregate {
                    params,
                    kept: (0..n).collect(),
                })
            }
            Strategy::Dnc {
                c,
                b,
                niters,
                num_malicious,
            } => dnc(updates, weights, *c, *b, *niters, *num_malicious, ctx.rng),
            Strategy::HistoryAware {
                window,
                threshold,
                to_keep,
                num_malicious,
                omniscient,
            } => {
                let params = HistoryAwareParams {
                    window: *window,
                    threshold: *threshold,
                    to_keep: to_keep.unwrap_or_else(|| n.saturating_sub(*num_malicious)),
                    omniscient: *omniscient,
                };
                history_aware(updates, weights, &params, ctx.malicious, ctx.history)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn ctx<'a>(history: &'a HistoryStore, rng: &'a mut StdRng) -> RoundContext<'a> {
        RoundContext {
            history,
            malicious: &[],
            rng,
        }
    }

    #[test]
    fn test_factory_resolves_all_names() {
        let cfg = StrategyConfig::default();
        for name in [
            "fedavg",
            "krum",
            "bulyan",
            "trimmedmean",
            "fedmedian",
            "dnc",
            "history_aware",
        ] {
            let strategy = Strategy::from_name(name, &cfg).unwrap();
            assert_eq!(strategy.name(), name);
        }
    }

    #[test]
    fn test_factory_rejects_unknown_name() {
        let cfg = StrategyConfig::default();
        assert!(matches!(
            Strategy::from_name("fedprox", &cfg),
            Err(AegisError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn test_dispatch_fedavg_keeps_all() {
        let history = HistoryStore::in_memory();
        let mut rng = StdRng::seed_from_u64(0);
        let updates = vec![vec![1.0], vec![3.0]];
        let weights = vec![1.0, 1.0];
        let result = Strategy::FedAvg
            .aggregate(&updates, &weights, &mut ctx(&history, &mut rng))
            .unwrap();
        assert_eq!(result.kept, vec![0, 1]);
        assert!((result.params[0] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_krum_default_keep_is_n_minus_f() {
        let history = HistoryStore::in_memory();
        let mut rng = StdRng::seed_from_u64(0);
        let strategy = Strategy::Krum { f: 1, to_keep: None };
        let updates = vec![vec![1.0], vec![1.1], vec![0.9], vec![1.05], vec![80.0]];
        let weights = vec![1.0; 5];
        let result = strategy
            .aggregate(&updates, &weights, &mut ctx(&history, &mut rng))
            .unwrap();
        assert_eq!(result.kept.len(), 4);
        assert!(!result.kept.contains(&4));
    }

    #[test]
    fn test_identical_updates_all_strategies_idempotent() {
        let history = HistoryStore::in_memory();
        let cfg = StrategyConfig {
            num_malicious: 1,
            window: 2,
            ..StrategyConfig::default()
        };
        let updates = vec![vec![2.0, -1.0]; 8];
        let weights = vec![1.0; 8];
        for name in [
            "fedavg",
            "krum",
            "bulyan",
            "trimmedmean",
            "fedmedian",
            "dnc",
            "history_aware",
        ] {
            let strategy = Strategy::from_name(name, &cfg).unwrap();
            let mut rng = StdRng::seed_from_u64(11);
            let result = strategy
                .aggregate(&updates, &weights, &mut ctx(&history, &mut rng))
                .unwrap();
            for (got, want) in result.params.iter().zip(updates[0].iter()) {
                assert!(
                    (got - want).abs() < 1e-5,
                    "{} altered identical updates: {} vs {}",
                    name,
                    got,
                    want
                );
            }
            assert!(
                result.kept.len() >= updates.len() - 2,
                "{} kept too few of the identical updates",
                name
            );
        }
    }
}
