//! Experiment configuration surface.
//!
//! The orchestrator consumes an already-resolved `(Strategy, Attack)` pair;
//! this module owns the string-keyed surface that experiment runners feed in
//! (usually deserialized from JSON) and resolves it exactly once, before any
//! round runs. Unsupported names and inconsistent combinations are rejected
//! here, never mid-run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::aggregators::{Strategy, StrategyConfig};
use crate::attacks::{Attack, OptPolicy};
use crate::error::AegisError;
use crate::round::{FitConfig, RunConfig};

/// Full configuration for one experiment run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Strategy name: `fedavg`, `krum`, `bulyan`, `trimmedmean`,
    /// `fedmedian`, `dnc`, or `history_aware`
    pub strategy: String,
    /// Numeric parameters for the chosen strategy
    #[serde(default)]
    pub strategy_params: StrategyConfig,
    /// Attack name: `na`, `gaussian`, `lie`, `fang`, or `minmax`
    pub attack_fn: String,
    /// Gaussian noise scale
    #[serde(default)]
    pub magnitude: f32,
    /// Search policy for the optimization-based attacks
    #[serde(default)]
    pub opt: OptPolicy,
    /// Number of malicious clients (the first `k` ids, fixed for the run)
    pub num_malicious: usize,
    /// Rounds before attacks activate
    #[serde(default)]
    pub warmup_rounds: usize,
    /// Client pool size; every client participates every round
    pub pool_size: usize,
    /// Total number of rounds
    pub num_rounds: usize,
    /// Deviation threshold for the history-aware detector
    #[serde(default)]
    pub threshold: f32,
    /// Omniscient mode for the history-aware detector
    #[serde(default)]
    pub omniscient: bool,
    /// Seed for the run's random source
    pub seed: u64,
    /// On-disk history directory; `None` keeps history in memory only
    #[serde(default)]
    pub history_dir: Option<PathBuf>,
    /// Dataset label carried into exported result rows
    #[serde(default)]
    pub dataset_name: String,
    /// Local epochs per fit
    #[serde(default = "default_epochs")]
    pub epochs: u32,
    /// Local batch size per fit
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

fn default_epochs() -> u32 {
    1
}

fn default_batch_size() -> u32 {
    32
}

impl ExperimentConfig {
    /// Resolve the configured strategy and attack, validating the whole
    /// surface up front.
    ///
    /// Rejected combinations (all [`AegisError::InvalidConfig`]):
    /// - `num_malicious >= pool_size`
    /// - `bulyan` with more than 20 malicious clients
    /// - a non-`gaussian`, non-`na` attack with zero malicious clients
    pub fn resolve(&self) -> Result<(Strategy, Attack), AegisError> {
        if self.pool_size == 0 {
            return Err(AegisError::InvalidConfig("pool_size must be > 0".to_string()));
        }
        if self.num_malicious >= self.pool_size {
            return Err(AegisError::InvalidConfig(format!(
                "num_malicious ({}) must be below pool_size ({})",
                self.num_malicious, self.pool_size
            )));
        }
        if self.strategy == "bulyan" && self.num_malicious > 20 {
            return Err(AegisError::InvalidConfig(
                "bulyan is not run with more than 20 malicious clients".to_string(),
            ));
        }
        if self.attack_fn != "gaussian" && self.attack_fn != "na" && self.num_malicious == 0 {
            return Err(AegisError::InvalidConfig(format!(
                "attack '{}' requires at least one malicious client",
                self.attack_fn
            )));
        }

        // The run-level knobs override the strategy-param duplicates so a
        // single top-level setting drives both the detector and the attack.
        let mut params = self.strategy_params.clone();
        params.num_malicious = self.num_malicious;
        if self.threshold > 0.0 {
            params.threshold = self.threshold;
        }
        if self.omniscient {
            params.omniscient = true;
        }
        if params.window == 0 {
            params.window = self.warmup_rounds;
        }

        let strategy = Strategy::from_name(&self.strategy, &params)?;
        let attack = Attack::from_name(&self.attack_fn, self.magnitude, self.opt)?;
        Ok((strategy, attack))
    }

    /// Build the run's history store: disk-backed under `history_dir` (wiping
    /// any prior run) or memory-only when no directory is configured.
    pub fn history_store(&self) -> Result<crate::history::HistoryStore, AegisError> {
        match &self.history_dir {
            Some(dir) => crate::history::HistoryStore::with_dir(dir),
            None => Ok(crate::history::HistoryStore::in_memory()),
        }
    }

    /// The orchestrator's run-level parameters.
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            num_rounds: self.num_rounds,
            warmup_rounds: self.warmup_rounds,
            num_malicious: self.num_malicious,
            fit: FitConfig {
                epochs: self.epochs,
                batch_size: self.batch_size,
            },
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ExperimentConfig {
        ExperimentConfig {
            strategy: "krum".to_string(),
            strategy_params: StrategyConfig::default(),
            attack_fn: "gaussian".to_string(),
            magnitude: 10.0,
            opt: OptPolicy::default(),
            num_malicious: 2,
            warmup_rounds: 2,
            pool_size: 10,
            num_rounds: 5,
            threshold: 0.0,
            omniscient: false,
            seed: 42,
            history_dir: None,
            dataset_name: "synthetic".to_string(),
            epochs: 1,
            batch_size: 32,
        }
    }

    #[test]
    fn test_resolve_valid_config() {
        let cfg = base_config();
        let (strategy, attack) = cfg.resolve().unwrap();
        assert_eq!(strategy.name(), "krum");
        assert_eq!(attack.name(), "gaussian");
    }

    #[test]
    fn test_resolve_rejects_unknown_strategy() {
        let mut cfg = base_config();
        cfg.strategy = "fedprox".to_string();
        assert!(matches!(
            cfg.resolve(),
            Err(AegisError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn test_resolve_rejects_unknown_attack() {
        let mut cfg = base_config();
        cfg.attack_fn = "backdoor".to_string();
        assert!(matches!(cfg.resolve(), Err(AegisError::UnknownAttack(_))));
    }

    #[test]
    fn test_resolve_rejects_malicious_at_pool_size() {
        let mut cfg = base_config();
        cfg.num_malicious = 10;
        assert!(matches!(cfg.resolve(), Err(AegisError::InvalidConfig(_))));
    }

    #[test]
    fn test_resolve_rejects_bulyan_over_20_malicious() {
        let mut cfg = base_config();
        cfg.strategy = "bulyan".to_string();
        cfg.pool_size = 100;
        cfg.num_malicious = 21;
        assert!(matches!(cfg.resolve(), Err(AegisError::InvalidConfig(_))));
    }

    #[test]
    fn test_resolve_rejects_targeted_attack_without_malicious() {
        let mut cfg = base_config();
        cfg.attack_fn = "lie".to_string();
        cfg.num_malicious = 0;
        assert!(matches!(cfg.resolve(), Err(AegisError::InvalidConfig(_))));

        // The same zero-malicious setup is fine for the gaussian baseline.
        cfg.attack_fn = "gaussian".to_string();
        assert!(cfg.resolve().is_ok());
    }

    #[test]
    fn test_detector_window_defaults_to_warmup() {
        let mut cfg = base_config();
        cfg.strategy = "history_aware".to_string();
        cfg.warmup_rounds = 7;
        let (strategy, _) = cfg.resolve().unwrap();
        match strategy {
            Strategy::HistoryAware { window, .. } => assert_eq!(window, 7),
            other => panic!("expected HistoryAware, got {:?}", other),
        }
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let json = r#"{
            "strategy": "dnc",
            "strategy_params": {"c": 1.0, "b": 2000, "niters": 5},
            "attack_fn": "lie",
            "num_malicious": 2,
            "pool_size": 10,
            "num_rounds": 20,
            "seed": 7
        }"#;
        let cfg: ExperimentConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.epochs, 1);
        assert_eq!(cfg.batch_size, 32);
        assert_eq!(cfg.warmup_rounds, 0);
        let (strategy, attack) = cfg.resolve().unwrap();
        assert_eq!(strategy.name(), "dnc");
        assert_eq!(attack.name(), "lie");
    }
}
