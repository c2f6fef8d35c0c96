//! # Aegis-FL: Robust Aggregation Under Simulated Poisoning
//!
//! Aegis-FL simulates federated learning rounds in which some participants
//! are adversarial, and evaluates defenses that filter poisoned model
//! updates before they corrupt the shared global model.
//!
//! ## Aggregation Strategies
//!
//! - [`fedavg()`] - Weighted mean baseline (no defense)
//! - [`multi_krum()`] - Nearest-neighbor score selection (n >= 2f+3)
//! - [`bulyan()`] - Krum shrink + per-coordinate trimmed mean
//! - [`trimmed_mean()`] - Coordinate-wise trimmed mean
//! - [`median()`] - Coordinate-wise median
//! - [`dnc()`] - Iterated spectral outlier filtering
//! - [`history_aware()`] - Forecast-deviation detection over round history
//!
//! ## Attacks
//!
//! [`Attack`] covers the no-attack baseline, Gaussian noise, the "little is
//! enough" stealth shift, and the Fang/MinMax optimization attacks.
//!
//! ## High-Level API
//!
//! Configure an [`ExperimentConfig`], resolve it into a `(Strategy, Attack)`
//! pair, and drive the rounds with a [`RoundOrchestrator`] over your
//! [`Client`] pool. Per-round records land in a [`HistoryStore`]; metrics
//! rows can be appended to CSV via [`export`].

#![deny(missing_docs)]

pub mod aggregators;
pub mod attacks;
pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod math;
pub mod metrics;
pub mod round;

// Re-exports
pub use aggregators::bulyan::bulyan;
pub use aggregators::dnc::dnc;
pub use aggregators::fedavg::fedavg;
pub use aggregators::history_aware::history_aware;
pub use aggregators::krum::multi_krum;
pub use aggregators::median::median;
pub use aggregators::trimmed_mean::trimmed_mean;
pub use aggregators::{Aggregate, RoundContext, Strategy, StrategyConfig};
pub use attacks::{Attack, OptPolicy};
pub use config::ExperimentConfig;
pub use error::AegisError;
pub use export::{append_results, export_run, RunLabels};
pub use history::{HistoryStore, RoundRecord};
pub use math::LayerShapes;
pub use metrics::RoundMetrics;
pub use round::{Client, ClientUpdate, Evaluator, FitConfig, RoundOrchestrator, RunConfig, RunOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
