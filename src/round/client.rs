//! Collaborator contracts consumed by the orchestrator.
//!
//! Model training and evaluation live outside this crate; the orchestrator
//! only sees the [`Client`] and [`Evaluator`] traits. Clients must be
//! callable concurrently (one fit task per sampled client) and stateless
//! across rounds except for their own local training state.

use ndarray::ArrayD;

use crate::error::AegisError;
use crate::metrics::RoundMetrics;

/// Fit configuration handed to every client each round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FitConfig {
    /// Number of local epochs
    pub epochs: u32,
    /// Local batch size
    pub batch_size: u32,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            epochs: 1,
            batch_size: 32,
        }
    }
}

/// A client's local update for one round: one array per model layer plus
/// the local example count used as its aggregation weight.
#[derive(Clone, Debug)]
pub struct ClientUpdate {
    /// Identifier of the submitting client
    pub client_id: usize,
    /// Updated parameters, one array per layer, in the model's layer order
    pub layers: Vec<ArrayD<f32>>,
    /// Number of local training examples
    pub num_examples: u64,
}

/// A simulated federated client.
pub trait Client: Send + Sync {
    /// Train locally from the given global parameters and return the
    /// updated parameters with the local example count.
    fn fit(&self, global: &[f32], cfg: &FitConfig) -> Result<ClientUpdate, AegisError>;

    /// Evaluate the given parameters on the client's local data.
    ///
    /// The orchestrator itself evaluates centrally via [`Evaluator`]; this
    /// is part of the client contract for callers that want federated
    /// evaluation.
    fn evaluate(&self, params: &[f32]) -> Result<RoundMetrics, AegisError>;
}

/// Centralized evaluation of the global model after aggregation.
pub trait Evaluator {
    /// Evaluate the aggregated parameters for the given round.
    fn evaluate(&self, round: usize, params: &[f32]) -> Result<RoundMetrics, AegisError>;
}
