//! Error types for aegis-fl

use thiserror::Error;

use crate::round::RoundPhase;

/// All possible errors in aegis-fl
#[derive(Error, Debug)]
pub enum AegisError {
    /// No updates were provided for aggregation
    #[error("Empty updates provided")]
    EmptyUpdates,

    /// Updates have inconsistent dimensions
    #[error("Dimension mismatch in updates")]
    DimensionMismatch,

    /// Trim fraction is outside valid range
    #[error("Invalid trim fraction: {0} (must be 0.0-0.5)")]
    InvalidTrimFraction(f32),

    /// A defense filtered out more clients than it can afford to lose
    #[error("Insufficient clients: need {needed}, got {actual}")]
    InsufficientClients {
        /// Minimum clients the strategy requires after filtering
        needed: usize,
        /// Clients actually remaining
        actual: usize,
    },

    /// Strategy name not recognized by the factory
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    /// Attack name not recognized by the factory
    #[error("Unknown attack: {0}")]
    UnknownAttack(String),

    /// Configuration rejected before the run started
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A simulated client failed to produce an update
    #[error("Client {client_id} failed: {reason}")]
    ClientFailure {
        /// Identifier of the failing client
        client_id: usize,
        /// Failure description
        reason: String,
    },

    /// History store violation (non-monotonic append, missing round, corrupt file)
    #[error("History error: {0}")]
    History(String),

    /// Underlying I/O failure (history files, CSV export)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A round failed mid-flight; the run aborts to keep recorded history reproducible
    #[error("Round {round} failed during {phase}: {source}")]
    RoundFailed {
        /// Round index that failed
        round: usize,
        /// Phase of the round state machine at the time of failure
        phase: RoundPhase,
        /// Underlying cause
        source: Box<AegisError>,
    },
}

impl AegisError {
    /// Attach the round index and phase an error occurred in.
    pub(crate) fn in_round(self, round: usize, phase: RoundPhase) -> Self {
        AegisError::RoundFailed {
            round,
            phase,
            source: Box::new(self),
        }
    }
}
