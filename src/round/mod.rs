//! Round orchestration: the experiment's state machine.
//!
//! Each round walks `Sampling → Fitting → Attacking → Aggregating →
//! Evaluating → Persisting`, then advances or terminates. Client fits run
//! in parallel with an all-or-fail barrier; the attack injector fires once
//! the warmup is over; a strategy that cannot decide aborts the whole run
//! rather than silently falling back to an unfiltered average.
//!
//! The orchestrator exclusively owns the global model and the
//! [`HistoryStore`]; strategies and attacks see read-only views plus the
//! run's seeded random source.

pub mod client;

pub use client::{Client, ClientUpdate, Evaluator, FitConfig};

use std::fmt;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::aggregators::{RoundContext, Strategy};
use crate::attacks::Attack;
use crate::error::AegisError;
use crate::history::{HistoryStore, RoundRecord};
use crate::math::LayerShapes;
use crate::metrics::RoundMetrics;

/// Phase of the per-round state machine, carried in logs and fatal errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundPhase {
    /// Selecting the round's participants
    Sampling,
    /// Collecting local updates in parallel
    Fitting,
    /// Injecting the configured attack into malicious updates
    Attacking,
    /// Running the aggregation strategy
    Aggregating,
    /// Centralized evaluation of the new global model
    Evaluating,
    /// Appending the finalized round record to history
    Persisting,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoundPhase::Sampling => "sampling",
            RoundPhase::Fitting => "fitting",
            RoundPhase::Attacking => "attacking",
            RoundPhase::Aggregating => "aggregating",
            RoundPhase::Evaluating => "evaluating",
            RoundPhase::Persisting => "persisting",
        };
        f.write_str(name)
    }
}

/// Run-level parameters for the orchestrator.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Total number of federated rounds
    pub num_rounds: usize,
    /// Rounds before the attack injector activates
    pub warmup_rounds: usize,
    /// Number of malicious clients (the first `k` client ids, fixed for the run)
    pub num_malicious: usize,
    /// Per-round fit configuration sent to every client
    pub fit: FitConfig,
    /// Seed for the run's random source
    pub seed: u64,
}

/// Outcome of a completed run: one metrics entry per round, in order.
#[derive(Clone, Debug, Default)]
pub struct RunOutcome {
    /// Centralized metrics per round
    pub metrics: Vec<RoundMetrics>,
    /// Kept client indices per round
    pub kept: Vec<Vec<usize>>,
}

/// Drives warmup, attack injection, aggregation, evaluation, and history
/// persistence across all rounds of one experiment.
pub struct RoundOrchestrator<'a> {
    clients: Vec<Box<dyn Client + 'a>>,
    evaluator: Box<dyn Evaluator + 'a>,
    strategy: Strategy,
    attack: Attack,
    shapes: LayerShapes,
    global: Vec<f32>,
    malicious: Vec<usize>,
    history: HistoryStore,
    cfg: RunConfig,
    rng: StdRng,
}

impl<'a> RoundOrchestrator<'a> {
    /// Build an orchestrator over a fixed client pool.
    ///
    /// `initial_global` is the starting global model in layered form; its
    /// shapes become the flatten/unflatten template for the whole run. The
    /// first `num_malicious` client indices are malicious for the entire
    /// run. Fails fast if the malicious count does not leave an honest
    /// majority basis (`num_malicious >= pool_size`).
    pub fn new(
        clients: Vec<Box<dyn Client + 'a>>,
        evaluator: Box<dyn Evaluator + 'a>,
        strategy: Strategy,
        attack: Attack,
        initial_global: &[ndarray::ArrayD<f32>],
        history: HistoryStore,
        cfg: RunConfig,
    ) -> Result<Self, AegisError> {
        if clients.is_empty() {
            return Err(AegisError::InvalidConfig("empty client pool".to_string()));
        }
        if cfg.num_malicious >= clients.len() {
            return Err(AegisError::InvalidConfig(format!(
                "num_malicious ({}) must be below pool size ({})",
                cfg.num_malicious,
                clients.len()
            )));
        }
        let shapes = LayerShapes::from_layers(initial_global);
        let global = shapes.flatten(initial_global)?;
        let malicious: Vec<usize> = (0..cfg.num_malicious).collect();
        let rng = StdRng::seed_from_u64(cfg.seed);
        Ok(Self {
            clients,
            evaluator,
            strategy,
            attack,
            shapes,
            global,
            malicious,
            history,
            cfg,
            rng,
        })
    }

    /// The current global model, flattened.
    pub fn global(&self) -> &[f32] {
        &self.global
    }

    /// The current global model in layered form.
    pub fn global_layers(&self) -> Result<Vec<ndarray::ArrayD<f32>>, AegisError> {
        self.shapes.unflatten(&self.global)
    }

    /// Read access to the recorded history.
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Run every round to termination.
    ///
    /// A fatal round error aborts the run and surfaces as
    /// [`AegisError::RoundFailed`]; no partial round is recorded.
    pub fn run(&mut self) -> Result<RunOutcome, AegisError> {
        info!(
            "starting run: {} rounds, {} clients ({} malicious), strategy={}, attack={}",
            self.cfg.num_rounds,
            self.clients.len(),
            self.cfg.num_malicious,
            self.strategy.name(),
            self.attack.name()
        );
        let mut outcome = RunOutcome::default();
        for round in 0..self.cfg.num_rounds {
            let record = self.run_round(round)?;
            outcome.metrics.push(record.metrics.clone());
            outcome.kept.push(record.kept.clone());
            self.history
                .append(record)
                .map_err(|e| e.in_round(round, RoundPhase::Persisting))?;
        }
        info!("run terminated after {} rounds", self.cfg.num_rounds);
        Ok(outcome)
    }

    /// Execute one round through every phase, returning its finalized record.
    fn run_round(&mut self, round: usize) -> Result<RoundRecord, AegisError> {
        // Sampling: every client participates every round.
        let pool = self.clients.len();
        debug!("round {}: {} {} clients", round, RoundPhase::Sampling, pool);

        // Fitting: parallel local training with an all-or-fail barrier.
        let global = &self.global;
        let fit_cfg = self.cfg.fit;
        let results: Vec<Result<ClientUpdate, AegisError>> = self
            .clients
            .par_iter()
            .map(|c| c.fit(global, &fit_cfg))
            .collect();

        let mut flats = Vec::with_capacity(pool);
        let mut num_examples = Vec::with_capacity(pool);
        for (client_id, result) in results.into_iter().enumerate() {
            let update = result.map_err(|e| {
                AegisError::ClientFailure {
                    client_id,
                    reason: e.to_string(),
                }
                .in_round(round, RoundPhase::Fitting)
            })?;
            let flat = self
                .shapes
                .flatten(&update.layers)
                .map_err(|e| e.in_round(round, RoundPhase::Fitting))?;
            flats.push(flat);
            num_examples.push(update.num_examples);
        }

        // Attacking: replace malicious updates once the warmup is over.
        if round >= self.cfg.warmup_rounds && !self.malicious.is_empty() {
            debug!(
                "round {}: {} {} on {} clients",
                round,
                RoundPhase::Attacking,
                self.attack.name(),
                self.malicious.len()
            );
            self.attack
                .apply(&mut flats, &self.malicious, &mut self.rng)
                .map_err(|e| e.in_round(round, RoundPhase::Attacking))?;
        }

        // Aggregating: a strategy that cannot decide is fatal for the run.
        let weights: Vec<f32> = num_examples.iter().map(|&n| n as f32).collect();
        let mut ctx = RoundContext {
            history: &self.history,
            malicious: &self.malicious,
            rng: &mut self.rng,
        };
        let aggregate = self
            .strategy
            .aggregate(&flats, &weights, &mut ctx)
            .map_err(|e| e.in_round(round, RoundPhase::Aggregating))?;
        self.global = aggregate.params.clone();

        // Evaluating: centralized metrics on the updated global model.
        let metrics = self
            .evaluator
            .evaluate(round, &self.global)
            .map_err(|e| e.in_round(round, RoundPhase::Evaluating))?;
        info!(
            "round {}: kept {}/{} clients, loss={:.4}, accuracy={:.4}",
            round,
            aggregate.kept.len(),
            pool,
            metrics.loss,
            metrics.accuracy
        );

        Ok(RoundRecord {
            round,
            client_params: flats,
            num_examples,
            malicious: self.malicious.clone(),
            kept: aggregate.kept,
            aggregated: aggregate.params,
            metrics,
        })
    }
}
