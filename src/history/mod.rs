//! Append-only per-round history of raw client parameter snapshots.
//!
//! The orchestrator finalizes one [`RoundRecord`] per round and appends it
//! here; the history-aware detector reads a sliding window of past rounds,
//! and offline forensic tooling can re-read any round from disk. Records are
//! keyed by round index and never mutated after append. A fresh run clears
//! any prior run's on-disk store before round 0.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AegisError;
use crate::metrics::RoundMetrics;

/// Finalized record of one federated round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Round index (0-based)
    pub round: usize,
    /// Raw flat parameter snapshot per client, in client order, as submitted
    /// to aggregation (post-attack)
    pub client_params: Vec<Vec<f32>>,
    /// Local example counts per client, in client order
    pub num_examples: Vec<u64>,
    /// Client indices that were malicious this round
    pub malicious: Vec<usize>,
    /// Client indices the strategy kept
    pub kept: Vec<usize>,
    /// The aggregated flat update applied to the global model
    pub aggregated: Vec<f32>,
    /// Centralized evaluation of the updated global model
    pub metrics: RoundMetrics,
}

/// Append-only log of [`RoundRecord`]s, optionally persisted to disk as one
/// JSON file per round.
#[derive(Debug)]
pub struct HistoryStore {
    records: Vec<RoundRecord>,
    dir: Option<PathBuf>,
}

impl HistoryStore {
    /// Create a memory-only store.
    pub fn in_memory() -> Self {
        Self {
            records: Vec::new(),
            dir: None,
        }
    }

    /// Create a disk-backed store rooted at `dir`.
    ///
    /// Any prior run's contents under `dir` are removed first; history is
    /// never reused across runs.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Result<Self, AegisError> {
        let dir = dir.into();
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;
        Ok(Self {
            records: Vec::new(),
            dir: Some(dir),
        })
    }

    /// Append a finalized round record.
    ///
    /// Rounds must arrive in order: `record.round` must equal the current
    /// length of the log.
    pub fn append(&mut self, record: RoundRecord) -> Result<(), AegisError> {
        if record.round != self.records.len() {
            return Err(AegisError::History(format!(
                "non-monotonic append: expected round {}, got {}",
                self.records.len(),
                record.round
            )));
        }
        if let Some(dir) = &self.dir {
            let path = round_path(dir, record.round);
            let json = serde_json::to_string(&record)
                .map_err(|e| AegisError::History(e.to_string()))?;
            fs::write(path, json)?;
        }
        self.records.push(record);
        Ok(())
    }

    /// Number of recorded rounds.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record for a specific round, if present.
    pub fn get(&self, round: usize) -> Option<&RoundRecord> {
        self.records.get(round)
    }

    /// The last `window` records, oldest first (fewer if the log is shorter).
    pub fn last(&self, window: usize) -> &[RoundRecord] {
        let start = self.records.len().saturating_sub(window);
        &self.records[start..]
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[RoundRecord] {
        &self.records
    }

    /// Random-access read of a single round file from a history directory,
    /// independent of any live store (offline forensics).
    pub fn load_round(dir: &Path, round: usize) -> Result<RoundRecord, AegisError> {
        let path = round_path(dir, round);
        let json = fs::read_to_string(&path)?;
        serde_json::from_str(&json)
            .map_err(|e| AegisError::History(format!("{}: {}", path.display(), e)))
    }
}

fn round_path(dir: &Path, round: usize) -> PathBuf {
    dir.join(format!("round_{:05}.json", round))
}
