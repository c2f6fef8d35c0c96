//! CSV export of per-round results.
//!
//! One row per round, appended both to a run-level file and to a shared
//! all-runs file so sweeps accumulate into a single table. Headers are
//! written only when a file is created.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::error::AegisError;
use crate::metrics::RoundMetrics;

/// Run-constant labels repeated on every exported row.
#[derive(Clone, Debug)]
pub struct RunLabels {
    /// Attack name
    pub attack_fn: String,
    /// Dataset label
    pub dataset_name: String,
    /// Number of malicious clients
    pub num_malicious: usize,
    /// Strategy name
    pub strategy: String,
    /// Aggregation function label (strategy name unless a caller overrides it)
    pub aggregate_fn: String,
}

const HEADER: &str =
    "round,loss,accuracy,auc,TP,TN,FP,FN,attack_fn,dataset_name,num_malicious,strategy,aggregate_fn";

/// Append one row per round to `path`, creating the file with a header if
/// it does not exist yet.
pub fn append_results(
    path: &Path,
    labels: &RunLabels,
    metrics: &[RoundMetrics],
) -> Result<(), AegisError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let fresh = !path.exists();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if fresh {
        writeln!(file, "{}", HEADER)?;
    }
    for (round, m) in metrics.iter().enumerate() {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{},{},{},{},{}",
            round,
            m.loss,
            m.accuracy,
            m.auc,
            m.true_pos,
            m.true_neg,
            m.false_pos,
            m.false_neg,
            labels.attack_fn,
            labels.dataset_name,
            labels.num_malicious,
            labels.strategy,
            labels.aggregate_fn,
        )?;
    }
    Ok(())
}

/// Append the same rows to the run-level file and the shared all-runs file.
pub fn export_run(
    run_path: &Path,
    all_runs_path: &Path,
    labels: &RunLabels,
    metrics: &[RoundMetrics],
) -> Result<(), AegisError> {
    append_results(run_path, labels, metrics)?;
    append_results(all_runs_path, labels, metrics)
}
