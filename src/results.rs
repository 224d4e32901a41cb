use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::FindError;
use crate::worker::{WorkerId, WorkerOutcome};

/// The aggregate outcome of a completed run.
///
/// A run only produces a report once every spawned worker has been reaped,
/// so `outcomes.len()` always equals the number of workers that started.
#[derive(Debug)]
pub struct RunReport {
    /// One outcome per spawned worker, keyed by worker identity.
    pub outcomes: HashMap<WorkerId, WorkerOutcome>,

    /// Total number of matches delivered across all workers.
    pub matches: usize,

    /// Matched paths. Only populated if `.collect_paths(true)` was set on the
    /// builder. Within one worker paths keep traversal order; across workers
    /// the order is arbitrary.
    pub paths: Vec<PathBuf>,

    /// Run-level failures: spawn errors, channel errors, failed or panicked
    /// workers. Empty on success.
    pub failures: Vec<FindError>,

    /// Name of the result channel the run used, if it used one. The channel
    /// no longer exists once the report is returned.
    pub channel: Option<String>,

    /// Scan statistics summed over all workers.
    pub stats: ScanStats,
}

impl RunReport {
    /// `true` iff nothing went wrong at run level and every worker succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.outcomes.values().all(|o| o.status.is_success())
    }

    /// Number of workers that were started and reaped.
    pub fn workers(&self) -> usize {
        self.outcomes.len()
    }
}

/// Performance statistics for a completed run.
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    /// Entries visited, summed over every worker's walk.
    pub entries: usize,

    /// Recoverable traversal errors reported.
    pub errors: usize,

    /// Wall-clock time from the first spawn to the last reap.
    pub duration: Duration,

    /// Entries scanned per second, clamped to 0 on zero-duration runs.
    pub entries_per_sec: usize,
}

impl ScanStats {
    pub(crate) fn compute(entries: usize, errors: usize, duration: Duration) -> Self {
        let eps = if duration.as_secs_f64() > 0.0 {
            (entries as f64 / duration.as_secs_f64()) as usize
        } else {
            0
        };
        Self {
            entries,
            errors,
            duration,
            entries_per_sec: eps,
        }
    }
}
