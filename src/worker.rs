use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::channel::{MessageKind, ResultSender};
use crate::entry::MatchResult;
use crate::error::FindError;
use crate::matcher::NameMatcher;
use crate::traits::{Matcher, Reporter, Source};
use crate::walk::{DirSource, WalkConfig};

// ---------------------------------------------------------------------------
// Identity and outcome
// ---------------------------------------------------------------------------

/// Identifies one worker within a run: its target's index in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker #{}", self.0)
    }
}

/// How a worker finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure(String),
}

impl ExitStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }
}

/// Everything a worker hands back when it terminates.
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
    pub id: WorkerId,

    /// The file name this worker searched for.
    pub target: String,

    pub status: ExitStatus,

    /// Number of matches found and delivered.
    pub matches: usize,

    /// Entries visited, matched or not.
    pub entries: usize,

    /// Recoverable traversal errors reported along the way.
    pub errors: usize,

    /// Matched paths, in traversal order. Only filled in direct and
    /// sequential modes with path collection enabled; in channel mode the
    /// supervisor collects them as they arrive.
    pub paths: Vec<PathBuf>,
}

impl WorkerOutcome {
    pub(crate) fn new(id: WorkerId, target: &str) -> Self {
        Self {
            id,
            target: target.to_string(),
            status: ExitStatus::Success,
            matches: 0,
            entries: 0,
            errors: 0,
            paths: Vec::new(),
        }
    }

    pub(crate) fn fail(mut self, reason: impl Into<String>) -> Self {
        self.status = ExitStatus::Failure(reason.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Where a worker delivers what it finds.
#[derive(Clone)]
pub enum Sink {
    /// Through the result channel to the supervisor.
    Channel(ResultSender),

    /// Straight to the reporter. Cross-worker ordering is whatever the
    /// scheduler makes of it.
    Direct(Arc<dyn Reporter>),
}

impl Sink {
    fn found(&self, result: &MatchResult) -> Result<(), FindError> {
        match self {
            Sink::Channel(tx) => tx.send(MessageKind::Found, result.path.as_os_str().as_encoded_bytes()),
            Sink::Direct(reporter) => reporter.found(result),
        }
    }

    fn diagnostic(&self, message: &str) -> Result<(), FindError> {
        match self {
            Sink::Channel(tx) => tx.send(MessageKind::Diagnostic, message.as_bytes()),
            Sink::Direct(reporter) => {
                reporter.diagnostic(message);
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// SearchWorker
// ---------------------------------------------------------------------------

/// Searches one root for one file name.
///
/// A worker owns copies of everything it needs, so it can be moved onto its
/// own thread and share nothing with its siblings but the sink.
#[derive(Debug, Clone)]
pub struct SearchWorker {
    id:            WorkerId,
    root:          PathBuf,
    matcher:       NameMatcher,
    config:        WalkConfig,
    collect_paths: bool,
}

impl SearchWorker {
    pub fn new(
        id: WorkerId,
        root: impl Into<PathBuf>,
        target: impl Into<String>,
        case_insensitive: bool,
        recursive: bool,
    ) -> Self {
        Self {
            id,
            root: root.into(),
            matcher: NameMatcher::new(target, case_insensitive),
            config: WalkConfig { recursive },
            collect_paths: false,
        }
    }

    /// Keep matched paths in the outcome as well as delivering them.
    pub fn collect_paths(mut self, yes: bool) -> Self {
        self.collect_paths = yes;
        self
    }

    pub fn target(&self) -> &str {
        self.matcher.target()
    }

    /// Walk the root and deliver every match to `sink`.
    pub fn run(self, sink: &Sink) -> WorkerOutcome {
        let source = DirSource::new(&self.root);
        self.search(&source, sink)
    }

    /// Same as [`run`](Self::run) over any [`Source`].
    pub fn search(&self, source: &dyn Source, sink: &Sink) -> WorkerOutcome {
        let mut outcome = WorkerOutcome::new(self.id, self.target());
        debug!(id = %self.id, target = self.target(), root = %self.root.display(), "worker started");

        for item in source.walk(&self.config) {
            let entry = match item {
                Ok(e) => e,
                Err(err) => {
                    if !err.is_recoverable() || self.is_root(&err) {
                        debug!(id = %self.id, error = %err, "worker cannot continue");
                        return outcome.fail(err.to_string());
                    }

                    outcome.errors += 1;
                    if let Err(send_err) = sink.diagnostic(&err.to_string()) {
                        return outcome.fail(send_err.to_string());
                    }
                    continue;
                }
            };

            outcome.entries += 1;
            if !self.matcher.is_match(&entry) {
                continue;
            }

            trace!(id = %self.id, path = %entry.path.display(), "match");
            let result = MatchResult::new(entry.path);
            if let Err(err) = sink.found(&result) {
                return outcome.fail(err.to_string());
            }

            outcome.matches += 1;
            if self.collect_paths {
                outcome.paths.push(result.path);
            }
        }

        debug!(
            id = %self.id,
            matches = outcome.matches,
            entries = outcome.entries,
            errors = outcome.errors,
            "worker finished"
        );
        outcome
    }

    /// An error at the root means there is nothing left to walk.
    fn is_root(&self, err: &FindError) -> bool {
        err.path().map(|p| same_path(p, &self.root)).unwrap_or(false)
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    a.components().eq(b.components())
}
