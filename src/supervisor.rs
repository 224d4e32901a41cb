use std::any::Any;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::channel::{ChannelRegistry, Message, MessageKind, ResultChannel};
use crate::config::{Mode, SearchRequest};
use crate::entry::MatchResult;
use crate::error::FindError;
use crate::results::{RunReport, ScanStats};
use crate::traits::Reporter;
use crate::worker::{ExitStatus, SearchWorker, Sink, WorkerId, WorkerOutcome};

/// How long the drain loop sleeps after an iteration that found nothing to
/// receive and nobody to reap.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_micros(200);

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Where a run is in its lifecycle. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    Validating,
    ChannelSetup,
    Spawning,
    Draining,
    Finalizing,
    Terminal { success: bool },
}

fn enter(phase: Phase) {
    match phase {
        Phase::Terminal { success } => debug!(success, "supervisor terminal"),
        _ => debug!(?phase, "supervisor phase"),
    }
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

/// Runs one [`SearchWorker`] per target name and collects every outcome.
///
/// Built by [`SearchBuilder`](crate::SearchBuilder); most callers never touch
/// this type directly.
pub struct Supervisor {
    pub(crate) request:       SearchRequest,
    pub(crate) mode:          Mode,
    pub(crate) capacity:      usize,
    pub(crate) channel_name:  Option<String>,
    pub(crate) registry:      Arc<ChannelRegistry>,
    pub(crate) reporter:      Arc<dyn Reporter>,
    pub(crate) collect_paths: bool,
    pub(crate) poll_interval: Duration,
}

/// A spawned worker that has not been reaped yet.
struct Pending {
    id:     WorkerId,
    target: String,
    handle: JoinHandle<WorkerOutcome>,
}

/// Everything collected while a run is in flight.
#[derive(Default)]
struct RunState {
    outcomes:      HashMap<WorkerId, WorkerOutcome>,
    paths:         Vec<PathBuf>,
    failures:      Vec<FindError>,
    output_failed: bool,
}

impl Supervisor {
    /// Execute the run.
    ///
    /// # Errors
    ///
    /// Returns `Err` only when no worker was ever started: an invalid root,
    /// no targets, or a result channel that could not be created. Failures
    /// after that point (spawn errors, failed or panicked workers, channel
    /// trouble) are collected into [`RunReport::failures`] once every
    /// started worker has been reaped.
    pub fn run(self) -> Result<RunReport, FindError> {
        enter(Phase::Init);
        let result = self.execute();
        let success = matches!(&result, Ok(report) if report.is_success());
        enter(Phase::Terminal { success });
        result
    }

    fn execute(&self) -> Result<RunReport, FindError> {
        enter(Phase::Validating);
        self.request.validate()?;

        match self.mode {
            Mode::Sequential => Ok(self.run_sequential()),
            Mode::Direct => Ok(self.run_threaded(None)),
            Mode::Channel => {
                enter(Phase::ChannelSetup);
                let name = self
                    .channel_name
                    .clone()
                    .unwrap_or_else(|| self.registry.unique_name());
                let channel = self.registry.create(&name, self.capacity)?;
                Ok(self.run_threaded(Some(channel)))
            }
        }
    }

    fn worker(&self, index: usize, target: &str) -> SearchWorker {
        SearchWorker::new(
            WorkerId(index),
            &self.request.root,
            target,
            self.request.case_insensitive,
            self.request.recursive,
        )
    }

    // -- Sequential ---------------------------------------------------------

    fn run_sequential(&self) -> RunReport {
        let start = Instant::now();
        let mut state = RunState::default();
        let sink = Sink::Direct(Arc::clone(&self.reporter));

        enter(Phase::Spawning);
        for (index, target) in self.request.targets.iter().enumerate() {
            let outcome = self.worker(index, target).collect_paths(self.collect_paths).run(&sink);
            self.record(outcome, &mut state);
        }

        enter(Phase::Finalizing);
        self.finish(state, None, start.elapsed())
    }

    // -- Threaded -----------------------------------------------------------

    fn run_threaded(&self, channel: Option<ResultChannel>) -> RunReport {
        let start = Instant::now();
        let mut state = RunState::default();

        enter(Phase::Spawning);
        let mut pending = Vec::with_capacity(self.request.targets.len());
        for (index, target) in self.request.targets.iter().enumerate() {
            // In channel mode the supervisor sees every path itself.
            let worker = self
                .worker(index, target)
                .collect_paths(self.collect_paths && channel.is_none());
            let sink = match &channel {
                Some(ch) => Sink::Channel(ch.sender()),
                None     => Sink::Direct(Arc::clone(&self.reporter)),
            };

            let spawned = thread::Builder::new()
                .name(format!("parfind-worker-{index}"))
                .spawn(move || worker.run(&sink));

            match spawned {
                Ok(handle) => pending.push(Pending {
                    id: WorkerId(index),
                    target: target.clone(),
                    handle,
                }),
                Err(source) => {
                    self.fail(&mut state, FindError::Spawn {
                        target: target.clone(),
                        source,
                    });
                    break;
                }
            }
        }
        let spawned = pending.len();
        info!(workers = spawned, mode = ?self.mode, "workers started");

        enter(Phase::Draining);
        self.drain(channel.as_ref(), pending, &mut state);
        debug_assert_eq!(state.outcomes.len(), spawned);

        enter(Phase::Finalizing);
        let channel_name = channel.map(|ch| {
            let name = ch.name().to_string();
            ch.destroy();
            name
        });
        self.finish(state, channel_name, start.elapsed())
    }

    /// Poll the channel and the workers, never blocking on either, until
    /// every worker has been reaped.
    fn drain(&self, channel: Option<&ResultChannel>, mut pending: Vec<Pending>, state: &mut RunState) {
        while !pending.is_empty() {
            let mut progressed = false;

            if let Some(ch) = channel {
                progressed |= self.receive(ch, state) > 0;
            }

            let mut i = 0;
            while i < pending.len() {
                if pending[i].handle.is_finished() {
                    let done = pending.swap_remove(i);
                    self.reap(done, state);
                    progressed = true;
                } else {
                    i += 1;
                }
            }

            if !progressed {
                thread::sleep(self.poll_interval);
            }
        }

        // Records sent just before the last worker exited.
        if let Some(ch) = channel {
            while self.receive(ch, state) > 0 {}
        }
    }

    /// Take up to one channel's worth of records without blocking. Returns
    /// how many were delivered.
    fn receive(&self, channel: &ResultChannel, state: &mut RunState) -> usize {
        let mut delivered = 0;
        for _ in 0..channel.capacity() {
            match channel.try_recv() {
                Ok(Some(message)) => {
                    self.deliver(message, state);
                    delivered += 1;
                }
                Ok(None) => break,
                Err(err) => {
                    self.fail(state, err);
                    break;
                }
            }
        }
        delivered
    }

    fn deliver(&self, message: Message, state: &mut RunState) {
        match message.kind() {
            MessageKind::Found => {
                let result = MatchResult::new(message.path());
                self.print(&result, state);
                if self.collect_paths {
                    state.paths.push(result.path);
                }
            }
            MessageKind::Diagnostic => self.reporter.diagnostic(&message.text()),
        }
    }

    fn reap(&self, done: Pending, state: &mut RunState) {
        let Pending { id, target, handle } = done;
        match handle.join() {
            Ok(outcome) => self.record(outcome, state),
            Err(panic) => {
                let reason = format!("worker panicked: {}", panic_message(&*panic));
                let outcome = WorkerOutcome::new(id, &target).fail(reason);
                self.record(outcome, state);
            }
        }
    }

    fn record(&self, outcome: WorkerOutcome, state: &mut RunState) {
        debug!(id = %outcome.id, target = %outcome.target, status = ?outcome.status, "worker reaped");
        if let ExitStatus::Failure(reason) = &outcome.status {
            self.fail(state, FindError::WorkerFailed {
                id:     outcome.id,
                target: outcome.target.clone(),
                reason: reason.clone(),
            });
        }
        state.outcomes.insert(outcome.id, outcome);
    }

    fn print(&self, result: &MatchResult, state: &mut RunState) {
        if let Err(err) = self.reporter.found(result) {
            // One broken stdout is enough to report.
            if !state.output_failed {
                state.output_failed = true;
                self.fail(state, err);
            }
        }
    }

    fn fail(&self, state: &mut RunState, err: FindError) {
        self.reporter.diagnostic(&err.to_string());
        state.failures.push(err);
    }

    fn finish(&self, state: RunState, channel: Option<String>, duration: Duration) -> RunReport {
        let RunState { outcomes, mut paths, failures, .. } = state;

        let mut ids: Vec<&WorkerId> = outcomes.keys().collect();
        ids.sort();
        for id in ids {
            paths.extend(outcomes[id].paths.iter().cloned());
        }

        let matches: usize = outcomes.values().map(|o| o.matches).sum();
        let entries: usize = outcomes.values().map(|o| o.entries).sum();
        let errors: usize  = outcomes.values().map(|o| o.errors).sum();

        info!(matches, failures = failures.len(), "run finished");
        RunReport {
            outcomes,
            matches,
            paths,
            failures,
            channel,
            stats: ScanStats::compute(entries, errors, duration),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".into()
    }
}
