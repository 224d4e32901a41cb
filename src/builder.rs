use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::channel::{ChannelRegistry, DEFAULT_CAPACITY};
use crate::config::{Mode, SearchRequest};
use crate::console::Console;
use crate::error::FindError;
use crate::results::RunReport;
use crate::supervisor::{Supervisor, DEFAULT_POLL_INTERVAL};
use crate::traits::Reporter;

// ---------------------------------------------------------------------------
// SearchBuilder
// ---------------------------------------------------------------------------

/// Entry point for configuring and executing a parfind search.
///
/// Created via [`parfind::search()`](crate::search). Configure with chained
/// builder methods, then call [`run()`](SearchBuilder::run) to execute.
///
/// # Example
///
/// ```rust,ignore
/// let report = parfind::search()
///     .root("/var/log")
///     .targets(["syslog", "auth.log"])
///     .recursive(true)
///     .collect_paths(true)
///     .run()?;
/// ```
pub struct SearchBuilder {
    root:             Option<PathBuf>,
    targets:          Vec<String>,
    case_insensitive: bool,
    recursive:        bool,
    mode:             Mode,
    capacity:         usize,
    channel_name:     Option<String>,
    registry:         Option<Arc<ChannelRegistry>>,
    reporter:         Option<Arc<dyn Reporter>>,
    collect_paths:    bool,
    poll_interval:    Duration,
}

impl Default for SearchBuilder {
    fn default() -> Self {
        Self {
            root:             None,
            targets:          Vec::new(),
            case_insensitive: false,
            recursive:        false,
            mode:             Mode::default(),
            capacity:         DEFAULT_CAPACITY,
            channel_name:     None,
            registry:         None,
            reporter:         None,
            collect_paths:    false,
            poll_interval:    DEFAULT_POLL_INTERVAL,
        }
    }
}

impl SearchBuilder {
    // ── What to search ────────────────────────────────────────────────────

    /// Directory the search starts from. Must exist when the search runs.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Add one file name to look for. Each name gets its own worker.
    pub fn target(mut self, name: impl Into<String>) -> Self {
        self.targets.push(name.into());
        self
    }

    /// Add several file names, in order.
    pub fn targets<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets.extend(names.into_iter().map(Into::into));
        self
    }

    /// Compare names with ASCII case folding. Off by default.
    pub fn case_insensitive(mut self, yes: bool) -> Self {
        self.case_insensitive = yes;
        self
    }

    /// Descend into sub-directories. Off by default: only the root's
    /// immediate children are searched.
    pub fn recursive(mut self, yes: bool) -> Self {
        self.recursive = yes;
        self
    }

    // ── How to run ────────────────────────────────────────────────────────

    /// Worker scheduling and delivery. Defaults to [`Mode::Channel`].
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// How many records the result channel holds before workers block.
    pub fn capacity(mut self, n: usize) -> Self {
        self.capacity = n;
        self
    }

    /// Use this channel name instead of a fresh unique one. The run fails
    /// before spawning anything if the name is already live.
    pub fn channel_name(mut self, name: impl Into<String>) -> Self {
        self.channel_name = Some(name.into());
        self
    }

    /// Registry to create the result channel in. Each run gets a private
    /// registry unless one is shared here.
    pub fn registry(mut self, registry: Arc<ChannelRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Where results and diagnostics go. Defaults to [`Console`].
    pub fn reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Some(Arc::new(reporter));
        self
    }

    /// Same as [`reporter`](Self::reporter) for an already shared reporter.
    pub fn shared_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Collect matched paths into [`RunReport::paths`].
    ///
    /// Disabled by default to avoid allocation overhead when the reporter
    /// is all the caller needs.
    pub fn collect_paths(mut self, yes: bool) -> Self {
        self.collect_paths = yes;
        self
    }

    /// Sleep between idle drain-loop iterations.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    // ── Execute ───────────────────────────────────────────────────────────

    /// Assemble the supervisor without running it.
    pub fn build(self) -> Supervisor {
        Supervisor {
            request: SearchRequest {
                root:             self.root.unwrap_or_default(),
                targets:          self.targets,
                case_insensitive: self.case_insensitive,
                recursive:        self.recursive,
            },
            mode:          self.mode,
            capacity:      self.capacity,
            channel_name:  self.channel_name,
            registry:      self.registry.unwrap_or_else(ChannelRegistry::new),
            reporter:      self.reporter.unwrap_or_else(|| Arc::new(Console::new())),
            collect_paths: self.collect_paths,
            poll_interval: self.poll_interval,
        }
    }

    /// Execute the search and return the aggregate report.
    ///
    /// Blocks until every worker has been reaped.
    ///
    /// # Errors
    ///
    /// Returns `Err` for failures that prevent any worker from starting:
    /// a missing or non-directory root, no targets, or a result channel
    /// that could not be created. Everything later is collected into
    /// [`RunReport::failures`]; check [`RunReport::is_success`].
    pub fn run(self) -> Result<RunReport, FindError> {
        self.build().run()
    }
}
