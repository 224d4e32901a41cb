//! # parfind
//!
//! Find files by name, one isolated search worker per name.
//!
//! A [`Supervisor`] validates the request, starts one [`SearchWorker`] per
//! target name on its own thread, and drains a bounded [`ResultChannel`]
//! while reaping finished workers. Each worker walks the whole tree by
//! itself: N names cost N walks, and a failure in one never reaches the
//! others.
//!
//! # Quick Start
//!
//! ```rust
//! use parfind::{FindError, MatchResult, Reporter};
//! use std::sync::Mutex;
//!
//! #[derive(Default)]
//! struct Quiet(Mutex<Vec<String>>);
//!
//! impl Reporter for Quiet {
//!     fn found(&self, result: &MatchResult) -> Result<(), FindError> {
//!         self.0.lock().unwrap().push(result.path.display().to_string());
//!         Ok(())
//!     }
//!     fn diagnostic(&self, _message: &str) {}
//! }
//!
//! let dir = std::env::temp_dir().join(format!("parfind-doc-{}", std::process::id()));
//! std::fs::create_dir_all(dir.join("sub")).unwrap();
//! std::fs::write(dir.join("notes.txt"), "").unwrap();
//! std::fs::write(dir.join("sub").join("NOTES.TXT"), "").unwrap();
//!
//! let report = parfind::search()
//!     .root(&dir)
//!     .target("notes.txt")
//!     .case_insensitive(true)
//!     .recursive(true)
//!     .reporter(Quiet::default())
//!     .run()
//!     .unwrap();
//!
//! assert!(report.is_success());
//! assert_eq!(report.matches, 2);
//! # std::fs::remove_dir_all(&dir).unwrap();
//! ```
//!
//! # Modes
//!
//! - [`Mode::Channel`]: results travel through the result channel and the
//!   supervisor prints them, so output lines never interleave.
//! - [`Mode::Direct`]: every worker prints for itself.
//! - [`Mode::Sequential`]: names are searched one after another on the
//!   calling thread.

#![forbid(unsafe_code)]

pub mod channel;
pub mod config;

mod builder;
mod console;
mod entry;
mod error;
mod matcher;
mod results;
mod supervisor;
mod traits;
mod walk;
mod worker;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use builder::SearchBuilder;
pub use channel::{ChannelRegistry, ResultChannel};
pub use config::{CliArgs, Mode, SearchRequest};
pub use console::Console;
pub use entry::{Entry, EntryKind, MatchResult};
pub use error::FindError;
pub use matcher::{matches, NameMatcher};
pub use results::{RunReport, ScanStats};
pub use supervisor::Supervisor;
pub use traits::{Matcher, Reporter, Source};
pub use walk::{DirSource, WalkConfig};
pub use worker::{ExitStatus, SearchWorker, Sink, WorkerId, WorkerOutcome};

// ── Entry point ───────────────────────────────────────────────────────────────

/// Create a new [`SearchBuilder`] to configure and run a search.
pub fn search() -> SearchBuilder {
    SearchBuilder::default()
}
