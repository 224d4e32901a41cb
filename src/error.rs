use std::path::PathBuf;
use thiserror::Error;

use crate::worker::WorkerId;

#[derive(Error, Debug)]
pub enum FindError {
    // Validation
    #[error("{} is not a valid path to a directory", .0.display())]
    InvalidRoot(PathBuf),

    #[error("no file names provided")]
    NoTargets,

    // Traversal
    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("symlink loop: {}", .0.display())]
    SymlinkLoop(PathBuf),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("traversal error: {0}")]
    Source(String),

    // Coordination
    #[error("could not start worker for '{target}': {source}")]
    Spawn {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not create result channel {name}: {reason}")]
    ChannelCreate { name: String, reason: String },

    #[error("result channel {name} is closed")]
    ChannelSend { name: String },

    #[error("could not receive from result channel {name}: {reason}")]
    ChannelReceive { name: String, reason: String },

    #[error("{id} searching for '{target}' failed: {reason}")]
    WorkerFailed {
        id:     WorkerId,
        target: String,
        reason: String,
    },

    // Console
    #[error("could not write output: {0}")]
    Output(#[source] std::io::Error),
}

impl FindError {
    /// The path this error occurred at, if applicable.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::InvalidRoot(p)
            | Self::PermissionDenied(p)
            | Self::SymlinkLoop(p)
            | Self::Io { path: p, .. } => Some(p),
            _ => None,
        }
    }

    /// Whether a worker can keep walking after this error.
    ///
    /// Recoverable errors are reported as diagnostics and counted; everything
    /// else fails the worker or the whole run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied(_) | Self::SymlinkLoop(_) | Self::Io { .. } | Self::Source(_)
        )
    }
}
