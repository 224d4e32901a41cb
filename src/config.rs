//! Configuration types for parfind
//!
//! - CLI argument parsing using clap derive macros
//! - The immutable [`SearchRequest`] a supervisor runs
//! - Execution [`Mode`] selection

use std::path::PathBuf;

use clap::builder::TypedValueParser;
use clap::{Parser, ValueEnum};

use crate::builder::SearchBuilder;
use crate::channel::DEFAULT_CAPACITY;
use crate::error::FindError;

/// How workers are scheduled and how their results reach the console.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// One thread per name; results travel through the bounded result
    /// channel and the supervisor prints them.
    #[default]
    Channel,

    /// One thread per name; every worker prints its own results.
    Direct,

    /// One name after another on the calling thread.
    Sequential,
}

/// What to search for and where. Immutable once a run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Directory the search starts from.
    pub root: PathBuf,

    /// File names to find, one worker each. Duplicates are searched twice.
    pub targets: Vec<String>,

    pub case_insensitive: bool,

    pub recursive: bool,
}

impl SearchRequest {
    /// Check the request before any worker exists.
    ///
    /// # Errors
    ///
    /// [`FindError::InvalidRoot`] if `root` is not an existing directory,
    /// [`FindError::NoTargets`] if there is nothing to look for.
    pub fn validate(&self) -> Result<(), FindError> {
        if !self.root.is_dir() {
            return Err(FindError::InvalidRoot(self.root.clone()));
        }
        if self.targets.is_empty() {
            return Err(FindError::NoTargets);
        }
        Ok(())
    }
}

/// Find files by name, one search worker per name
#[derive(Parser, Debug, Clone)]
#[command(
    name = "parfind",
    version,
    about = "Find files by name, one search worker per name",
    after_help = "EXAMPLES:\n    \
        parfind /var/log syslog\n    \
        parfind -R -i ~/src cargo.toml readme.md\n    \
        parfind -R --mode sequential /tmp x.log"
)]
pub struct CliArgs {
    /// Case-insensitive name matching
    #[arg(short = 'i', long = "ignore-case")]
    pub ignore_case: bool,

    /// Recursive mode (includes sub-folders)
    #[arg(short = 'R', long)]
    pub recursive: bool,

    /// How workers run and report
    #[arg(long, value_enum, default_value_t = Mode::Channel)]
    pub mode: Mode,

    /// Result channel capacity in messages (channel mode)
    #[arg(
        long,
        default_value_t = DEFAULT_CAPACITY,
        value_parser = clap::value_parser!(u64).range(1..).map(|n| n as usize),
        value_name = "NUM"
    )]
    pub capacity: usize,

    /// Explicit result channel name (channel mode); a unique name is used otherwise
    #[arg(long, value_name = "NAME")]
    pub channel_name: Option<String>,

    /// Verbose output (debug logging on stderr)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Directory to search
    #[arg(value_name = "SEARCHPATH")]
    pub root: PathBuf,

    /// File names to search for
    #[arg(value_name = "FILE")]
    pub names: Vec<String>,
}

impl CliArgs {
    /// Turn parsed arguments into a ready-to-run search.
    pub fn into_search(self) -> SearchBuilder {
        let mut builder = SearchBuilder::default()
            .root(self.root)
            .targets(self.names)
            .case_insensitive(self.ignore_case)
            .recursive(self.recursive)
            .mode(self.mode)
            .capacity(self.capacity);

        if let Some(name) = self.channel_name {
            builder = builder.channel_name(name);
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_flags_root_and_names() {
        let args = CliArgs::try_parse_from(["parfind", "-i", "-R", "/tmp", "a.txt", "b.txt"]).unwrap();
        assert!(args.ignore_case);
        assert!(args.recursive);
        assert_eq!(args.mode, Mode::Channel);
        assert_eq!(args.capacity, DEFAULT_CAPACITY);
        assert_eq!(args.root, PathBuf::from("/tmp"));
        assert_eq!(args.names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn names_are_optional_at_parse_time() {
        let args = CliArgs::try_parse_from(["parfind", "/tmp"]).unwrap();
        assert!(args.names.is_empty());
    }

    #[test]
    fn zero_capacity_is_a_usage_error() {
        assert!(CliArgs::try_parse_from(["parfind", "--capacity", "0", "/tmp", "x"]).is_err());
    }

    #[test]
    fn capacity_parses_into_usize() {
        let args = CliArgs::try_parse_from(["parfind", "--capacity", "3", "/tmp", "x"]).unwrap();
        assert_eq!(args.capacity, 3);
    }

    #[test]
    fn mode_is_selectable() {
        let args = CliArgs::try_parse_from(["parfind", "--mode", "sequential", "/tmp", "x"]).unwrap();
        assert_eq!(args.mode, Mode::Sequential);
    }

    #[test]
    fn validate_rejects_missing_root_before_targets() {
        let dir = tempfile::tempdir().unwrap();
        let request = SearchRequest {
            root:             dir.path().join("missing"),
            targets:          vec![],
            case_insensitive: false,
            recursive:        false,
        };
        assert!(matches!(request.validate(), Err(FindError::InvalidRoot(_))));

        let request = SearchRequest { root: dir.path().to_path_buf(), ..request };
        assert!(matches!(request.validate(), Err(FindError::NoTargets)));
    }

    #[test]
    fn a_file_is_not_a_valid_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "").unwrap();
        let request = SearchRequest {
            root:             file,
            targets:          vec!["plain.txt".into()],
            case_insensitive: false,
            recursive:        false,
        };
        assert!(matches!(request.validate(), Err(FindError::InvalidRoot(_))));
    }
}
