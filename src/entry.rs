use std::path::PathBuf;

/// A single item produced by a [`Source`](crate::traits::Source) during traversal.
///
/// The root of a walk is never yielded, so `depth` starts at 1 for the root's
/// immediate children.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Full path to the entry, rooted at the path the walk started from.
    pub path: PathBuf,

    /// The final path component. Non-UTF-8 names are converted lossily.
    pub name: String,

    /// What kind of entry this is.
    pub kind: EntryKind,

    /// How deep in the traversal this entry was found.
    pub depth: usize,
}

impl Entry {
    /// Whether this entry is a regular file. Only regular files can match.
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// The kind of a traversed entry.
///
/// Symlinks are reported as themselves, never resolved: a link named like a
/// target is not a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file.
    File,

    /// A directory.
    Dir,

    /// A symbolic link.
    Symlink,

    /// Anything else (device files, pipes, sockets, etc.).
    Other,
}

impl From<std::fs::FileType> for EntryKind {
    fn from(ft: std::fs::FileType) -> Self {
        if ft.is_dir() {
            EntryKind::Dir
        } else if ft.is_file() {
            EntryKind::File
        } else if ft.is_symlink() {
            EntryKind::Symlink
        } else {
            EntryKind::Other
        }
    }
}

/// A found file, in flight from a worker to whoever prints it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub path: PathBuf,
}

impl MatchResult {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}
