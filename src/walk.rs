use std::path::PathBuf;

use ignore::{DirEntry, Walk, WalkBuilder};

use crate::entry::{Entry, EntryKind};
use crate::error::FindError;
use crate::traits::Source;

// ---------------------------------------------------------------------------
// WalkConfig
// ---------------------------------------------------------------------------

/// Traversal parameters handed to a [`Source`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkConfig {
    /// Descend into sub-directories. When `false` only the root's immediate
    /// children are visited.
    pub recursive: bool,
}

// ---------------------------------------------------------------------------
// DirSource
// ---------------------------------------------------------------------------

/// A filesystem tree rooted at one directory.
///
/// Walks depth-first with every ignore-style filter disabled: hidden files,
/// `.gitignore` rules and the like are all visited. Entries inside a directory
/// come out sorted by file name. Symlinks are not followed.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn builder(&self, config: &WalkConfig) -> WalkBuilder {
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .standard_filters(false)
            .ignore(false)
            .parents(false)
            .hidden(false)
            .follow_links(false)
            .same_file_system(false)
            .sort_by_file_name(|a, b| a.cmp(b));

        // Depth 1 stops descent outright instead of filtering deeper entries.
        if !config.recursive {
            builder.max_depth(Some(1));
        }
        builder
    }
}

impl Source for DirSource {
    fn walk(&self, config: &WalkConfig) -> Box<dyn Iterator<Item = Result<Entry, FindError>> + '_> {
        Box::new(DirWalk {
            inner: self.builder(config).build(),
        })
    }
}

/// Lazy adapter from `ignore`'s sequential walker to [`Entry`] items.
struct DirWalk {
    inner: Walk,
}

impl Iterator for DirWalk {
    type Item = Result<Entry, FindError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(e)  => e,
                Err(e) => return Some(Err(map_ignore_error(e))),
            };

            // Skip the root itself
            if entry.depth() == 0 {
                continue;
            }

            return Some(Ok(convert(entry)));
        }
    }
}

fn convert(entry: DirEntry) -> Entry {
    let kind = match entry.file_type() {
        Some(ft) => EntryKind::from(ft),
        None     => EntryKind::Other,
    };

    Entry {
        name:  entry.file_name().to_string_lossy().into_owned(),
        depth: entry.depth(),
        path:  entry.into_path(),
        kind,
    }
}

// ---------------------------------------------------------------------------
// Map ignore::Error to FindError
// ---------------------------------------------------------------------------

fn map_ignore_error(e: ignore::Error) -> FindError {
    map_with_path(e, None)
}

fn map_with_path(e: ignore::Error, path: Option<PathBuf>) -> FindError {
    match e {
        ignore::Error::WithDepth { err, .. } => map_with_path(*err, path),
        ignore::Error::WithPath { path, err } => map_with_path(*err, Some(path)),
        ignore::Error::Loop { child, .. } => FindError::SymlinkLoop(child),
        ignore::Error::Io(io_err) => {
            let path = path.unwrap_or_default();
            if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                FindError::PermissionDenied(path)
            } else {
                FindError::Io { path, source: io_err }
            }
        }
        other => FindError::Source(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("b.txt"), "").unwrap();
        fs::write(root.join("a.txt"), "").unwrap();
        fs::create_dir_all(root.join("sub/deeper")).unwrap();
        fs::write(root.join("sub/c.txt"), "").unwrap();
        fs::write(root.join("sub/deeper/d.txt"), "").unwrap();
        fs::write(root.join(".hidden"), "").unwrap();
        dir
    }

    fn names(source: &DirSource, recursive: bool) -> Vec<String> {
        source
            .walk(&WalkConfig { recursive })
            .map(|e| e.unwrap().name)
            .collect()
    }

    #[test]
    fn flat_walk_yields_immediate_children_only() {
        let dir = tree();
        let source = DirSource::new(dir.path());
        assert_eq!(names(&source, false), vec![".hidden", "a.txt", "b.txt", "sub"]);
    }

    #[test]
    fn recursive_walk_is_depth_first() {
        let dir = tree();
        let source = DirSource::new(dir.path());
        assert_eq!(
            names(&source, true),
            vec![".hidden", "a.txt", "b.txt", "sub", "c.txt", "deeper", "d.txt"]
        );
    }

    #[test]
    fn entries_carry_kind_depth_and_full_path() {
        let dir = tree();
        let source = DirSource::new(dir.path());
        let entries: Vec<Entry> = source
            .walk(&WalkConfig { recursive: true })
            .map(Result::unwrap)
            .collect();

        let sub = entries.iter().find(|e| e.name == "sub").unwrap();
        assert_eq!(sub.kind, EntryKind::Dir);
        assert_eq!(sub.depth, 1);

        let d = entries.iter().find(|e| e.name == "d.txt").unwrap();
        assert_eq!(d.kind, EntryKind::File);
        assert_eq!(d.depth, 3);
        assert_eq!(d.path, dir.path().join("sub/deeper/d.txt"));
    }

    #[test]
    fn missing_root_yields_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirSource::new(dir.path().join("nope"));
        let items: Vec<_> = source.walk(&WalkConfig::default()).collect();
        assert_eq!(items.len(), 1);
        let err = items.into_iter().next().unwrap().unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(err.path(), Some(&dir.path().join("nope")));
    }

    #[test]
    fn wrapped_io_errors_keep_their_path() {
        let err = ignore::Error::WithDepth {
            depth: 2,
            err:   Box::new(ignore::Error::WithPath {
                path: PathBuf::from("/locked"),
                err:  Box::new(ignore::Error::Io(std::io::Error::from(
                    std::io::ErrorKind::PermissionDenied,
                ))),
            }),
        };
        match map_ignore_error(err) {
            FindError::PermissionDenied(p) => assert_eq!(p, PathBuf::from("/locked")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
