use crate::entry::{Entry, MatchResult};
use crate::error::FindError;
use crate::walk::WalkConfig;

/// A source of entries for one worker to search through.
///
/// Every worker starts its own walk, so `walk()` is called once per target
/// name and the returned iterator is consumed exactly once.
///
/// # Object Safety
///
/// `Source` is object-safe; `walk()` returns a boxed iterator rather than
/// `impl Iterator`.
///
/// # Error Handling
///
/// Recoverable errors (permission denied, unreadable directories) should be
/// yielded as `Err(FindError)` and the walk should carry on with the
/// remaining entries. The worker reports them as diagnostics.
///
/// # Example
///
/// ```rust
/// use parfind::{Entry, EntryKind, FindError, Source, WalkConfig};
///
/// struct VecSource(Vec<String>);
///
/// impl Source for VecSource {
///     fn walk(&self, _config: &WalkConfig) -> Box<dyn Iterator<Item = Result<Entry, FindError>> + '_> {
///         Box::new(self.0.iter().map(|name| Ok(Entry {
///             path:  name.into(),
///             name:  name.clone(),
///             kind:  EntryKind::File,
///             depth: 1,
///         })))
///     }
/// }
/// ```
pub trait Source: Send + Sync {
    /// Traverse the source and yield entries, depth-first.
    fn walk(&self, config: &WalkConfig) -> Box<dyn Iterator<Item = Result<Entry, FindError>> + '_>;
}

/// Determines whether an entry is a match.
///
/// # Example
///
/// ```rust
/// use parfind::{Entry, Matcher};
///
/// struct ExtensionMatcher(String);
///
/// impl Matcher for ExtensionMatcher {
///     fn is_match(&self, entry: &Entry) -> bool {
///         entry.path
///             .extension()
///             .map(|e| e.eq_ignore_ascii_case(&self.0))
///             .unwrap_or(false)
///     }
/// }
/// ```
pub trait Matcher: Send + Sync {
    /// Returns `true` if this entry should be reported.
    fn is_match(&self, entry: &Entry) -> bool;
}

/// Where found files and diagnostics end up.
///
/// In channel mode only the supervisor calls the reporter; in direct mode
/// every worker calls it concurrently, so implementations must emit each
/// line as one unit.
pub trait Reporter: Send + Sync {
    /// A file was found.
    fn found(&self, result: &MatchResult) -> Result<(), FindError>;

    /// A non-fatal problem worth telling the user about.
    fn diagnostic(&self, message: &str);
}
