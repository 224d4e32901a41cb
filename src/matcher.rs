use crate::entry::Entry;
use crate::traits::Matcher;

/// Decide whether `candidate` names the file we are looking for.
///
/// Case folding is ASCII-only and byte-wise, so the result never depends on
/// the process locale. There is no substring or wildcard matching.
pub fn matches(candidate: &str, target: &str, case_insensitive: bool) -> bool {
    if case_insensitive {
        candidate.as_bytes().eq_ignore_ascii_case(target.as_bytes())
    } else {
        candidate.as_bytes() == target.as_bytes()
    }
}

/// Matches regular files whose name equals one target name.
#[derive(Debug, Clone)]
pub struct NameMatcher {
    target:           String,
    case_insensitive: bool,
}

impl NameMatcher {
    pub fn new(target: impl Into<String>, case_insensitive: bool) -> Self {
        Self {
            target: target.into(),
            case_insensitive,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Matcher for NameMatcher {
    fn is_match(&self, entry: &Entry) -> bool {
        entry.is_file() && matches(&entry.name, &self.target, self.case_insensitive)
    }
}
