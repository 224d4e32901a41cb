use std::io::{self, Write};

use crate::entry::MatchResult;
use crate::error::FindError;
use crate::traits::Reporter;

/// Prints results to stdout and diagnostics to stderr.
///
/// Each line is written while holding the stream lock, so lines from
/// different workers never interleave mid-line inside this process.
#[derive(Debug, Default, Clone, Copy)]
pub struct Console;

impl Console {
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for Console {
    fn found(&self, result: &MatchResult) -> Result<(), FindError> {
        let mut out = io::stdout().lock();
        write_found(&mut out, result).map_err(FindError::Output)
    }

    fn diagnostic(&self, message: &str) {
        let mut err = io::stderr().lock();
        // Nowhere left to report a failing stderr.
        let _ = write_diagnostic(&mut err, message);
    }
}

pub(crate) fn write_found(out: &mut impl Write, result: &MatchResult) -> io::Result<()> {
    writeln!(out, "File found: {}", result.path.display())?;
    out.flush()
}

pub(crate) fn write_diagnostic(out: &mut impl Write, message: &str) -> io::Result<()> {
    writeln!(out, "Error: {message}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn found_lines_use_the_path_as_given() {
        let mut buf = Vec::new();
        write_found(&mut buf, &MatchResult::new("/tmp/t/x.log")).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "File found: /tmp/t/x.log\n");
    }

    #[test]
    fn diagnostics_are_prefixed() {
        let mut buf = Vec::new();
        write_diagnostic(&mut buf, "permission denied: /tmp/t/locked").unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Error: permission denied: /tmp/t/locked\n"
        );
    }
}
