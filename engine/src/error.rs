//! Error and diagnostic types for declaration parsing.
//!
//! Individual malformed declaration lines never abort a build: each one is
//! turned into a [`ParseDiagnostic`] and skipped, and the remaining lines
//! still contribute to the tree. Only the service layer, which owns the rule
//! source, can fail a refresh fatally.

use std::fmt;
use thiserror::Error;

/// Why a single declaration line was rejected.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum RuleSyntaxError {
    #[error("malformed owner token `{0}`")]
    BadOwnerToken(String),

    #[error("unknown team `{0}`: not present in the membership snapshot")]
    UnknownTeam(String),

    #[error("unknown directive `{0}`")]
    UnknownDirective(String),

    #[error("invalid required count `{0}`: expected an integer >= 1")]
    BadRequiredCount(String),

    #[error("malformed per-file rule: expected `per-file GLOB = ...`")]
    MalformedPerFile,

    #[error("per-file rule has no owners and no directive")]
    EmptyPerFile,
}

/// A non-fatal problem found while parsing declaration sources.
///
/// Diagnostics are accumulated in declaration order and surfaced alongside
/// the best-effort tree; they are values, not failures.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseDiagnostic {
    /// Directory of the declaration source, `""` for the repository root.
    pub dir: String,
    /// 1-based line number within the source.
    pub line: usize,
    pub message: String,
}

impl ParseDiagnostic {
    pub(crate) fn new(dir: &str, line: usize, error: &RuleSyntaxError) -> Self {
        Self {
            dir: dir.to_string(),
            line,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = if self.dir.is_empty() { "." } else { &self.dir };
        write!(f, "{dir}/OWNERS:{}: {}", self.line, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_display_includes_location() {
        let diag = ParseDiagnostic::new(
            "src/net",
            4,
            &RuleSyntaxError::BadOwnerToken("alice".to_string()),
        );
        assert_eq!(diag.to_string(), "src/net/OWNERS:4: malformed owner token `alice`");
    }

    #[test]
    fn root_diagnostic_uses_dot() {
        let diag = ParseDiagnostic::new("", 1, &RuleSyntaxError::MalformedPerFile);
        assert!(diag.to_string().starts_with("./OWNERS:1:"));
    }
}
