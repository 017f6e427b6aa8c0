//! Renders a [`CoverageResult`] into the status record the check-run and
//! notification collaborators consume. Pure string assembly, no I/O.

use serde::{Deserialize, Serialize};

use crate::coverage::{CoverageResult, FileCoverage};

/// Check-run conclusion vocabulary.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    Success,
    Failure,
    /// The policy has nothing to assert: empty change set, or every changed
    /// file is ownerless.
    Neutral,
}

impl CheckConclusion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Neutral => "neutral",
        }
    }
}

/// Rendered evaluation outcome.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CheckOutput {
    pub title: String,
    pub summary: String,
    pub conclusion: CheckConclusion,
    pub suggested_reviewers: Vec<String>,
}

/// Render a coverage result. Deterministic: identical input yields an
/// identical rendering.
pub fn format_result(coverage: &CoverageResult) -> CheckOutput {
    let total = coverage.files.len();
    let covered = coverage.covered_count();
    let ownerless = coverage.ownerless_count();

    let conclusion = if total == 0 || (ownerless == total && coverage.passing) {
        CheckConclusion::Neutral
    } else if coverage.passing {
        CheckConclusion::Success
    } else {
        CheckConclusion::Failure
    };

    let title = match conclusion {
        CheckConclusion::Neutral => "No ownership rules apply".to_string(),
        CheckConclusion::Success => "Owner approval complete".to_string(),
        CheckConclusion::Failure => "Owner approval required".to_string(),
    };

    let mut summary = format!("{covered} of {total} changed files have owner approval.\n");

    let uncovered: Vec<_> = coverage
        .files
        .iter()
        .filter_map(|f| match &f.coverage {
            FileCoverage::Uncovered {
                rule,
                required,
                approvals,
            } => Some((f.path.as_str(), rule.as_str(), *required, *approvals)),
            _ => None,
        })
        .collect();
    if !uncovered.is_empty() {
        summary.push_str("\nFiles still needing approval:\n");
        for (path, rule, required, approvals) in uncovered {
            summary.push_str(&format!(
                "- `{path}` ({rule}: {approvals}/{required} approvals)\n"
            ));
        }
    }

    let unowned: Vec<&str> = coverage
        .files
        .iter()
        .filter(|f| matches!(f.coverage, FileCoverage::Ownerless))
        .map(|f| f.path.as_str())
        .collect();
    if !unowned.is_empty() {
        summary.push_str("\nWarning: files with no owner anywhere in the tree:\n");
        for path in unowned {
            summary.push_str(&format!("- `{path}`\n"));
        }
    }

    let suggested_reviewers: Vec<String> = coverage
        .suggestions
        .iter()
        .map(|s| s.handle.clone())
        .collect();
    if !suggested_reviewers.is_empty() {
        summary.push_str("\nSuggested reviewers: ");
        summary.push_str(
            &suggested_reviewers
                .iter()
                .map(|h| format!("@{h}"))
                .collect::<Vec<_>>()
                .join(", "),
        );
        summary.push('\n');
    }

    CheckOutput {
        title,
        summary,
        conclusion,
        suggested_reviewers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::{FileReport, ReviewerSuggestion};
    use pretty_assertions::assert_eq;

    fn covered(path: &str) -> FileReport {
        FileReport {
            path: path.to_string(),
            coverage: FileCoverage::Covered {
                rule: "./OWNERS".to_string(),
                approved_by: vec!["alice".to_string()],
            },
        }
    }

    fn uncovered(path: &str) -> FileReport {
        FileReport {
            path: path.to_string(),
            coverage: FileCoverage::Uncovered {
                rule: "lib/OWNERS".to_string(),
                required: 1,
                approvals: 0,
            },
        }
    }

    fn ownerless(path: &str) -> FileReport {
        FileReport {
            path: path.to_string(),
            coverage: FileCoverage::Ownerless,
        }
    }

    #[test]
    fn passing_result_renders_success() {
        let output = format_result(&CoverageResult {
            files: vec![covered("a.rs")],
            passing: true,
            suggestions: vec![],
        });
        assert_eq!(output.conclusion, CheckConclusion::Success);
        assert_eq!(output.title, "Owner approval complete");
        assert!(output.summary.starts_with("1 of 1 changed files"));
    }

    #[test]
    fn failing_result_lists_gaps_and_suggestions() {
        let output = format_result(&CoverageResult {
            files: vec![covered("a.rs"), uncovered("lib/b.js")],
            passing: false,
            suggestions: vec![ReviewerSuggestion {
                handle: "bob".to_string(),
                covers: 1,
            }],
        });
        assert_eq!(output.conclusion, CheckConclusion::Failure);
        assert!(output.summary.contains("`lib/b.js` (lib/OWNERS: 0/1 approvals)"));
        assert!(output.summary.contains("Suggested reviewers: @bob"));
        assert_eq!(output.suggested_reviewers, vec!["bob".to_string()]);
    }

    #[test]
    fn ownerless_files_appear_as_unowned_warning() {
        let output = format_result(&CoverageResult {
            files: vec![covered("a.rs"), ownerless("assets/logo.png")],
            passing: true,
            suggestions: vec![],
        });
        assert_eq!(output.conclusion, CheckConclusion::Success);
        assert!(output.summary.contains("no owner anywhere"));
        assert!(output.summary.contains("`assets/logo.png`"));
    }

    #[test]
    fn empty_change_set_is_neutral() {
        let output = format_result(&CoverageResult {
            files: vec![],
            passing: true,
            suggestions: vec![],
        });
        assert_eq!(output.conclusion, CheckConclusion::Neutral);
    }

    #[test]
    fn all_ownerless_change_set_is_neutral() {
        let output = format_result(&CoverageResult {
            files: vec![ownerless("x"), ownerless("y")],
            passing: true,
            suggestions: vec![],
        });
        assert_eq!(output.conclusion, CheckConclusion::Neutral);
        assert_eq!(output.title, "No ownership rules apply");
    }

    #[test]
    fn rendering_is_deterministic() {
        let result = CoverageResult {
            files: vec![covered("a.rs"), uncovered("lib/b.js")],
            passing: false,
            suggestions: vec![ReviewerSuggestion {
                handle: "bob".to_string(),
                covers: 1,
            }],
        };
        assert_eq!(format_result(&result), format_result(&result));
    }
}
