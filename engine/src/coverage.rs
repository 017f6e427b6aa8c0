//! The approval engine: given a published tree, the changed files, and the
//! reviewer approval map, compute per-file coverage, the overall verdict,
//! and a ranked set of reviewers who could close the gaps.
//!
//! Pure: a fixed (tree, changed files, approvals, policy) quadruple always
//! produces the identical result. Team identities expand through the
//! membership snapshot the tree captured at build time, so every file in a
//! run sees one consistent view.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::approval::ReviewerApprovalMap;
use crate::identity::OwnerIdentity;
use crate::membership::MembershipSnapshot;
use crate::rules::OwnerRule;
use crate::tree::OwnersTree;

/// Evaluation knobs. Ownerless files warn rather than block by default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CoveragePolicy {
    pub ownerless_blocks: bool,
}

/// Coverage state of one changed file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FileCoverage {
    /// A rule in the chain is satisfied.
    Covered {
        /// Location of the satisfied rule.
        rule: String,
        /// Distinct approving owners that satisfied it.
        approved_by: Vec<String>,
    },
    /// No fallback-eligible rule in the chain is satisfied.
    Uncovered {
        /// Location of the most specific governing rule.
        rule: String,
        required: u32,
        approvals: u32,
    },
    /// No rule anywhere in the ancestor chain.
    Ownerless,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: String,
    pub coverage: FileCoverage,
}

/// One suggested reviewer and how many currently-uncovered files their
/// approval would cover.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReviewerSuggestion {
    pub handle: String,
    pub covers: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CoverageResult {
    pub files: Vec<FileReport>,
    pub passing: bool,
    /// Ranked by `covers` descending, ties broken by handle ordering.
    pub suggestions: Vec<ReviewerSuggestion>,
}

impl CoverageResult {
    pub fn covered_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.coverage, FileCoverage::Covered { .. }))
            .count()
    }

    pub fn uncovered_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.coverage, FileCoverage::Uncovered { .. }))
            .count()
    }

    pub fn ownerless_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.coverage, FileCoverage::Ownerless))
            .count()
    }
}

/// Evaluate ownership coverage for a change set.
pub fn evaluate(
    tree: &OwnersTree,
    changed_files: &[String],
    approvals: &ReviewerApprovalMap,
    policy: &CoveragePolicy,
) -> CoverageResult {
    let membership = tree.membership();
    let mut files = Vec::with_capacity(changed_files.len());
    let mut uncovered_candidates: Vec<BTreeSet<String>> = Vec::new();

    for path in changed_files {
        let chain = tree.rules_for(path);
        let coverage = if chain.is_empty() {
            FileCoverage::Ownerless
        } else {
            cover_file(&chain, membership, approvals)
        };
        if matches!(coverage, FileCoverage::Uncovered { .. }) {
            uncovered_candidates.push(candidates_for(&chain, membership, approvals));
        }
        files.push(FileReport {
            path: path.clone(),
            coverage,
        });
    }

    let passing = files.iter().all(|f| match f.coverage {
        FileCoverage::Covered { .. } => true,
        FileCoverage::Ownerless => !policy.ownerless_blocks,
        FileCoverage::Uncovered { .. } => false,
    });

    CoverageResult {
        files,
        passing,
        suggestions: rank_suggestions(&uncovered_candidates),
    }
}

/// Walk the chain from most specific to least, stopping at the first
/// satisfied rule, or at an unsatisfied rule that forbids fallback.
fn cover_file(
    chain: &[&OwnerRule],
    membership: &MembershipSnapshot,
    approvals: &ReviewerApprovalMap,
) -> FileCoverage {
    for rule in chain.iter().rev() {
        let eligible = expand_owners(rule, membership);
        let approved_by: Vec<String> = eligible
            .into_iter()
            .filter(|h| approvals.is_approved(h))
            .collect();
        if approved_by.len() as u32 >= rule.required_count {
            return FileCoverage::Covered {
                rule: rule.display_location(),
                approved_by,
            };
        }
        if !rule.allow_fallback {
            break;
        }
    }

    // Report the gap against the most specific governing rule. The chain is
    // non-empty by the caller's check.
    let most_specific = chain[chain.len() - 1];
    let approvals_count = expand_owners(most_specific, membership)
        .into_iter()
        .filter(|h| approvals.is_approved(h))
        .count() as u32;
    FileCoverage::Uncovered {
        rule: most_specific.display_location(),
        required: most_specific.required_count,
        approvals: approvals_count,
    }
}

/// Eligible suggestion candidates for one uncovered file: the union of
/// owner handles over its fallback-eligible chain, minus reviewers already
/// approved and reviewers with a pending request.
fn candidates_for(
    chain: &[&OwnerRule],
    membership: &MembershipSnapshot,
    approvals: &ReviewerApprovalMap,
) -> BTreeSet<String> {
    let mut candidates = BTreeSet::new();
    for rule in chain.iter().rev() {
        for handle in expand_owners(rule, membership) {
            if !approvals.is_approved(&handle) && !approvals.is_requested(&handle) {
                candidates.insert(handle);
            }
        }
        if !rule.allow_fallback {
            break;
        }
    }
    candidates
}

/// Greedy ranking: candidates ordered by the number of distinct uncovered
/// files they would cover, descending, ties broken by handle ordering.
/// Deterministic, not guaranteed minimal.
fn rank_suggestions(uncovered_candidates: &[BTreeSet<String>]) -> Vec<ReviewerSuggestion> {
    let mut covers: BTreeMap<&str, u32> = BTreeMap::new();
    for candidates in uncovered_candidates {
        for handle in candidates {
            *covers.entry(handle).or_insert(0) += 1;
        }
    }
    let mut ranked: Vec<ReviewerSuggestion> = covers
        .into_iter()
        .map(|(handle, covers)| ReviewerSuggestion {
            handle: handle.to_string(),
            covers,
        })
        .collect();
    ranked.sort_by(|a, b| b.covers.cmp(&a.covers).then_with(|| a.handle.cmp(&b.handle)));
    ranked
}

/// Expand a rule's owners to distinct account handles, declaration order
/// first, team rosters in sorted order. A team missing from the snapshot
/// contributes nothing.
fn expand_owners(rule: &OwnerRule, membership: &MembershipSnapshot) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut handles = Vec::new();
    for owner in &rule.owners {
        match owner {
            OwnerIdentity::User(handle) => {
                if seen.insert(handle.clone()) {
                    handles.push(handle.clone());
                }
            }
            OwnerIdentity::Team(team) => match membership.members_of(team) {
                Some(members) => {
                    for member in members {
                        if seen.insert(member.clone()) {
                            handles.push(member.clone());
                        }
                    }
                }
                None => {
                    tracing::warn!(team = %team, "team missing from membership snapshot");
                }
            },
        }
    }
    handles
}
