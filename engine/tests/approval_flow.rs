//! End-to-end engine scenarios: parse declarations, derive approvals from a
//! review stream, evaluate coverage, and render the check output.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use ownergate_engine::{
    CheckConclusion, CoveragePolicy, DeclarationSource, MembershipSnapshot, Review, ReviewState,
    ReviewerApprovalMap, build, evaluate, format_result,
};
use pretty_assertions::assert_eq;

fn review(reviewer: &str, minute: u32, state: ReviewState) -> Review {
    Review {
        reviewer: reviewer.to_string(),
        submitted_at: Utc
            .with_ymd_and_hms(2026, 3, 14, 10, minute, 0)
            .single()
            .unwrap(),
        state,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[test]
fn unapproved_change_fails_and_suggests_owners() {
    let sources = vec![
        DeclarationSource::new("", "@root-admin\n"),
        DeclarationSource::new("svc", "@maintainer\nper-file *.proto = @platform/protobuf\n"),
    ];
    let mut snapshot = MembershipSnapshot::new();
    snapshot.insert_team(
        "platform/protobuf",
        ["proto-pro".to_string()].into_iter().collect(),
    );
    let parsed = build(&sources, Arc::new(snapshot));
    assert!(parsed.diagnostics.is_empty());

    let approvals = ReviewerApprovalMap::derive(&[], &[], "author");
    let coverage = evaluate(
        &parsed.tree,
        &strings(&["svc/api.proto", "svc/main.rs"]),
        &approvals,
        &CoveragePolicy::default(),
    );
    assert!(!coverage.passing);

    let output = format_result(&coverage);
    assert_eq!(output.conclusion, CheckConclusion::Failure);
    // maintainer and root-admin each cover both files; proto-pro only the
    // proto. Ties break lexicographically.
    assert_eq!(
        output.suggested_reviewers,
        strings(&["maintainer", "root-admin", "proto-pro"])
    );
}

#[test]
fn approval_stream_drives_the_verdict() {
    let sources = vec![DeclarationSource::new("svc", "@maintainer\n")];
    let parsed = build(&sources, Arc::new(MembershipSnapshot::new()));

    let reviews = vec![
        review("maintainer", 1, ReviewState::Reject),
        review("maintainer", 9, ReviewState::Approve),
        // A later comment must not undo the approval.
        review("maintainer", 12, ReviewState::Comment),
    ];
    let approvals = ReviewerApprovalMap::derive(&reviews, &[], "author");
    let coverage = evaluate(
        &parsed.tree,
        &strings(&["svc/main.rs"]),
        &approvals,
        &CoveragePolicy::default(),
    );

    assert!(coverage.passing);
    assert_eq!(format_result(&coverage).conclusion, CheckConclusion::Success);
}

#[test]
fn pending_reviewers_are_not_suggested_again() {
    let sources = vec![DeclarationSource::new("svc", "@maintainer @backup\n")];
    let parsed = build(&sources, Arc::new(MembershipSnapshot::new()));

    let approvals =
        ReviewerApprovalMap::derive(&[], &["maintainer".to_string()], "author");
    let coverage = evaluate(
        &parsed.tree,
        &strings(&["svc/main.rs"]),
        &approvals,
        &CoveragePolicy::default(),
    );

    assert!(!coverage.passing);
    assert_eq!(
        format_result(&coverage).suggested_reviewers,
        strings(&["backup"])
    );
}

#[test]
fn diagnostics_do_not_abort_coverage() {
    let sources = vec![DeclarationSource::new(
        "svc",
        "this is not a rule\n@maintainer\n",
    )];
    let parsed = build(&sources, Arc::new(MembershipSnapshot::new()));
    assert_eq!(parsed.diagnostics.len(), 1);

    let reviews = vec![review("maintainer", 2, ReviewState::Approve)];
    let approvals = ReviewerApprovalMap::derive(&reviews, &[], "author");
    let coverage = evaluate(
        &parsed.tree,
        &strings(&["svc/main.rs"]),
        &approvals,
        &CoveragePolicy::default(),
    );
    assert!(coverage.passing);
}

#[test]
fn empty_team_roster_degrades_to_uncovered() {
    // A team that resolved to nobody leaves its rule unsatisfiable: the
    // file is uncovered and there is no one to suggest.
    let sources = vec![DeclarationSource::new("svc", "@platform/build\n")];
    let mut snapshot = MembershipSnapshot::new();
    snapshot.insert_team("platform/build", BTreeSet::new());
    let parsed = build(&sources, Arc::new(snapshot));

    let approvals = ReviewerApprovalMap::derive(&[], &[], "author");
    let coverage = evaluate(
        &parsed.tree,
        &strings(&["svc/main.rs"]),
        &approvals,
        &CoveragePolicy::default(),
    );
    assert!(!coverage.passing);
    assert!(coverage.suggestions.is_empty());
}
