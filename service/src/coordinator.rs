//! Orchestrates refresh and evaluation cycles around the engine.
//!
//! A refresh rebuilds the ownership tree wholesale: list declarations,
//! resolve every referenced team (paced), build, then publish the new tree
//! atomically. A failed or cancelled refresh publishes nothing — the
//! previously published tree stays authoritative. Refreshes are serialized;
//! evaluations share the published tree read-only and may run concurrently.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use ownergate_engine::{
    CheckOutput, CoveragePolicy, CoverageResult, MembershipSnapshot, OwnersTree, ParseDiagnostic,
    ReviewerApprovalMap, build, evaluate, format_result, referenced_teams,
};

use crate::pacing::Pacer;
use crate::providers::{
    CheckRunSink, MembershipResolver, NotificationSink, PrSnapshotProvider, ProviderError,
    RuleSource,
};

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("rule source unavailable: {0}")]
    RuleSourceUnavailable(#[source] ProviderError),

    #[error("refresh cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum EvaluateError {
    #[error("no ownership tree published yet")]
    NoTree,

    #[error("pull request snapshot fetch failed: {0}")]
    Snapshot(#[source] ProviderError),

    #[error("check-run write failed: {0}")]
    CheckRun(#[source] ProviderError),
}

/// One published ownership snapshot: the tree plus the parse diagnostics
/// that should accompany every check rendered against it.
#[derive(Clone, Debug)]
pub struct PublishedRules {
    pub tree: OwnersTree,
    pub diagnostics: Vec<ParseDiagnostic>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub rules: usize,
    pub teams_resolved: usize,
    pub teams_failed: usize,
    pub diagnostics: usize,
}

/// Result of one evaluation cycle.
#[derive(Clone, Debug)]
pub enum EvaluationOutcome {
    Completed {
        check_run_id: u64,
        coverage: CoverageResult,
        output: CheckOutput,
    },
    /// Closed or merged pull request: evaluation is skipped entirely.
    SkippedClosed { number: u64 },
}

pub struct Coordinator {
    rule_source: Arc<dyn RuleSource>,
    membership: Arc<dyn MembershipResolver>,
    snapshots: Arc<dyn PrSnapshotProvider>,
    checks: Arc<dyn CheckRunSink>,
    notifier: Arc<dyn NotificationSink>,
    pacer: Arc<dyn Pacer>,
    policy: CoveragePolicy,
    published: RwLock<Option<Arc<PublishedRules>>>,
    /// At most one refresh in flight at a time.
    refresh_gate: Mutex<()>,
}

impl Coordinator {
    pub fn new(
        rule_source: Arc<dyn RuleSource>,
        membership: Arc<dyn MembershipResolver>,
        snapshots: Arc<dyn PrSnapshotProvider>,
        checks: Arc<dyn CheckRunSink>,
        notifier: Arc<dyn NotificationSink>,
        pacer: Arc<dyn Pacer>,
        policy: CoveragePolicy,
    ) -> Self {
        Self {
            rule_source,
            membership,
            snapshots,
            checks,
            notifier,
            pacer,
            policy,
            published: RwLock::new(None),
            refresh_gate: Mutex::new(()),
        }
    }

    /// The currently published rules, if any refresh has succeeded.
    pub async fn current(&self) -> Option<Arc<PublishedRules>> {
        self.published.read().await.clone()
    }

    /// Rebuild and publish the ownership tree.
    ///
    /// Team-membership requests are spaced by the pacer's fixed gap; a
    /// team that fails to resolve is logged and omitted (coverage for rules
    /// referencing it degrades, nothing aborts). Cancellation at any paced
    /// step aborts the whole refresh without publishing.
    pub async fn refresh(&self, cancel: &CancellationToken) -> Result<RefreshStats, RefreshError> {
        let _gate = self.refresh_gate.lock().await;

        let sources = self
            .rule_source
            .list_raw_declarations()
            .await
            .map_err(RefreshError::RuleSourceUnavailable)?;
        tracing::info!(sources = sources.len(), "fetched ownership declarations");

        let teams = referenced_teams(&sources);
        let mut snapshot = MembershipSnapshot::new();
        let mut teams_failed = 0usize;
        let mut first = true;
        for team in &teams {
            if cancel.is_cancelled() {
                return Err(RefreshError::Cancelled);
            }
            if !first {
                self.pacer.team_sync_gap().await;
            }
            first = false;
            match self.membership.members_of(team).await {
                Ok(members) => {
                    tracing::debug!(team = %team, members = members.len(), "team resolved");
                    snapshot.insert_team(team, members);
                }
                Err(error) => {
                    tracing::warn!(team = %team, %error, "team resolution failed; omitting");
                    teams_failed += 1;
                }
            }
        }

        if cancel.is_cancelled() {
            return Err(RefreshError::Cancelled);
        }

        let teams_resolved = snapshot.team_count();
        let parsed = build(&sources, Arc::new(snapshot));
        for diagnostic in &parsed.diagnostics {
            tracing::warn!("declaration skipped: {diagnostic}");
        }

        let stats = RefreshStats {
            rules: parsed.tree.rule_count(),
            teams_resolved,
            teams_failed,
            diagnostics: parsed.diagnostics.len(),
        };

        let published = Arc::new(PublishedRules {
            tree: parsed.tree,
            diagnostics: parsed.diagnostics,
        });
        *self.published.write().await = Some(published);
        tracing::info!(
            rules = stats.rules,
            teams = stats.teams_resolved,
            diagnostics = stats.diagnostics,
            "published ownership tree"
        );
        Ok(stats)
    }

    /// Evaluate one pull request against the published tree and record the
    /// result as a check-run.
    pub async fn evaluate_pr(&self, number: u64) -> Result<EvaluationOutcome, EvaluateError> {
        let published = self.current().await.ok_or(EvaluateError::NoTree)?;

        let snapshot = self
            .snapshots
            .fetch(number)
            .await
            .map_err(EvaluateError::Snapshot)?;

        if !snapshot.is_open {
            tracing::info!(number, "pull request is closed; skipping evaluation");
            return Ok(EvaluationOutcome::SkippedClosed { number });
        }

        let approvals = ReviewerApprovalMap::derive(
            &snapshot.reviews,
            &snapshot.requested_reviewers,
            &snapshot.author,
        );
        let coverage = evaluate(
            &published.tree,
            &snapshot.changed_files,
            &approvals,
            &self.policy,
        );

        let mut output = format_result(&coverage);
        if !published.diagnostics.is_empty() {
            output.summary.push_str("\nRule diagnostics:\n");
            for diagnostic in &published.diagnostics {
                output.summary.push_str(&format!("- {diagnostic}\n"));
            }
        }

        let check_run_id = match self
            .checks
            .existing_check_run(&snapshot.head_sha)
            .await
            .map_err(EvaluateError::CheckRun)?
        {
            Some(id) => {
                self.checks
                    .update(id, &output)
                    .await
                    .map_err(EvaluateError::CheckRun)?;
                id
            }
            None => {
                // Freshly pushed revisions take a moment to become visible
                // to the checks API.
                self.pacer.check_run_settle().await;
                self.checks
                    .create(&snapshot.head_sha, &output)
                    .await
                    .map_err(EvaluateError::CheckRun)?
            }
        };

        if let Err(error) = self.notifier.notify(&snapshot, &coverage, &output).await {
            tracing::warn!(number, %error, "notification failed");
        }

        tracing::info!(
            number,
            check_run_id,
            conclusion = output.conclusion.as_str(),
            passing = coverage.passing,
            "evaluation complete"
        );
        Ok(EvaluationOutcome::Completed {
            check_run_id,
            coverage,
            output,
        })
    }
}
