//! Narrow contracts with the surrounding collaborators.
//!
//! The engine is a pure computation over structures handed to it; these
//! traits are the only places the service touches the outside world. Every
//! implementation detail behind them (HTTP, pagination, auth) stays in the
//! adapter.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ownergate_engine::{CheckOutput, CoverageResult, DeclarationSource, Review};

/// Failure reported by any collaborator.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("remote api error: {0}")]
    Api(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Everything the evaluator needs to know about one pull request, captured
/// in a single fetch so the whole evaluation sees a consistent view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrSnapshot {
    pub number: u64,
    pub author: String,
    pub head_sha: String,
    pub is_open: bool,
    pub changed_files: Vec<String>,
    pub reviews: Vec<Review>,
    pub requested_reviewers: Vec<String>,
}

/// Supplies raw per-directory ownership declarations.
#[async_trait]
pub trait RuleSource: Send + Sync {
    async fn list_raw_declarations(&self) -> Result<Vec<DeclarationSource>, ProviderError>;
}

/// Resolves a team handle to its member account handles. Calls are paced by
/// the caller, never by the implementation.
#[async_trait]
pub trait MembershipResolver: Send + Sync {
    async fn members_of(&self, team: &str) -> Result<BTreeSet<String>, ProviderError>;
}

/// Fetches the pull-request snapshot for one evaluation.
#[async_trait]
pub trait PrSnapshotProvider: Send + Sync {
    async fn fetch(&self, number: u64) -> Result<PrSnapshot, ProviderError>;
}

/// Creates and updates the remote check-run record for a revision.
#[async_trait]
pub trait CheckRunSink: Send + Sync {
    async fn existing_check_run(&self, head_sha: &str) -> Result<Option<u64>, ProviderError>;
    async fn create(&self, head_sha: &str, output: &CheckOutput) -> Result<u64, ProviderError>;
    async fn update(&self, id: u64, output: &CheckOutput) -> Result<(), ProviderError>;
}

/// Posts the human-facing notification for an evaluation. Best effort: the
/// coordinator logs and continues when this fails.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(
        &self,
        snapshot: &PrSnapshot,
        coverage: &CoverageResult,
        output: &CheckOutput,
    ) -> Result<(), ProviderError>;
}
