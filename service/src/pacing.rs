//! Fixed-delay pacing for remote calls.
//!
//! The remote API tolerates this service only if it spaces its requests:
//! team-membership fetches get a fixed gap between successive calls, and
//! check-run creation waits a fixed settling delay for the remote system to
//! become consistent. These are deliberate fixed waits, not adaptive
//! backoff, and they are injected so tests never sleep for real.

use std::time::Duration;

use async_trait::async_trait;

#[async_trait]
pub trait Pacer: Send + Sync {
    /// Wait between two successive team-membership requests.
    async fn team_sync_gap(&self);

    /// Wait before creating a check-run for a freshly pushed revision.
    async fn check_run_settle(&self);
}

/// Production pacer backed by `tokio::time::sleep`.
#[derive(Clone, Debug)]
pub struct TokioPacer {
    team_sync_gap: Duration,
    check_run_settle: Duration,
}

impl TokioPacer {
    pub fn new(team_sync_gap: Duration, check_run_settle: Duration) -> Self {
        Self {
            team_sync_gap,
            check_run_settle,
        }
    }
}

#[async_trait]
impl Pacer for TokioPacer {
    async fn team_sync_gap(&self) {
        tokio::time::sleep(self.team_sync_gap).await;
    }

    async fn check_run_settle(&self) {
        tokio::time::sleep(self.check_run_settle).await;
    }
}
