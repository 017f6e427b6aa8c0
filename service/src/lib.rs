//! `ownergate-service` — async orchestration around the ownership engine.
//!
//! Owns everything the engine must not: fetching declarations and team
//! rosters, pacing remote calls, publishing immutable tree snapshots, and
//! recording evaluation results as check-runs. Collaborators sit behind the
//! narrow traits in [`providers`]; [`github`] is the one real adapter.

pub mod config;
pub mod coordinator;
pub mod github;
pub mod pacing;
pub mod providers;

pub use coordinator::{Coordinator, EvaluateError, EvaluationOutcome, RefreshError};
