//! `ownergate-engine` — ownership resolution & approval engine.
//!
//! The pure core of the ownership check: a hierarchical ownership tree built
//! from per-directory declarations, and the algorithm that decides, for a
//! change set and a reviewer approval map, which files have sufficient owner
//! approval, which do not, and who could close the gaps.
//!
//! Everything here is synchronous and side-effect free. The service crate
//! owns I/O: it fetches declarations and team rosters, builds a
//! [`MembershipSnapshot`], calls [`build`], and shares the resulting
//! [`OwnersTree`] read-only for one evaluation cycle.

pub mod approval;
pub mod coverage;
pub mod error;
pub mod identity;
pub mod membership;
pub mod parser;
pub mod report;
pub mod rules;
pub mod tree;

pub use approval::{Review, ReviewState, ReviewerApprovalMap};
pub use coverage::{
    CoveragePolicy, CoverageResult, FileCoverage, FileReport, ReviewerSuggestion, evaluate,
};
pub use error::{ParseDiagnostic, RuleSyntaxError};
pub use identity::OwnerIdentity;
pub use membership::MembershipSnapshot;
pub use parser::{DeclarationSource, ParseResult, build, referenced_teams};
pub use report::{CheckConclusion, CheckOutput, format_result};
pub use rules::{OwnerRule, ScopeGlob};
pub use tree::OwnersTree;
