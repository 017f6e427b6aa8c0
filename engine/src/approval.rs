//! Reviewer approval statuses derived from a pull request's review stream.
//!
//! The derivation policy is deliberately explicit because it is not obvious
//! from the raw review list:
//!
//! - reviews are ordered by submission time ascending and the latest review
//!   determines a reviewer's status, except that a comment-only review never
//!   overwrites a prior approve/reject;
//! - reviewers with a pending review request are recorded as not approved;
//! - the author is always recorded as approved, overriding any explicit
//!   self-review. This is a policy decision, not an accident: authors
//!   implicitly approve their own changes for ownership purposes.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The disposition of one submitted review.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    Approve,
    Reject,
    Comment,
}

/// One submitted review, as supplied by the PR snapshot provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub reviewer: String,
    pub submitted_at: DateTime<Utc>,
    pub state: ReviewState,
}

/// Approval status per reviewer, plus the pending-request set used to keep
/// already-requested reviewers out of the suggestion ranking.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReviewerApprovalMap {
    statuses: BTreeMap<String, bool>,
    requested: BTreeSet<String>,
    author: String,
}

impl ReviewerApprovalMap {
    /// Derive the map from a review stream, the pending review requests,
    /// and the PR author.
    pub fn derive(reviews: &[Review], requested: &[String], author: &str) -> Self {
        let mut sorted: Vec<&Review> = reviews.iter().collect();
        // Stable: reviews sharing a timestamp keep their input order.
        sorted.sort_by_key(|r| r.submitted_at);

        let mut statuses = BTreeMap::new();
        for review in sorted {
            match review.state {
                ReviewState::Approve => {
                    statuses.insert(review.reviewer.clone(), true);
                }
                ReviewState::Reject => {
                    statuses.insert(review.reviewer.clone(), false);
                }
                // Comment-only: recorded only when the reviewer has no
                // prior status.
                ReviewState::Comment => {
                    statuses.entry(review.reviewer.clone()).or_insert(false);
                }
            }
        }

        let mut pending = BTreeSet::new();
        for handle in requested {
            statuses.entry(handle.clone()).or_insert(false);
            pending.insert(handle.clone());
        }

        // Author override is unconditional.
        statuses.insert(author.to_string(), true);

        Self {
            statuses,
            requested: pending,
            author: author.to_string(),
        }
    }

    /// Assemble a map directly. The author override is applied here too, so
    /// the invariant holds however the map was produced.
    pub fn from_parts(
        mut statuses: BTreeMap<String, bool>,
        requested: BTreeSet<String>,
        author: &str,
    ) -> Self {
        statuses.insert(author.to_string(), true);
        Self {
            statuses,
            requested,
            author: author.to_string(),
        }
    }

    pub fn is_approved(&self, handle: &str) -> bool {
        self.statuses.get(handle).copied().unwrap_or(false)
    }

    /// Whether a review is already requested from this reviewer.
    pub fn is_requested(&self, handle: &str) -> bool {
        self.requested.contains(handle)
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// A copy of this map with one more approval, preserving the requested
    /// set. Used by callers answering "what if this reviewer approved?".
    pub fn with_approval(&self, handle: &str) -> Self {
        let mut next = self.clone();
        next.statuses.insert(handle.to_string(), true);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, minute, 0).single().unwrap()
    }

    fn review(reviewer: &str, minute: u32, state: ReviewState) -> Review {
        Review {
            reviewer: reviewer.to_string(),
            submitted_at: at(minute),
            state,
        }
    }

    #[test]
    fn latest_review_wins() {
        let reviews = vec![
            review("dave", 1, ReviewState::Reject),
            review("dave", 5, ReviewState::Approve),
        ];
        let map = ReviewerApprovalMap::derive(&reviews, &[], "author");
        assert!(map.is_approved("dave"));
    }

    #[test]
    fn out_of_order_input_is_sorted_by_submission_time() {
        let reviews = vec![
            review("dave", 5, ReviewState::Reject),
            review("dave", 1, ReviewState::Approve),
        ];
        let map = ReviewerApprovalMap::derive(&reviews, &[], "author");
        assert!(!map.is_approved("dave"));
    }

    #[test]
    fn comment_does_not_override_prior_approval() {
        let reviews = vec![
            review("dave", 1, ReviewState::Approve),
            review("dave", 7, ReviewState::Comment),
        ];
        let map = ReviewerApprovalMap::derive(&reviews, &[], "author");
        assert!(map.is_approved("dave"));
    }

    #[test]
    fn comment_does_not_override_prior_rejection() {
        let reviews = vec![
            review("erin", 1, ReviewState::Reject),
            review("erin", 7, ReviewState::Comment),
        ];
        let map = ReviewerApprovalMap::derive(&reviews, &[], "author");
        assert!(!map.is_approved("erin"));
    }

    #[test]
    fn comment_only_reviewer_is_recorded_unapproved() {
        let reviews = vec![review("frank", 3, ReviewState::Comment)];
        let map = ReviewerApprovalMap::derive(&reviews, &[], "author");
        assert_eq!(map.len(), 2); // frank + author
        assert!(!map.is_approved("frank"));
    }

    #[test]
    fn pending_reviewers_are_recorded_unapproved_and_requested() {
        let map = ReviewerApprovalMap::derive(&[], &["grace".to_string()], "author");
        assert!(!map.is_approved("grace"));
        assert!(map.is_requested("grace"));
        assert!(!map.is_requested("author"));
    }

    #[test]
    fn author_override_beats_explicit_self_rejection() {
        let reviews = vec![review("carol", 2, ReviewState::Reject)];
        let map = ReviewerApprovalMap::derive(&reviews, &[], "carol");
        assert!(map.is_approved("carol"));
        assert_eq!(map.author(), "carol");
    }

    #[test]
    fn unknown_reviewer_is_not_approved() {
        let map = ReviewerApprovalMap::derive(&[], &[], "author");
        assert!(!map.is_approved("stranger"));
    }

    #[test]
    fn with_approval_is_additive() {
        let map = ReviewerApprovalMap::derive(&[], &["grace".to_string()], "author");
        let more = map.with_approval("grace");
        assert!(!map.is_approved("grace"));
        assert!(more.is_approved("grace"));
        assert!(more.is_requested("grace"));
    }
}
