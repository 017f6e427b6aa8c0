//! Owner identities: individual accounts and named teams.
//!
//! Declarations reference owners as `@handle` (an individual account) or
//! `@org/slug` (a team). Teams expand to member handles through the
//! membership snapshot captured at tree-build time; individuals stand for
//! themselves.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An eligible approver named by an ownership rule.
///
/// `Ord` follows the handle string so that owner lists and candidate sets
/// order deterministically.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "handle", rename_all = "snake_case")]
pub enum OwnerIdentity {
    /// An individual account handle, without the leading `@`.
    User(String),
    /// A team reference in `org/slug` form, without the leading `@`.
    Team(String),
}

impl OwnerIdentity {
    /// Parse an `@handle` or `@org/slug` token from a declaration line.
    ///
    /// Returns `None` for anything that is not a well-formed owner token:
    /// missing `@`, empty handle, more than one `/`, or characters outside
    /// `[A-Za-z0-9._-]` in any segment.
    pub fn parse_token(token: &str) -> Option<Self> {
        let handle = token.strip_prefix('@')?;
        if handle.is_empty() {
            return None;
        }
        let mut segments = handle.split('/');
        let first = segments.next()?;
        let second = segments.next();
        if segments.next().is_some() {
            return None;
        }
        if !is_valid_segment(first) {
            return None;
        }
        match second {
            None => Some(Self::User(first.to_string())),
            Some(slug) if is_valid_segment(slug) => Some(Self::Team(handle.to_string())),
            Some(_) => None,
        }
    }

    /// The bare handle, without the leading `@`.
    pub fn handle(&self) -> &str {
        match self {
            Self::User(h) | Self::Team(h) => h,
        }
    }

    pub fn is_team(&self) -> bool {
        matches!(self, Self::Team(_))
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl fmt::Display for OwnerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.handle())
    }
}
