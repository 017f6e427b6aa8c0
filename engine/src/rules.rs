//! Ownership rules: the unit the tree stores and the engine evaluates.

use wildmatch::WildMatch;

use crate::identity::OwnerIdentity;

/// A file-glob restricting which files under a rule's directory it governs.
///
/// Patterns support `*` and `?` and are matched against the path relative to
/// the declaring directory. `*` may cross `/`, so `*.proto` also covers
/// protos in subdirectories without a rule of their own.
#[derive(Clone, Debug)]
pub struct ScopeGlob {
    pattern: String,
    matcher: WildMatch,
}

impl ScopeGlob {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            matcher: WildMatch::new(pattern),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.matches(rel_path)
    }
}

impl PartialEq for ScopeGlob {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for ScopeGlob {}

/// One ownership rule, immutable once the tree is built.
///
/// `dir` is canonical: slash-separated, no leading or trailing slash, `""`
/// for the repository root. The invariant that `dir` is an ancestor-or-self
/// of every file the rule governs is upheld by [`crate::tree::OwnersTree`],
/// which only yields a rule for files below its node.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnerRule {
    pub dir: String,
    pub scope: Option<ScopeGlob>,
    /// Declaration order, deduplicated.
    pub owners: Vec<OwnerIdentity>,
    /// Minimum number of distinct approving owners.
    pub required_count: u32,
    /// Whether ancestor rules may also satisfy requirements for files this
    /// rule governs.
    pub allow_fallback: bool,
}

impl OwnerRule {
    pub fn new(dir: &str) -> Self {
        Self {
            dir: dir.to_string(),
            scope: None,
            owners: Vec::new(),
            required_count: 1,
            allow_fallback: true,
        }
    }

    /// Whether this rule governs `rel_path` (a path relative to `dir`).
    pub fn applies_to(&self, rel_path: &str) -> bool {
        match &self.scope {
            None => true,
            Some(glob) => glob.matches(rel_path),
        }
    }

    /// Human-readable location for summaries: `OWNERS` file plus scope.
    pub fn display_location(&self) -> String {
        let dir = if self.dir.is_empty() { "." } else { &self.dir };
        match &self.scope {
            None => format!("{dir}/OWNERS"),
            Some(glob) => format!("{dir}/OWNERS ({})", glob.pattern()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unscoped_rule_applies_to_everything() {
        let rule = OwnerRule::new("src");
        assert!(rule.applies_to("main.rs"));
        assert!(rule.applies_to("deep/nested/mod.rs"));
    }

    #[test]
    fn scoped_rule_filters_by_glob() {
        let mut rule = OwnerRule::new("src");
        rule.scope = Some(ScopeGlob::new("*.proto"));
        assert!(rule.applies_to("api.proto"));
        assert!(rule.applies_to("nested/api.proto"));
        assert!(!rule.applies_to("main.rs"));
    }

    #[test]
    fn question_mark_matches_single_character() {
        let glob = ScopeGlob::new("v?.toml");
        assert!(glob.matches("v1.toml"));
        assert!(!glob.matches("v12.toml"));
    }

    #[test]
    fn display_location_names_owners_file() {
        let mut rule = OwnerRule::new("");
        assert_eq!(rule.display_location(), "./OWNERS");
        rule.dir = "lib".to_string();
        rule.scope = Some(ScopeGlob::new("*.js"));
        assert_eq!(rule.display_location(), "lib/OWNERS (*.js)");
    }
}
