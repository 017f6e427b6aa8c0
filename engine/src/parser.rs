//! Ownership tree builder: parses per-directory declaration sources into an
//! [`OwnersTree`], accumulating diagnostics instead of failing.
//!
//! Declaration syntax, per `OWNERS` file:
//!
//! ```text
//! # comment
//! @alice
//! @platform/build
//! set noparent
//! set required 2
//! per-file *.proto = @bob @platform/protobuf
//! per-file *.proto = set required 2
//! ```
//!
//! Owner lines accumulate into the directory's base rule; `set` directives
//! adjust it. `per-file` lines declare scoped rules, one per distinct glob,
//! with their own owners and directives. A malformed line produces a
//! diagnostic and is skipped; the rest of the source still parses.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{ParseDiagnostic, RuleSyntaxError};
use crate::identity::OwnerIdentity;
use crate::membership::MembershipSnapshot;
use crate::rules::{OwnerRule, ScopeGlob};
use crate::tree::OwnersTree;

/// One raw declaration source, keyed by the directory it governs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeclarationSource {
    /// Directory path; normalized to canonical form (`""` = root) on parse.
    pub dir: String,
    pub text: String,
}

impl DeclarationSource {
    pub fn new(dir: &str, text: &str) -> Self {
        Self {
            dir: dir.to_string(),
            text: text.to_string(),
        }
    }
}

/// Outcome of one build: best-effort tree plus everything that was skipped.
#[derive(Clone, Debug)]
pub struct ParseResult {
    pub diagnostics: Vec<ParseDiagnostic>,
    pub tree: OwnersTree,
}

/// In-progress rule while a source is being parsed.
#[derive(Debug)]
struct RuleDraft {
    owners: Vec<OwnerIdentity>,
    required_count: u32,
    allow_fallback: bool,
    touched: bool,
}

impl RuleDraft {
    fn new() -> Self {
        Self {
            owners: Vec::new(),
            required_count: 1,
            allow_fallback: true,
            touched: false,
        }
    }

    fn add_owners(&mut self, owners: Vec<OwnerIdentity>) {
        for owner in owners {
            if !self.owners.contains(&owner) {
                self.owners.push(owner);
            }
        }
        self.touched = true;
    }

    fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::NoParent => self.allow_fallback = false,
            Directive::Required(n) => self.required_count = n,
        }
        self.touched = true;
    }

    fn into_rule(self, dir: &str, scope: Option<ScopeGlob>) -> Option<OwnerRule> {
        if !self.touched {
            return None;
        }
        Some(OwnerRule {
            dir: dir.to_string(),
            scope,
            owners: self.owners,
            required_count: self.required_count,
            allow_fallback: self.allow_fallback,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Directive {
    NoParent,
    Required(u32),
}

/// What one well-formed line contributes.
#[derive(Debug, PartialEq, Eq)]
enum Line {
    Blank,
    Owners(Vec<OwnerIdentity>),
    Set(Directive),
    PerFile { glob: String, body: PerFileBody },
}

#[derive(Debug, PartialEq, Eq)]
enum PerFileBody {
    Owners(Vec<OwnerIdentity>),
    Set(Directive),
}

/// Build an ownership tree from raw declaration sources against a fixed
/// membership snapshot.
///
/// Deterministic: the same sources and snapshot produce the same tree and
/// the same diagnostics, in the same order. Never fails; malformed lines
/// become diagnostics.
pub fn build(sources: &[DeclarationSource], membership: Arc<MembershipSnapshot>) -> ParseResult {
    let mut tree = OwnersTree::new(Arc::clone(&membership));
    let mut diagnostics = Vec::new();

    for source in sources {
        let dir = canonical_dir(&source.dir);
        let mut base = RuleDraft::new();
        // Scoped drafts in first-seen order; repeated globs accumulate.
        let mut per_file: Vec<(String, RuleDraft)> = Vec::new();

        for (idx, raw_line) in source.text.lines().enumerate() {
            let line_no = idx + 1;
            match parse_line(raw_line, &membership) {
                Ok(Line::Blank) => {}
                Ok(Line::Owners(owners)) => base.add_owners(owners),
                Ok(Line::Set(directive)) => base.apply(directive),
                Ok(Line::PerFile { glob, body }) => {
                    let slot = match per_file.iter().position(|(g, _)| *g == glob) {
                        Some(i) => i,
                        None => {
                            per_file.push((glob, RuleDraft::new()));
                            per_file.len() - 1
                        }
                    };
                    let draft = &mut per_file[slot].1;
                    match body {
                        PerFileBody::Owners(owners) => draft.add_owners(owners),
                        PerFileBody::Set(directive) => draft.apply(directive),
                    }
                }
                Err(error) => {
                    diagnostics.push(ParseDiagnostic::new(&dir, line_no, &error));
                }
            }
        }

        let node = tree.node_for_dir(&dir);
        if let Some(rule) = base.into_rule(&dir, None) {
            tree.push_rule(node, rule);
        }
        for (glob, draft) in per_file {
            if let Some(rule) = draft.into_rule(&dir, Some(ScopeGlob::new(&glob))) {
                tree.push_rule(node, rule);
            }
        }
    }

    if !diagnostics.is_empty() {
        tracing::warn!(
            count = diagnostics.len(),
            "declaration parse produced diagnostics"
        );
    }

    ParseResult { diagnostics, tree }
}

/// Every team handle referenced anywhere in the sources, for the service
/// layer to resolve before building. Tolerant of lines the builder would
/// reject: a team behind a typo elsewhere on the line still gets resolved,
/// which only costs one extra roster fetch.
pub fn referenced_teams(sources: &[DeclarationSource]) -> BTreeSet<String> {
    let mut teams = BTreeSet::new();
    for source in sources {
        for line in source.text.lines() {
            let line = strip_comment(line);
            for token in line.split_whitespace() {
                if let Some(OwnerIdentity::Team(handle)) = OwnerIdentity::parse_token(token) {
                    teams.insert(handle);
                }
            }
        }
    }
    teams
}

fn canonical_dir(dir: &str) -> String {
    let trimmed = dir.trim_matches('/');
    if trimmed == "." { String::new() } else { trimmed.to_string() }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn parse_line(raw: &str, membership: &MembershipSnapshot) -> Result<Line, RuleSyntaxError> {
    let line = strip_comment(raw).trim();
    if line.is_empty() {
        return Ok(Line::Blank);
    }

    if let Some(rest) = line.strip_prefix("set ") {
        return Ok(Line::Set(parse_directive(rest.trim())?));
    }

    if let Some(rest) = line.strip_prefix("per-file ") {
        let (glob, body) = rest
            .split_once('=')
            .ok_or(RuleSyntaxError::MalformedPerFile)?;
        let glob = glob.trim();
        if glob.is_empty() || glob.contains(char::is_whitespace) {
            return Err(RuleSyntaxError::MalformedPerFile);
        }
        let body = body.trim();
        if body.is_empty() {
            return Err(RuleSyntaxError::EmptyPerFile);
        }
        let body = if let Some(directive) = body.strip_prefix("set ") {
            PerFileBody::Set(parse_directive(directive.trim())?)
        } else {
            PerFileBody::Owners(parse_owner_tokens(body, membership)?)
        };
        return Ok(Line::PerFile {
            glob: glob.to_string(),
            body,
        });
    }

    if line.starts_with('@') {
        return Ok(Line::Owners(parse_owner_tokens(line, membership)?));
    }

    Err(RuleSyntaxError::UnknownDirective(
        line.split_whitespace().next().unwrap_or(line).to_string(),
    ))
}

fn parse_directive(text: &str) -> Result<Directive, RuleSyntaxError> {
    if text == "noparent" {
        return Ok(Directive::NoParent);
    }
    if let Some(count) = text.strip_prefix("required ") {
        let count = count.trim();
        return match count.parse::<u32>() {
            Ok(n) if n >= 1 => Ok(Directive::Required(n)),
            _ => Err(RuleSyntaxError::BadRequiredCount(count.to_string())),
        };
    }
    Err(RuleSyntaxError::UnknownDirective(format!("set {text}")))
}

fn parse_owner_tokens(
    text: &str,
    membership: &MembershipSnapshot,
) -> Result<Vec<OwnerIdentity>, RuleSyntaxError> {
    let mut owners = Vec::new();
    for token in text.split_whitespace() {
        let owner = OwnerIdentity::parse_token(token)
            .ok_or_else(|| RuleSyntaxError::BadOwnerToken(token.to_string()))?;
        if let OwnerIdentity::Team(handle) = &owner
            && !membership.contains_team(handle)
        {
            return Err(RuleSyntaxError::UnknownTeam(handle.clone()));
        }
        owners.push(owner);
    }
    Ok(owners)
}
