//! The resolved ownership tree: an arena of directory nodes plus a path
//! index, queryable for the ordered rule chain governing any file.
//!
//! Nodes live in a flat `Vec` and refer to each other by index; lookups walk
//! path components through per-node child maps. Construction allocates one
//! node per directory that appears on some declaration's path, and nothing
//! after publication mutates the arena.

use std::collections::HashMap;
use std::sync::Arc;

use crate::membership::MembershipSnapshot;
use crate::rules::OwnerRule;

pub type NodeId = usize;

#[derive(Clone, Debug, Default)]
struct Node {
    rules: Vec<OwnerRule>,
    children: HashMap<String, NodeId>,
}

/// One immutable ownership snapshot: tree plus the membership snapshot it
/// was built against. Shared read-only (`Arc`) for the lifetime of an
/// evaluation cycle, then discarded and rebuilt on the next refresh.
#[derive(Clone, Debug)]
pub struct OwnersTree {
    nodes: Vec<Node>,
    index: HashMap<String, NodeId>,
    membership: Arc<MembershipSnapshot>,
}

impl OwnersTree {
    pub(crate) fn new(membership: Arc<MembershipSnapshot>) -> Self {
        let root = Node::default();
        let mut index = HashMap::new();
        index.insert(String::new(), 0);
        Self {
            nodes: vec![root],
            index,
            membership,
        }
    }

    /// The membership snapshot captured when this tree was built.
    pub fn membership(&self) -> &MembershipSnapshot {
        &self.membership
    }

    /// Node for `dir` (canonical, `""` = root), creating the chain of
    /// structural nodes down to it as needed.
    pub(crate) fn node_for_dir(&mut self, dir: &str) -> NodeId {
        if let Some(&id) = self.index.get(dir) {
            return id;
        }
        let mut current = 0;
        let mut path = String::new();
        for component in dir.split('/').filter(|c| !c.is_empty()) {
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(component);
            current = match self.nodes[current].children.get(component) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[current]
                        .children
                        .insert(component.to_string(), child);
                    self.index.insert(path.clone(), child);
                    child
                }
            };
        }
        current
    }

    pub(crate) fn push_rule(&mut self, node: NodeId, rule: OwnerRule) {
        self.nodes[node].rules.push(rule);
    }

    /// The ordered rule chain governing `file`, root-to-leaf (least to most
    /// specific), with rules whose scope glob excludes the file filtered
    /// out. An empty chain means the file is ownerless.
    pub fn rules_for(&self, file: &str) -> Vec<&OwnerRule> {
        let file = file.trim_start_matches('/');
        let mut chain = Vec::new();
        let mut node = 0;
        let mut consumed = 0usize;

        self.collect_applicable(node, file, &mut chain);
        let components: Vec<&str> = file.split('/').collect();
        // The final component is the file name, never a directory to descend
        // into.
        for component in &components[..components.len().saturating_sub(1)] {
            let Some(&child) = self.nodes[node].children.get(*component) else {
                break;
            };
            node = child;
            consumed += component.len() + 1;
            self.collect_applicable(node, &file[consumed..], &mut chain);
        }
        chain
    }

    fn collect_applicable<'a>(&'a self, node: NodeId, rel: &str, out: &mut Vec<&'a OwnerRule>) {
        for rule in &self.nodes[node].rules {
            if rule.applies_to(rel) {
                out.push(rule);
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn rule_count(&self) -> usize {
        self.nodes.iter().map(|n| n.rules.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rule_count() == 0
    }
}
