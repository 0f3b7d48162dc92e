//! Per-event snapshot of a node's naming state and its parent's.
//!
//! Built from the pre-mutation path so that the node's own fields describe
//! the name it had before the event. The parent is passed explicitly: the
//! current parent name for the mutated node, the finalized (planned) parent
//! name for descendants.

use crate::grammar::{self, Level, Prefix};
use crate::node::{Node, NodeKind, name_of, parent_of};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAttributes {
    pub kind: NodeKind,
    pub old_name: String,
    pub has_prefix: bool,
    pub prefix: String,
    pub plain_name: String,
    pub level: Option<Level>,
    parsed: Option<Prefix>,
    parent_name: Option<String>,
    parent_parsed: Option<Prefix>,
}

impl NodeAttributes {
    pub fn new(node: &Node, old_path: &str, parent_name: Option<&str>) -> Self {
        let old_name = name_of(old_path).to_string();
        let parsed = grammar::parse_prefix(&old_name).map(|(prefix, _)| prefix);
        let parent_parsed =
            parent_name.and_then(|name| grammar::parse_prefix(name).map(|(prefix, _)| prefix));
        Self {
            kind: node.kind,
            has_prefix: parsed.is_some(),
            prefix: grammar::extract_prefix(&old_name).to_string(),
            plain_name: grammar::plain_name(&old_name).to_string(),
            level: parsed.map(|prefix| prefix.level()),
            parsed,
            old_name,
            parent_name: parent_name.map(str::to_string),
            parent_parsed,
        }
    }

    pub fn old_prefix(&self) -> Option<Prefix> {
        self.parsed
    }

    pub fn parent_name(&self) -> Option<&str> {
        self.parent_name.as_deref()
    }

    pub fn parent(&self) -> Option<Prefix> {
        self.parent_parsed
    }

    pub fn parent_has_area_prefix(&self) -> bool {
        matches!(self.parent_parsed, Some(Prefix::Area(_)))
    }

    pub fn parent_has_category_or_id_prefix(&self) -> bool {
        matches!(
            self.parent_parsed,
            Some(Prefix::Category(_) | Prefix::Id { .. })
        )
    }

    pub fn parent_prefix(&self) -> &str {
        self.parent_name.as_deref().map_or("", grammar::extract_prefix)
    }

    /// 0 for an area parent, dot count + 1 for category/id parents, `None`
    /// when the parent is unnumbered.
    pub fn parent_level(&self) -> Option<u8> {
        if self.parent_has_area_prefix() {
            return Some(0);
        }
        if self.parent_has_category_or_id_prefix() {
            let dots = self.parent_prefix().matches('.').count() as u8;
            return Some(dots + 1);
        }
        None
    }
}

/// Whether a node ended up under a different parent than `old_path` had.
pub fn was_relocated(current_path: &str, old_path: &str) -> bool {
    parent_of(current_path) != parent_of(old_path)
}
