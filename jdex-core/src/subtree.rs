//! Bounded-depth planning for one observed mutation.
//!
//! The mutated node is planned first. Its children are only revisited when
//! its own prefix changed, and grandchildren only when it was and stays an
//! area, because ids two levels down inherit the area's head digit. Ids are
//! terminal, so nothing deeper is ever touched.

use crate::grammar::{self, Level};
use crate::node::{Node, NodeKind, join_path, name_of, parent_of};
use crate::notice::Notice;
use crate::planner::{self, Arrival, Plan, PlanError, PlanRequest};
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Generation {
    Root,
    Child,
    Grandchild,
}

/// One rename, addressed by the path the node had when it was planned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRename {
    pub path: String,
    pub kind: NodeKind,
    pub target: String,
    pub generation: Generation,
}

impl PlannedRename {
    pub fn target_path(&self) -> String {
        join_path(parent_of(&self.path).unwrap_or(""), &self.target)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtreePlan {
    pub renames: Vec<PlannedRename>,
    pub notices: Vec<Notice>,
}

impl SubtreePlan {
    fn absorb(&mut self, node: &Node, plan: Plan, generation: Generation) {
        if let Some(target) = plan.target {
            self.renames.push(PlannedRename {
                path: node.path.clone(),
                kind: node.kind,
                target,
                generation,
            });
        }
        if let Some(notice) = plan.notice {
            self.notices.push(notice);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildSnapshot {
    pub node: Node,
    /// Children of `node`; only collected when grandchildren are visited.
    pub children: Vec<Node>,
}

/// Immutable view of the tree around one mutated node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtreeSnapshot {
    pub root: Node,
    /// `None` when the node was created.
    pub old_path: Option<String>,
    /// Current name of the parent, `None` for the tree root.
    pub parent_name: Option<String>,
    /// All children of the parent, the root included.
    pub siblings: Vec<Node>,
    pub children: Vec<ChildSnapshot>,
}

/// Outcome of the root step and how far the descendant pass must go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootStep {
    pub plan: Plan,
    pub final_name: String,
    pub visit_children: bool,
    pub visit_grandchildren: bool,
}

pub fn plan_root(snapshot: &SubtreeSnapshot, settings: Settings) -> Result<RootStep, PlanError> {
    let root = &snapshot.root;
    let old_path = snapshot.old_path.as_deref().unwrap_or(&root.path);
    let plan = planner::plan(&PlanRequest {
        node: root,
        old_path,
        parent_name: snapshot.parent_name.as_deref(),
        siblings: &snapshot.siblings,
        arrival: Arrival::classify(&root.path, snapshot.old_path.as_deref()),
        settings,
    })?;
    let final_name = plan.final_name(root.name()).to_string();

    let old_name = name_of(old_path);
    let old_prefix = grammar::parse_prefix(old_name).map(|(prefix, _)| prefix);
    let new_prefix = grammar::parse_prefix(&final_name).map(|(prefix, _)| prefix);
    let visit_children = root.is_container() && old_prefix != new_prefix;
    let visit_grandchildren = visit_children
        && grammar::classify_level(old_name) == Some(Level::Area)
        && grammar::classify_level(&final_name) == Some(Level::Area);

    Ok(RootStep {
        plan,
        final_name,
        visit_children,
        visit_grandchildren,
    })
}

/// Plans one sibling group under an already finalized parent name, in name
/// order, feeding each planned name back into the sibling view.
fn plan_generation(
    parent_name: &str,
    nodes: &[Node],
    settings: Settings,
) -> Result<Vec<(Node, Plan)>, PlanError> {
    let mut siblings = nodes.to_vec();
    siblings.sort_by(|a, b| a.name().cmp(b.name()));
    let mut planned = Vec::with_capacity(siblings.len());
    for index in 0..siblings.len() {
        let node = siblings[index].clone();
        let plan = planner::plan(&PlanRequest {
            node: &node,
            old_path: &node.path,
            parent_name: Some(parent_name),
            siblings: &siblings,
            arrival: Arrival::ParentRelabeled,
            settings,
        })?;
        if let Some(target) = &plan.target {
            siblings[index] = node.with_name(target);
        }
        planned.push((node, plan));
    }
    Ok(planned)
}

pub fn plan_descendants(
    snapshot: &SubtreeSnapshot,
    step: &RootStep,
    settings: Settings,
) -> Result<SubtreePlan, PlanError> {
    let mut out = SubtreePlan::default();
    out.absorb(&snapshot.root, step.plan.clone(), Generation::Root);
    if !step.visit_children {
        return Ok(out);
    }

    let children: Vec<Node> = snapshot.children.iter().map(|c| c.node.clone()).collect();
    let planned = plan_generation(&step.final_name, &children, settings)?;
    let mut child_names = Vec::with_capacity(planned.len());
    for (node, plan) in planned {
        child_names.push((node.path.clone(), plan.final_name(node.name()).to_string()));
        out.absorb(&node, plan, Generation::Child);
    }

    if !step.visit_grandchildren {
        return Ok(out);
    }
    for (path, final_name) in &child_names {
        let Some(child) = snapshot.children.iter().find(|c| &c.node.path == path) else {
            continue;
        };
        if !child.node.is_container() || child.children.is_empty() {
            continue;
        }
        for (node, plan) in plan_generation(final_name, &child.children, settings)? {
            out.absorb(&node, plan, Generation::Grandchild);
        }
    }
    Ok(out)
}

/// Root step plus descendant passes over a fully collected snapshot.
pub fn plan_subtree(snapshot: &SubtreeSnapshot, settings: Settings) -> Result<SubtreePlan, PlanError> {
    let step = plan_root(snapshot, settings)?;
    plan_descendants(snapshot, &step, settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_root_never_descends() {
        let root = Node::leaf("10-19 A/11 Me/note.md");
        let snapshot = SubtreeSnapshot {
            root: root.clone(),
            old_path: Some("note.md".into()),
            parent_name: Some("11 Me".into()),
            siblings: vec![root],
            children: Vec::new(),
        };
        let step = plan_root(&snapshot, Settings::default()).unwrap();
        assert!(!step.visit_children);
        assert_eq!(step.final_name, "note.md");
    }

    #[test]
    fn target_path_keeps_planning_parent() {
        let rename = PlannedRename {
            path: "10-19 A/11 Me/Hobbies".into(),
            kind: NodeKind::Container,
            target: "11.11 Hobbies".into(),
            generation: Generation::Root,
        };
        assert_eq!(rename.target_path(), "10-19 A/11 Me/11.11 Hobbies");
    }

    #[test]
    fn sibling_order_feeds_planned_names_forward() {
        let nodes = vec![
            Node::container("20-29 A/12 Two"),
            Node::container("20-29 A/11 One"),
        ];
        let planned = plan_generation("20-29 A", &nodes, Settings::default()).unwrap();
        let targets: Vec<_> = planned
            .iter()
            .map(|(_, plan)| plan.target.clone().unwrap())
            .collect();
        assert_eq!(targets, vec!["21 One".to_string(), "22 Two".to_string()]);
    }
}
