//! Map-backed tree for tests and embedders that keep their own storage.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use jdex_core::node::parent_of;
use jdex_core::{Node, NodeKind};
use tokio::sync::mpsc;

use super::{HostError, StructuralChange, TreeHost};

#[derive(Debug, Default)]
struct MemoryState {
    nodes: BTreeMap<String, NodeKind>,
    failures: HashMap<String, u32>,
    journal: Vec<(String, String)>,
    subscribers: Vec<mpsc::UnboundedSender<StructuralChange>>,
}

impl MemoryState {
    fn insert(&mut self, path: &str, kind: NodeKind) {
        let mut ancestor = parent_of(path);
        while let Some(parent) = ancestor {
            self.nodes
                .entry(parent.to_string())
                .or_insert(NodeKind::Container);
            ancestor = parent_of(parent);
        }
        self.nodes.insert(path.to_string(), kind);
    }

    fn relocate(&mut self, from: &str, to: &str) -> Result<(), HostError> {
        if !self.nodes.contains_key(from) {
            return Err(HostError::NotFound(from.to_string()));
        }
        if self.nodes.contains_key(to) {
            return Err(HostError::AlreadyExists(to.to_string()));
        }
        let nested = format!("{from}/");
        let moving: Vec<(String, NodeKind)> = self
            .nodes
            .iter()
            .filter(|(path, _)| path.as_str() == from || path.starts_with(&nested))
            .map(|(path, kind)| (path.clone(), *kind))
            .collect();
        for (path, _) in &moving {
            self.nodes.remove(path);
        }
        for (path, kind) in moving {
            let moved = format!("{to}{}", &path[from.len()..]);
            self.insert(&moved, kind);
        }
        Ok(())
    }

    fn emit(&mut self, change: StructuralChange) {
        self.subscribers
            .retain(|subscriber| subscriber.send(change.clone()).is_ok());
    }
}

/// In-memory tree. The root is the container with the empty path.
///
/// Every successful mutation, including renames issued through
/// [`TreeHost::rename`], is broadcast to subscribers.
#[derive(Debug)]
pub struct MemoryTree {
    state: Mutex<MemoryState>,
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTree {
    pub fn new() -> Self {
        let mut state = MemoryState::default();
        state.nodes.insert(String::new(), NodeKind::Container);
        Self {
            state: Mutex::new(state),
        }
    }

    /// Adds nodes without emitting changes; missing ancestors become
    /// containers.
    pub fn with_containers<I, S>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        {
            let mut state = self.state.lock().expect("memory tree lock poisoned");
            for path in paths {
                state.insert(path.as_ref(), NodeKind::Container);
            }
        }
        self
    }

    pub fn with_leaves<I, S>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        {
            let mut state = self.state.lock().expect("memory tree lock poisoned");
            for path in paths {
                state.insert(path.as_ref(), NodeKind::Leaf);
            }
        }
        self
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<StructuralChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state
            .lock()
            .expect("memory tree lock poisoned")
            .subscribers
            .push(tx);
        rx
    }

    /// Creates a node as an outside actor would.
    pub fn create(&self, path: &str, kind: NodeKind) -> StructuralChange {
        let mut state = self.state.lock().expect("memory tree lock poisoned");
        state.insert(path, kind);
        let change = StructuralChange::created(path);
        state.emit(change.clone());
        change
    }

    /// Moves or renames a node as an outside actor would.
    pub fn move_node(&self, from: &str, to: &str) -> Result<StructuralChange, HostError> {
        let mut state = self.state.lock().expect("memory tree lock poisoned");
        state.relocate(from, to)?;
        let change = StructuralChange::moved(from, to);
        state.emit(change.clone());
        Ok(change)
    }

    /// Makes the next `times` engine renames of `path` fail.
    pub fn fail_renames(&self, path: &str, times: u32) {
        self.state
            .lock()
            .expect("memory tree lock poisoned")
            .failures
            .insert(path.to_string(), times);
    }

    /// Renames performed through [`TreeHost::rename`], in order.
    pub fn journal(&self) -> Vec<(String, String)> {
        self.state
            .lock()
            .expect("memory tree lock poisoned")
            .journal
            .clone()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.state
            .lock()
            .expect("memory tree lock poisoned")
            .nodes
            .contains_key(path)
    }

    fn apply_rename(&self, node: &Node, new_path: &str) -> Result<(), HostError> {
        let mut state = self.state.lock().expect("memory tree lock poisoned");
        if let Some(remaining) = state.failures.get_mut(&node.path)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(HostError::Rejected(node.path.clone()));
        }
        state.relocate(&node.path, new_path)?;
        state
            .journal
            .push((node.path.clone(), new_path.to_string()));
        state.emit(StructuralChange::moved(node.path.clone(), new_path));
        Ok(())
    }

    /// Every path except the root, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.state
            .lock()
            .expect("memory tree lock poisoned")
            .nodes
            .keys()
            .filter(|path| !path.is_empty())
            .cloned()
            .collect()
    }
}

impl TreeHost for MemoryTree {
    async fn resolve(&self, path: &str) -> Result<Option<Node>, HostError> {
        let state = self.state.lock().expect("memory tree lock poisoned");
        Ok(state.nodes.get(path).map(|kind| Node::new(path, *kind)))
    }

    async fn rename(&self, node: &Node, new_path: &str) -> Result<(), HostError> {
        self.apply_rename(node, new_path)
    }

    async fn list_children(&self, container: &Node) -> Result<Vec<Node>, HostError> {
        let state = self.state.lock().expect("memory tree lock poisoned");
        if !state.nodes.contains_key(&container.path) {
            return Err(HostError::NotFound(container.path.clone()));
        }
        Ok(state
            .nodes
            .iter()
            .filter(|(path, _)| parent_of(path) == Some(container.path.as_str()))
            .map(|(path, kind)| Node::new(path.clone(), *kind))
            .collect())
    }
}
