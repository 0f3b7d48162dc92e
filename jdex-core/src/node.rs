use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Container,
    Leaf,
}

/// A file or directory in the observed tree, addressed by a slash-delimited
/// path relative to the tree root. The root itself has the empty path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    pub path: String,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(path: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn container(path: impl Into<String>) -> Self {
        Self::new(path, NodeKind::Container)
    }

    pub fn leaf(path: impl Into<String>) -> Self {
        Self::new(path, NodeKind::Leaf)
    }

    pub fn is_container(&self) -> bool {
        self.kind == NodeKind::Container
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    pub fn name(&self) -> &str {
        name_of(&self.path)
    }

    /// `None` only for the tree root.
    pub fn parent_path(&self) -> Option<&str> {
        parent_of(&self.path)
    }

    /// Same node under a different last segment.
    pub fn with_name(&self, name: &str) -> Node {
        Node::new(sibling_path(&self.path, name), self.kind)
    }
}

pub fn name_of(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((_, name)) => name,
        None => path,
    }
}

pub fn parent_of(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }
    Some(match path.rsplit_once('/') {
        Some((parent, _)) => parent,
        None => "",
    })
}

pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

pub fn sibling_path(path: &str, name: &str) -> String {
    join_path(parent_of(path).unwrap_or(""), name)
}
