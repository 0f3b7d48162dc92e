//! The tree the engine renumbers, seen through the only operations the
//! engine needs from it.

use std::future::Future;

use jdex_core::Node;
use thiserror::Error;

pub mod fs;
pub mod memory;
pub mod paths;

pub use fs::FsTree;
pub use memory::MemoryTree;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("node not found: {0}")]
    NotFound(String),
    #[error("destination already exists: {0}")]
    AlreadyExists(String),
    #[error("path contains unsupported component: {0}")]
    UnsupportedPath(String),
    #[error("rename rejected: {0}")]
    Rejected(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A completed creation, move or rename in the host tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralChange {
    pub path: String,
    /// `None` for nodes that just appeared.
    pub old_path: Option<String>,
}

impl StructuralChange {
    pub fn created(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            old_path: None,
        }
    }

    pub fn moved(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            path: to.into(),
            old_path: Some(from.into()),
        }
    }
}

pub trait TreeHost: Send + Sync + 'static {
    fn resolve(&self, path: &str) -> impl Future<Output = Result<Option<Node>, HostError>> + Send;

    /// Moves `node` to `new_path`. Must not overwrite an existing node.
    fn rename(
        &self,
        node: &Node,
        new_path: &str,
    ) -> impl Future<Output = Result<(), HostError>> + Send;

    fn list_children(
        &self,
        container: &Node,
    ) -> impl Future<Output = Result<Vec<Node>, HostError>> + Send;
}
