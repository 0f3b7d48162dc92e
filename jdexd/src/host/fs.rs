use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use jdex_core::node::join_path;
use jdex_core::{Node, NodeKind};

use super::paths::fs_path_for;
use super::{HostError, StructuralChange, TreeHost};

const DEFAULT_ECHO_WINDOW: Duration = Duration::from_secs(2);

/// Renames this host performed, kept long enough to recognise the watcher
/// events they cause.
#[derive(Debug)]
struct EchoLog {
    window: Duration,
    entries: Vec<(String, String, Instant)>,
}

impl EchoLog {
    fn record(&mut self, from: &str, to: &str) {
        self.purge();
        self.entries
            .push((from.to_string(), to.to_string(), Instant::now()));
    }

    fn take(&mut self, change: &StructuralChange) -> bool {
        self.purge();
        let position = self.entries.iter().position(|(from, to, _)| {
            to == &change.path && change.old_path.as_ref().is_none_or(|old| old == from)
        });
        match position {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    fn purge(&mut self) {
        let window = self.window;
        self.entries
            .retain(|(_, _, recorded)| recorded.elapsed() <= window);
    }
}

/// A directory on the local filesystem.
#[derive(Debug)]
pub struct FsTree {
    root: PathBuf,
    echoes: Mutex<EchoLog>,
}

impl FsTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            echoes: Mutex::new(EchoLog {
                window: DEFAULT_ECHO_WINDOW,
                entries: Vec::new(),
            }),
        }
    }

    pub fn with_echo_window(self, window: Duration) -> Self {
        self.echoes.lock().expect("echo log lock poisoned").window = window;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True (once) when `change` is the watcher's view of a rename this host
    /// performed itself.
    pub fn take_echo(&self, change: &StructuralChange) -> bool {
        self.echoes
            .lock()
            .expect("echo log lock poisoned")
            .take(change)
    }
}

impl TreeHost for FsTree {
    async fn resolve(&self, path: &str) -> Result<Option<Node>, HostError> {
        let target = fs_path_for(&self.root, path)?;
        match tokio::fs::symlink_metadata(&target).await {
            Ok(meta) => {
                let kind = if meta.is_dir() {
                    NodeKind::Container
                } else {
                    NodeKind::Leaf
                };
                Ok(Some(Node::new(path, kind)))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn rename(&self, node: &Node, new_path: &str) -> Result<(), HostError> {
        let source = fs_path_for(&self.root, &node.path)?;
        let target = fs_path_for(&self.root, new_path)?;
        if tokio::fs::try_exists(&target).await? {
            return Err(HostError::AlreadyExists(new_path.to_string()));
        }
        match tokio::fs::rename(&source, &target).await {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(HostError::NotFound(node.path.clone()));
            }
            Err(err) => return Err(err.into()),
        }
        self.echoes
            .lock()
            .expect("echo log lock poisoned")
            .record(&node.path, new_path);
        Ok(())
    }

    async fn list_children(&self, container: &Node) -> Result<Vec<Node>, HostError> {
        let dir = fs_path_for(&self.root, &container.path)?;
        let mut entries = tokio::fs::read_dir(&dir).await?;
        let mut children = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                tracing::debug!(dir = %dir.display(), "skipping entry with non UTF-8 name");
                continue;
            };
            let kind = if entry.file_type().await?.is_dir() {
                NodeKind::Container
            } else {
                NodeKind::Leaf
            };
            children.push(Node::new(join_path(&container.path, &name), kind));
        }
        Ok(children)
    }
}
