use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::host::StructuralChange;
use crate::host::paths::tree_path_for;

/// Rename cookies remembered while waiting for the paired event.
const PENDING_RENAMES: usize = 64;

pub fn start_notify_watcher(
    root: &Path,
) -> notify::Result<(RecommendedWatcher, mpsc::UnboundedReceiver<StructuralChange>)> {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut mapper = EventMapper::new(root);
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            for change in mapper.map(event) {
                let _ = tx.send(change);
            }
        }
        Err(err) => tracing::warn!(error = %err, "watcher error"),
    })?;
    watcher.watch(root, RecursiveMode::Recursive)?;
    Ok((watcher, rx))
}

/// Turns raw notify events into structural changes.
///
/// Backends that report both halves of a rename and then the joined event
/// would otherwise produce an arrival followed by a move for the same node;
/// the "renamed to" half is dropped when its "renamed from" half was seen.
#[derive(Debug)]
struct EventMapper {
    root: PathBuf,
    pending: VecDeque<usize>,
}

impl EventMapper {
    fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            pending: VecDeque::new(),
        }
    }

    fn tree_path(&self, path: &Path) -> Option<String> {
        tree_path_for(&self.root, path).filter(|tree_path| !tree_path.is_empty())
    }

    fn map(&mut self, event: Event) -> Vec<StructuralChange> {
        match event.kind {
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                if let Some(tracker) = event.attrs.tracker() {
                    if self.pending.len() == PENDING_RENAMES {
                        self.pending.pop_front();
                    }
                    self.pending.push_back(tracker);
                }
                Vec::new()
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                if event
                    .attrs
                    .tracker()
                    .is_some_and(|tracker| self.pending.contains(&tracker))
                {
                    return Vec::new();
                }
                self.arrivals(event.paths)
            }
            EventKind::Modify(ModifyKind::Name(_)) if event.paths.len() >= 2 => {
                if let Some(tracker) = event.attrs.tracker() {
                    self.pending.retain(|pending| *pending != tracker);
                }
                match (self.tree_path(&event.paths[0]), self.tree_path(&event.paths[1])) {
                    (Some(from), Some(to)) => vec![StructuralChange::moved(from, to)],
                    (None, Some(to)) => vec![StructuralChange::created(to)],
                    _ => Vec::new(),
                }
            }
            EventKind::Create(_) => self.arrivals(event.paths),
            _ => Vec::new(),
        }
    }

    fn arrivals(&self, paths: Vec<PathBuf>) -> Vec<StructuralChange> {
        paths
            .iter()
            .filter_map(|path| self.tree_path(path))
            .map(StructuralChange::created)
            .collect()
    }
}
