use std::sync::{Arc, Mutex};

use jdex_core::node::name_of;
use jdex_core::subtree::{plan_descendants, plan_root};
use jdex_core::{
    ChildSnapshot, GrammarError, Node, Notice, PlanError, PlannedRename, Settings,
    SubtreeSnapshot, strip_prefix_from_path,
};
use thiserror::Error;

use super::executor::{PathRewrites, RenameStatus, RetryPolicy, execute_rename};
use super::gate::{Admission, Suppressed};
use super::notifier::Notifier;
use super::queue::RenameQueue;
use crate::host::{HostError, StructuralChange, TreeHost};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("host error: {0}")]
    Host(#[from] HostError),
    #[error("plan error: {0}")]
    Plan(#[from] PlanError),
    #[error("grammar error: {0}")]
    Grammar(#[from] GrammarError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOutcome {
    pub rename: PlannedRename,
    pub status: RenameStatus,
}

/// Everything one admitted mutation led to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationReport {
    pub renames: Vec<RenameOutcome>,
    pub notices: Vec<Notice>,
}

impl MutationReport {
    pub fn applied(&self) -> impl Iterator<Item = (&str, &str)> {
        self.renames.iter().filter_map(|outcome| match &outcome.status {
            RenameStatus::Applied { from, to } => Some((from.as_str(), to.as_str())),
            _ => None,
        })
    }

    pub fn failed(&self) -> usize {
        self.renames
            .iter()
            .filter(|outcome| matches!(outcome.status, RenameStatus::Failed { .. }))
            .count()
    }
}

pub struct Engine<H, N> {
    host: Arc<H>,
    notifier: N,
    settings: Mutex<Settings>,
    retry: RetryPolicy,
    queue: RenameQueue,
}

impl<H: TreeHost, N: Notifier> Engine<H, N> {
    pub fn new(host: Arc<H>, notifier: N, settings: Settings, retry: RetryPolicy) -> Self {
        Self {
            host,
            notifier,
            settings: Mutex::new(settings),
            retry,
            queue: RenameQueue::new(),
        }
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    pub fn settings(&self) -> Settings {
        *self.settings.lock().expect("settings lock poisoned")
    }

    /// Takes effect from the next admitted mutation.
    pub fn set_settings(&self, settings: Settings) {
        *self.settings.lock().expect("settings lock poisoned") = settings;
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_idle()
    }

    /// Event gate. `None` means the change is presumed to be an echo of our
    /// own renames and must be dropped.
    pub fn admit(&self, change: &StructuralChange) -> Option<Admission> {
        let mut identities = Vec::with_capacity(2);
        for path in std::iter::once(&change.path).chain(change.old_path.as_ref()) {
            match strip_prefix_from_path(path) {
                Ok(identity) => identities.push(identity),
                Err(_) => {
                    tracing::debug!(path = %change.path, "ignoring change of the tree root");
                    return None;
                }
            }
        }
        let identities: Vec<&str> = identities.iter().map(String::as_str).collect();
        match self.queue.try_admit(&identities) {
            Ok(admission) => Some(admission),
            Err(Suppressed::Busy) => {
                tracing::debug!(path = %change.path, "suppressed while renames are pending");
                None
            }
            Err(Suppressed::InFlight(identity)) => {
                tracing::debug!(path = %change.path, %identity, "suppressed in-flight node");
                None
            }
        }
    }

    /// Gate and process in one step. `Ok(None)` when the gate dropped the
    /// change.
    pub async fn handle_change(
        &self,
        change: StructuralChange,
    ) -> Result<Option<MutationReport>, EngineError> {
        let Some(admission) = self.admit(&change) else {
            return Ok(None);
        };
        self.process(admission, change).await.map(Some)
    }

    /// Plans the subtree around an admitted change, queues every rename and
    /// waits for the chain to settle.
    pub async fn process(
        &self,
        admission: Admission,
        change: StructuralChange,
    ) -> Result<MutationReport, EngineError> {
        let settings = self.settings();
        let Some(mut snapshot) = self.snapshot(&change).await? else {
            tracing::debug!(path = %change.path, "changed node is gone");
            return Ok(MutationReport::default());
        };
        let step = plan_root(&snapshot, settings)?;
        if step.visit_children {
            snapshot.children = self
                .collect_children(&snapshot.root, step.visit_grandchildren)
                .await?;
        }
        let plan = plan_descendants(&snapshot, &step, settings)?;

        for notice in &plan.notices {
            tracing::warn!(path = %change.path, "{notice}");
            self.notifier.notify_user(notice);
        }

        let key = strip_prefix_from_path(&change.path)?;
        let rewrites = PathRewrites::default();
        let mut queued = Vec::with_capacity(plan.renames.len());
        for rename in plan.renames {
            let identity = strip_prefix_from_path(&rename.path)?;
            tracing::debug!(
                %identity,
                path = %rename.path,
                target = %rename.target,
                generation = ?rename.generation,
                "queueing rename"
            );
            let job = execute_rename(
                Arc::clone(&self.host),
                rename.clone(),
                rewrites.clone(),
                self.retry,
            );
            queued.push((rename, self.queue.submit(&key, &identity, job)));
        }
        drop(admission);

        let mut report = MutationReport {
            renames: Vec::with_capacity(queued.len()),
            notices: plan.notices,
        };
        for (rename, handle) in queued {
            let status = handle.settle().await.unwrap_or_else(|| RenameStatus::Failed {
                reason: "rename was dropped".to_string(),
            });
            report.renames.push(RenameOutcome { rename, status });
        }
        Ok(report)
    }

    async fn snapshot(
        &self,
        change: &StructuralChange,
    ) -> Result<Option<SubtreeSnapshot>, EngineError> {
        let Some(root) = self.host.resolve(&change.path).await? else {
            return Ok(None);
        };
        let parent_path = root
            .parent_path()
            .ok_or_else(|| PlanError::MissingParent(root.path.clone()))?
            .to_string();
        let siblings = self
            .host
            .list_children(&Node::container(parent_path.as_str()))
            .await?;
        Ok(Some(SubtreeSnapshot {
            old_path: change.old_path.clone(),
            parent_name: Some(name_of(&parent_path).to_string()),
            siblings,
            children: Vec::new(),
            root,
        }))
    }

    async fn collect_children(
        &self,
        root: &Node,
        with_grandchildren: bool,
    ) -> Result<Vec<ChildSnapshot>, EngineError> {
        let mut children = Vec::new();
        for node in self.host.list_children(root).await? {
            let grandchildren = if with_grandchildren && node.is_container() {
                self.host.list_children(&node).await?
            } else {
                Vec::new()
            };
            children.push(ChildSnapshot {
                node,
                children: grandchildren,
            });
        }
        Ok(children)
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
