use std::sync::{Arc, Mutex};
use std::time::Duration;

use jdex_core::PlannedRename;
use jdex_core::node::sibling_path;

use super::backoff::Backoff;
use crate::host::TreeHost;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Backoff) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            3,
            Backoff::new(Duration::from_millis(20), Duration::from_millis(80), true),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameStatus {
    Applied { from: String, to: String },
    /// The node already carried its target name.
    Skipped,
    /// Abandoned after the last attempt; the node keeps its last name.
    Failed { reason: String },
}

/// Renames already applied within one chain, used to translate the paths a
/// rename was planned against into where the node lives now.
#[derive(Debug, Clone, Default)]
pub struct PathRewrites {
    applied: Arc<Mutex<Vec<(String, String)>>>,
}

impl PathRewrites {
    pub fn record(&self, from: &str, to: &str) {
        self.applied
            .lock()
            .expect("path rewrites lock poisoned")
            .push((from.to_string(), to.to_string()));
    }

    pub fn current_path(&self, planned: &str) -> String {
        let applied = self.applied.lock().expect("path rewrites lock poisoned");
        let mut path = planned.to_string();
        for (from, to) in applied.iter() {
            if path == *from {
                path = to.clone();
            } else if let Some(rest) = path.strip_prefix(from.as_str())
                && rest.starts_with('/')
            {
                path = format!("{to}{rest}");
            }
        }
        path
    }
}

pub async fn execute_rename<H: TreeHost>(
    host: Arc<H>,
    rename: PlannedRename,
    rewrites: PathRewrites,
    retry: RetryPolicy,
) -> RenameStatus {
    let mut last_error = String::new();
    for attempt in 0..retry.attempts {
        if attempt > 0 {
            tokio::time::sleep(retry.backoff.delay(attempt - 1)).await;
        }
        let current = rewrites.current_path(&rename.path);
        let node = match host.resolve(&current).await {
            Ok(Some(node)) => node,
            Ok(None) => {
                last_error = format!("node not found at {current}");
                tracing::debug!(path = %current, attempt, "rename source missing");
                continue;
            }
            Err(err) => {
                last_error = err.to_string();
                tracing::debug!(path = %current, attempt, error = %err, "resolve failed");
                continue;
            }
        };
        if node.name() == rename.target {
            tracing::debug!(path = %current, "already carries target name");
            return RenameStatus::Skipped;
        }
        let target = sibling_path(&current, &rename.target);
        match host.rename(&node, &target).await {
            Ok(()) => {
                rewrites.record(&current, &target);
                tracing::info!(from = %current, to = %target, "renamed");
                return RenameStatus::Applied {
                    from: current,
                    to: target,
                };
            }
            Err(err) => {
                tracing::warn!(
                    from = %current,
                    to = %target,
                    attempt = attempt + 1,
                    error = %err,
                    "rename attempt failed"
                );
                last_error = err.to_string();
            }
        }
    }
    tracing::warn!(path = %rename.path, target = %rename.target, reason = %last_error, "rename abandoned");
    RenameStatus::Failed { reason: last_error }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryTree;
    use jdex_core::{Generation, NodeKind};

    fn planned(path: &str, target: &str) -> PlannedRename {
        PlannedRename {
            path: path.into(),
            kind: NodeKind::Container,
            target: target.into(),
            generation: Generation::Child,
        }
    }

    fn quick_retry() -> RetryPolicy {
        RetryPolicy::new(3, Backoff::new(Duration::ZERO, Duration::ZERO, false))
    }

    #[test]
    fn rewrites_follow_earlier_renames_in_order() {
        let rewrites = PathRewrites::default();
        rewrites.record("10-19 A", "20-29 A");
        rewrites.record("20-29 A/11 Me", "20-29 A/21 Me");
        assert_eq!(
            rewrites.current_path("10-19 A/11 Me/11.11 Hobbies"),
            "20-29 A/21 Me/11.11 Hobbies"
        );
        assert_eq!(rewrites.current_path("10-19 AB"), "10-19 AB");
    }

    #[tokio::test]
    async fn applies_against_rewritten_path() {
        let tree = Arc::new(MemoryTree::new().with_containers(["20-29 A/11 Me"]));
        let rewrites = PathRewrites::default();
        rewrites.record("10-19 A", "20-29 A");

        let status = execute_rename(
            Arc::clone(&tree),
            planned("10-19 A/11 Me", "21 Me"),
            rewrites.clone(),
            quick_retry(),
        )
        .await;

        assert_eq!(
            status,
            RenameStatus::Applied {
                from: "20-29 A/11 Me".into(),
                to: "20-29 A/21 Me".into()
            }
        );
        assert!(tree.contains("20-29 A/21 Me"));
        assert_eq!(rewrites.current_path("10-19 A/11 Me/x"), "20-29 A/21 Me/x");
    }

    #[tokio::test]
    async fn skips_when_name_already_matches() {
        let tree = Arc::new(MemoryTree::new().with_containers(["A/21 Me"]));
        let status = execute_rename(
            Arc::clone(&tree),
            planned("A/21 Me", "21 Me"),
            PathRewrites::default(),
            quick_retry(),
        )
        .await;
        assert_eq!(status, RenameStatus::Skipped);
        assert!(tree.journal().is_empty());
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let tree = Arc::new(MemoryTree::new().with_containers(["A/Me"]));
        tree.fail_renames("A/Me", 2);
        let status = execute_rename(
            Arc::clone(&tree),
            planned("A/Me", "11 Me"),
            PathRewrites::default(),
            quick_retry(),
        )
        .await;
        assert!(matches!(status, RenameStatus::Applied { .. }));
    }

    #[tokio::test]
    async fn gives_up_after_bounded_attempts() {
        let tree = Arc::new(MemoryTree::new().with_containers(["A/Me"]));
        tree.fail_renames("A/Me", 5);
        let status = execute_rename(
            Arc::clone(&tree),
            planned("A/Me", "11 Me"),
            PathRewrites::default(),
            quick_retry(),
        )
        .await;
        assert!(matches!(status, RenameStatus::Failed { .. }));
        assert!(tree.contains("A/Me"));
    }
}
