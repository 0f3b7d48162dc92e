use super::*;
use crate::host::MemoryTree;
use crate::sync::backoff::Backoff;
use crate::sync::notifier::RecordingNotifier;
use jdex_core::{Generation, NodeKind};
use std::time::Duration;
use tokio::sync::Semaphore;

type TestEngine<H> = Engine<H, Arc<RecordingNotifier>>;

fn quick_retry() -> RetryPolicy {
    RetryPolicy::new(3, Backoff::new(Duration::ZERO, Duration::ZERO, false))
}

fn make_engine<H: TreeHost>(host: H) -> (Arc<H>, Arc<RecordingNotifier>, TestEngine<H>) {
    let host = Arc::new(host);
    let notifier = Arc::new(RecordingNotifier::new());
    let engine = Engine::new(
        Arc::clone(&host),
        Arc::clone(&notifier),
        Settings::default(),
        quick_retry(),
    );
    (host, notifier, engine)
}

fn applied(report: &MutationReport) -> Vec<(String, String)> {
    report
        .applied()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

/// Applies each rename and then waits for the test to release it.
struct HeldTree {
    inner: MemoryTree,
    release: Semaphore,
}

impl TreeHost for HeldTree {
    async fn resolve(&self, path: &str) -> Result<Option<Node>, HostError> {
        self.inner.resolve(path).await
    }

    async fn rename(&self, node: &Node, new_path: &str) -> Result<(), HostError> {
        self.inner.rename(node, new_path).await?;
        self.release
            .acquire()
            .await
            .map_err(|_| HostError::Rejected(node.path.clone()))?
            .forget();
        Ok(())
    }

    async fn list_children(&self, container: &Node) -> Result<Vec<Node>, HostError> {
        self.inner.list_children(container).await
    }
}

#[tokio::test]
async fn folder_moved_into_category_gets_first_id() {
    let (tree, notifier, engine) = make_engine(
        MemoryTree::new().with_containers(["10-19 Life admin/11 Me", "Hobbies"]),
    );
    let change = tree
        .move_node("Hobbies", "10-19 Life admin/11 Me/Hobbies")
        .unwrap();

    let report = engine.handle_change(change).await.unwrap().unwrap();

    assert_eq!(
        applied(&report),
        vec![(
            "10-19 Life admin/11 Me/Hobbies".to_string(),
            "10-19 Life admin/11 Me/11.11 Hobbies".to_string()
        )]
    );
    assert!(tree.contains("10-19 Life admin/11 Me/11.11 Hobbies"));
    assert!(notifier.notices().is_empty());
    assert!(engine.is_idle());
}

#[tokio::test]
async fn category_renamed_in_place_leaves_children_alone() {
    let (tree, _, engine) = make_engine(
        MemoryTree::new().with_containers(["10-19 Life admin/11 Me/11.11 Hobbies"]),
    );
    let change = tree
        .move_node("10-19 Life admin/11 Me", "10-19 Life admin/11 My stuff")
        .unwrap();

    let report = engine.handle_change(change).await.unwrap().unwrap();

    assert!(report.renames.is_empty());
    assert!(tree.journal().is_empty());
    assert!(tree.contains("10-19 Life admin/11 My stuff/11.11 Hobbies"));
}

#[tokio::test]
async fn renumbered_area_rewrites_categories_then_ids() {
    let (tree, _, engine) = make_engine(
        MemoryTree::new()
            .with_containers([
                "10-19 Life admin/11 Me/11.11 Hobbies",
                "10-19 Life admin/12 Home/12.11 Garden",
                "30-39 Work",
            ])
            .with_leaves(["10-19 Life admin/11 Me/readme.md"]),
    );
    let change = tree
        .move_node("10-19 Life admin", "20-29 Life admin")
        .unwrap();

    let report = engine.handle_change(change).await.unwrap().unwrap();

    let generations: Vec<Generation> = report
        .renames
        .iter()
        .map(|outcome| outcome.rename.generation)
        .collect();
    assert_eq!(
        generations,
        vec![
            Generation::Child,
            Generation::Child,
            Generation::Grandchild,
            Generation::Grandchild
        ]
    );
    assert_eq!(report.failed(), 0);
    assert_eq!(
        tree.paths(),
        vec![
            "20-29 Life admin",
            "20-29 Life admin/21 Me",
            "20-29 Life admin/21 Me/21.11 Hobbies",
            "20-29 Life admin/21 Me/readme.md",
            "20-29 Life admin/22 Home",
            "20-29 Life admin/22 Home/22.11 Garden",
            "30-39 Work",
        ]
    );
}

#[tokio::test]
async fn tenth_category_stays_plain_and_notifies() {
    let categories: Vec<String> = (11..=19)
        .map(|n| format!("10-19 Life admin/{n} Category {n}"))
        .collect();
    let (tree, notifier, engine) = make_engine(MemoryTree::new().with_containers(categories));
    let change = tree.create("10-19 Life admin/Overflow", NodeKind::Container);

    let report = engine.handle_change(change).await.unwrap().unwrap();

    let expected = Notice::AreaFull {
        area: "10-19 Life admin".into(),
    };
    assert!(report.renames.is_empty());
    assert_eq!(report.notices, vec![expected.clone()]);
    assert_eq!(notifier.notices(), vec![expected]);
    assert!(tree.contains("10-19 Life admin/Overflow"));
}

#[tokio::test]
async fn own_rename_events_are_suppressed_while_in_flight() {
    let (tree, _, engine) = make_engine(HeldTree {
        inner: MemoryTree::new().with_containers(["10-19 Life admin/11 Me", "Hobbies"]),
        release: Semaphore::new(0),
    });
    let engine = Arc::new(engine);
    let mut events = tree.inner.subscribe();
    let change = tree
        .inner
        .move_node("Hobbies", "10-19 Life admin/11 Me/Hobbies")
        .unwrap();
    assert_eq!(events.recv().await, Some(change.clone()));

    let admission = engine.admit(&change).unwrap();
    let task = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.process(admission, change).await }
    });

    let echo = events.recv().await.unwrap();
    assert_eq!(
        echo,
        StructuralChange::moved(
            "10-19 Life admin/11 Me/Hobbies",
            "10-19 Life admin/11 Me/11.11 Hobbies"
        )
    );
    assert!(engine.admit(&echo).is_none());
    assert!(engine.handle_change(echo.clone()).await.unwrap().is_none());
    assert!(!engine.is_idle());

    tree.release.add_permits(1);
    let report = task.await.unwrap().unwrap();
    assert_eq!(report.renames.len(), 1);
    assert!(engine.is_idle());

    // A late echo is planned again but changes nothing.
    let replay = engine.handle_change(echo).await.unwrap().unwrap();
    assert!(replay.renames.is_empty());
    assert_eq!(tree.inner.journal().len(), 1);
}

#[tokio::test]
async fn unrelated_change_is_dropped_while_another_is_admitted() {
    let (tree, _, engine) = make_engine(MemoryTree::new().with_containers(["A", "B"]));
    let first = tree.move_node("A", "A2").unwrap();
    let second = tree.move_node("B", "B2").unwrap();

    let admission = engine.admit(&first).unwrap();
    assert!(engine.handle_change(second).await.unwrap().is_none());
    drop(admission);
    assert!(engine.is_idle());
}

#[tokio::test]
async fn failing_rename_is_abandoned_after_retries() {
    let (tree, _, engine) = make_engine(
        MemoryTree::new().with_containers(["10-19 Life admin/11 Me", "Hobbies"]),
    );
    tree.fail_renames("10-19 Life admin/11 Me/Hobbies", 10);
    let change = tree
        .move_node("Hobbies", "10-19 Life admin/11 Me/Hobbies")
        .unwrap();

    let report = engine.handle_change(change).await.unwrap().unwrap();

    assert_eq!(report.failed(), 1);
    assert!(tree.contains("10-19 Life admin/11 Me/Hobbies"));
    assert!(engine.is_idle());
}

#[tokio::test]
async fn failed_child_does_not_cancel_later_renames() {
    let (tree, _, engine) = make_engine(MemoryTree::new().with_containers([
        "10-19 A/11 Me/11.11 Hobbies",
        "10-19 A/12 Home",
    ]));
    tree.fail_renames("20-29 A/11 Me", 10);
    let change = tree.move_node("10-19 A", "20-29 A").unwrap();

    let report = engine.handle_change(change).await.unwrap().unwrap();

    assert_eq!(report.failed(), 1);
    assert!(tree.contains("20-29 A/22 Home"));
    // The id still follows its category's final name as planned.
    assert!(tree.contains("20-29 A/11 Me/21.11 Hobbies"));
}

#[tokio::test]
async fn settings_swap_applies_to_next_mutation() {
    let (tree, _, engine) = make_engine(MemoryTree::new().with_containers([
        "10-19 A/11 Me/11.11 First",
        "10-19 A/11 Me/11.13 Third",
        "Inbox/Second",
        "Inbox/Fourth",
    ]));
    let change = tree.move_node("Inbox/Fourth", "10-19 A/11 Me/Fourth").unwrap();
    engine.handle_change(change).await.unwrap();
    assert!(tree.contains("10-19 A/11 Me/11.14 Fourth"));

    engine.set_settings(Settings {
        fill_item_gaps: true,
        ..Settings::default()
    });
    let change = tree.move_node("Inbox/Second", "10-19 A/11 Me/Second").unwrap();
    engine.handle_change(change).await.unwrap();
    assert!(tree.contains("10-19 A/11 Me/11.12 Second"));
}

#[tokio::test]
async fn vanished_node_yields_empty_report() {
    let (_, _, engine) = make_engine(MemoryTree::new());
    let report = engine
        .handle_change(StructuralChange::created("Gone"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report, MutationReport::default());
    assert!(engine.is_idle());
}
