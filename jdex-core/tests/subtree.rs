use jdex_core::subtree::{plan_root, plan_subtree};
use jdex_core::{
    ChildSnapshot, Generation, Node, Notice, Settings, SubtreeSnapshot,
};

fn leaf_children(node: Node) -> ChildSnapshot {
    ChildSnapshot {
        node,
        children: Vec::new(),
    }
}

#[test]
fn folder_moved_into_category_becomes_an_id() {
    let root = Node::container("10-19 Life admin/11 Me/Hobbies");
    let snapshot = SubtreeSnapshot {
        root: root.clone(),
        old_path: Some("Hobbies".into()),
        parent_name: Some("11 Me".into()),
        siblings: vec![root],
        children: Vec::new(),
    };

    let plan = plan_subtree(&snapshot, Settings::default()).unwrap();
    assert_eq!(plan.renames.len(), 1);
    assert_eq!(
        plan.renames[0].target_path(),
        "10-19 Life admin/11 Me/11.11 Hobbies"
    );
    assert!(plan.notices.is_empty());
}

#[test]
fn category_renamed_in_place_keeps_prefix_and_children() {
    let root = Node::container("10-19 Life admin/11 My stuff");
    let snapshot = SubtreeSnapshot {
        root: root.clone(),
        old_path: Some("10-19 Life admin/11 Me".into()),
        parent_name: Some("10-19 Life admin".into()),
        siblings: vec![root.clone()],
        children: vec![leaf_children(Node::container(
            "10-19 Life admin/11 My stuff/11.11 Hobbies",
        ))],
    };

    let step = plan_root(&snapshot, Settings::default()).unwrap();
    assert_eq!(step.final_name, "11 My stuff");
    assert!(!step.visit_children);

    let plan = plan_subtree(&snapshot, Settings::default()).unwrap();
    assert!(plan.renames.is_empty());
}

#[test]
fn renumbered_area_rewrites_categories_and_ids_in_one_pass() {
    let root = Node::container("20-29 Life admin");
    let me = Node::container("20-29 Life admin/11 Me");
    let home = Node::container("20-29 Life admin/12 Home");
    let snapshot = SubtreeSnapshot {
        root: root.clone(),
        old_path: Some("10-19 Life admin".into()),
        parent_name: Some(String::new()),
        siblings: vec![root, Node::container("30-39 Work")],
        children: vec![
            ChildSnapshot {
                node: me,
                children: vec![
                    Node::container("20-29 Life admin/11 Me/11.11 Hobbies"),
                    Node::leaf("20-29 Life admin/11 Me/readme.md"),
                ],
            },
            ChildSnapshot {
                node: home,
                children: vec![Node::container("20-29 Life admin/12 Home/12.11 Garden")],
            },
        ],
    };

    let plan = plan_subtree(&snapshot, Settings::default()).unwrap();
    let summary: Vec<(Generation, &str, &str)> = plan
        .renames
        .iter()
        .map(|r| (r.generation, r.path.as_str(), r.target.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (Generation::Child, "20-29 Life admin/11 Me", "21 Me"),
            (Generation::Child, "20-29 Life admin/12 Home", "22 Home"),
            (
                Generation::Grandchild,
                "20-29 Life admin/11 Me/11.11 Hobbies",
                "21.11 Hobbies"
            ),
            (
                Generation::Grandchild,
                "20-29 Life admin/12 Home/12.11 Garden",
                "22.11 Garden"
            ),
        ]
    );
}

#[test]
fn tenth_category_is_left_plain_with_notice() {
    let mut siblings: Vec<Node> = (11..=19)
        .map(|n| Node::container(format!("10-19 Life admin/{n} Category {n}")))
        .collect();
    let root = Node::container("10-19 Life admin/Overflow");
    siblings.push(root.clone());
    let snapshot = SubtreeSnapshot {
        root,
        old_path: None,
        parent_name: Some("10-19 Life admin".into()),
        siblings,
        children: Vec::new(),
    };

    let plan = plan_subtree(&snapshot, Settings::default()).unwrap();
    assert!(plan.renames.is_empty());
    assert_eq!(
        plan.notices,
        vec![Notice::AreaFull {
            area: "10-19 Life admin".into()
        }]
    );
}

#[test]
fn category_losing_its_prefix_strips_children() {
    let root = Node::container("Me");
    let snapshot = SubtreeSnapshot {
        root: root.clone(),
        old_path: Some("10-19 Life admin/11 Me".into()),
        parent_name: Some(String::new()),
        siblings: vec![root],
        children: vec![
            leaf_children(Node::container("Me/11.11 Hobbies")),
            leaf_children(Node::leaf("Me/notes.md")),
        ],
    };

    let plan = plan_subtree(&snapshot, Settings::default()).unwrap();
    let targets: Vec<&str> = plan.renames.iter().map(|r| r.target.as_str()).collect();
    assert_eq!(targets, vec!["Hobbies"]);
}
