//! Johnny Decimal numbering rules: name grammar, slot allocation and the
//! rename planner used by the `jdexd` engine.

pub mod allocator;
pub mod attributes;
pub mod grammar;
pub mod node;
pub mod notice;
pub mod planner;
pub mod settings;
pub mod subtree;

pub use allocator::{Allocation, SlotMode, next_slot, used_slots};
pub use attributes::NodeAttributes;
pub use grammar::{
    Band, GrammarError, Level, Prefix, classify_level, extract_prefix, has_prefix, plain_name,
    strip_prefix_from_path,
};
pub use node::{Node, NodeKind};
pub use notice::Notice;
pub use planner::{Arrival, Plan, PlanError, PlanRequest};
pub use settings::Settings;
pub use subtree::{
    ChildSnapshot, Generation, PlannedRename, RootStep, SubtreePlan, SubtreeSnapshot,
};
