//! Next-free-slot computation for categories and ids.

use std::collections::BTreeSet;

use crate::grammar::{self, Band, Level};
use crate::node::{Node, NodeKind};

const FIRST_ITEM: u8 = 11;
const LAST_ITEM: u8 = 99;
const FIRST_TEN: std::ops::RangeInclusive<u8> = 1..=10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotMode {
    /// Category inside an area band: `start+1..=end`, always one past the
    /// highest used slot.
    Category { band: Band },
    /// Id inside a category: `11..=99`. Appends past the highest used slot
    /// unless `fill_gaps` is set.
    Item { fill_gaps: bool },
    /// Low ids `01..=10` reserved for sub-categorizing folders; lowest free
    /// slot wins.
    FirstTen,
}

impl SlotMode {
    /// Prefix level of the names this mode hands out.
    pub fn level(&self) -> Level {
        match self {
            SlotMode::Category { .. } => Level::Category,
            SlotMode::Item { .. } | SlotMode::FirstTen => Level::Id,
        }
    }

    pub fn range(&self) -> std::ops::RangeInclusive<u8> {
        match self {
            SlotMode::Category { band } => band.start.saturating_add(1)..=band.end,
            SlotMode::Item { .. } => FIRST_ITEM..=LAST_ITEM,
            SlotMode::FirstTen => FIRST_TEN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    Slot(u8),
    Exhausted,
}

pub fn next_slot(used: &BTreeSet<u8>, mode: SlotMode) -> Allocation {
    let range = mode.range();
    let (floor, ceiling) = (*range.start(), *range.end());
    // Degenerate bands such as `99-99` or `19-10` leave no slots.
    if floor > ceiling {
        return Allocation::Exhausted;
    }
    let candidate = match mode {
        SlotMode::Category { .. } | SlotMode::Item { fill_gaps: false } => used
            .range(range)
            .next_back()
            .map_or(Some(floor), |highest| highest.checked_add(1)),
        SlotMode::Item { fill_gaps: true } | SlotMode::FirstTen => {
            range.into_iter().find(|slot| !used.contains(slot))
        }
    };
    match candidate {
        Some(slot) if slot >= floor && slot <= ceiling => Allocation::Slot(slot),
        _ => Allocation::Exhausted,
    }
}

/// Slots taken by siblings of the same kind whose prefix has `level`.
///
/// `exclude` is the name of the node being placed; it never counts against
/// itself.
pub fn used_slots(siblings: &[Node], kind: NodeKind, level: Level, exclude: &str) -> BTreeSet<u8> {
    let mut prefixes: Vec<&str> = siblings
        .iter()
        .filter(|sibling| sibling.kind == kind)
        .map(Node::name)
        .filter(|name| *name != exclude)
        .filter(|name| grammar::classify_level(name) == Some(level))
        .map(grammar::extract_prefix)
        .collect();
    prefixes.sort_unstable();
    prefixes
        .into_iter()
        .filter_map(|prefix| {
            let key = prefix.rsplit('.').next()?;
            key.parse().ok()
        })
        .collect()
}
