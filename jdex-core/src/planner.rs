//! Decides the target name of a single node.
//!
//! The decision depends on what the parent allows (see [`Expectation`]) and
//! on how the node reached its current state ([`Arrival`]). Exhaustion and
//! prefix conflicts are ordinary outcomes carried in [`Plan::notice`].

use thiserror::Error;

use crate::allocator::{Allocation, SlotMode, next_slot, used_slots};
use crate::attributes::{NodeAttributes, was_relocated};
use crate::grammar::{self, Band, Prefix};
use crate::node::{Node, NodeKind};
use crate::notice::Notice;
use crate::settings::Settings;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("node has no parent: {0:?}")]
    MissingParent(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// Appeared in the tree (created, or moved in from outside it).
    Created,
    /// Now lives under a different parent.
    Moved,
    /// Same parent, own name edited.
    RenamedInPlace,
    /// Untouched itself; an ancestor was renumbered.
    ParentRelabeled,
}

impl Arrival {
    pub fn classify(current_path: &str, old_path: Option<&str>) -> Arrival {
        match old_path {
            None => Arrival::Created,
            Some(old) if was_relocated(current_path, old) => Arrival::Moved,
            Some(_) => Arrival::RenamedInPlace,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlanRequest<'a> {
    pub node: &'a Node,
    /// Path before the event; equal to `node.path` when nothing moved.
    pub old_path: &'a str,
    /// Final name of the parent. `None` only for the tree root.
    pub parent_name: Option<&'a str>,
    /// Every child of the parent, the node itself included.
    pub siblings: &'a [Node],
    pub arrival: Arrival,
    pub settings: Settings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// New name, `None` to leave the node as it is.
    pub target: Option<String>,
    pub notice: Option<Notice>,
}

impl Plan {
    pub fn keep() -> Self {
        Self::default()
    }

    fn rename(current: &str, target: String) -> Self {
        if target == current || target.is_empty() {
            return Self::keep();
        }
        Self {
            target: Some(target),
            notice: None,
        }
    }

    fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }

    pub fn final_name<'a>(&'a self, current: &'a str) -> &'a str {
        self.target.as_deref().unwrap_or(current)
    }
}

/// Slot family a numbered parent hands out to this kind of child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotRule {
    Category(Band),
    Item { category: u8, fill_gaps: bool },
    FirstTen { category: u8 },
}

impl SlotRule {
    fn mode(self) -> SlotMode {
        match self {
            SlotRule::Category(band) => SlotMode::Category { band },
            SlotRule::Item { fill_gaps, .. } => SlotMode::Item { fill_gaps },
            SlotRule::FirstTen { .. } => SlotMode::FirstTen,
        }
    }

    fn prefix(self, slot: u8) -> Prefix {
        match self {
            SlotRule::Category(_) => Prefix::Category(slot),
            SlotRule::Item { category, .. } | SlotRule::FirstTen { category } => {
                Prefix::Id { category, item: slot }
            }
        }
    }

    fn fits(self, prefix: Prefix) -> bool {
        match (self, prefix) {
            (SlotRule::Category(_), Prefix::Category(number)) => {
                self.mode().range().contains(&number)
            }
            (
                SlotRule::Item { category, .. } | SlotRule::FirstTen { category },
                Prefix::Id {
                    category: own,
                    item,
                },
            ) => own == category && self.mode().range().contains(&item),
            _ => false,
        }
    }

    /// Same level prefix with the inherited head swapped for the parent's.
    fn rehome(self, prefix: Prefix) -> Option<Prefix> {
        let candidate = match (self, prefix) {
            (SlotRule::Category(band), Prefix::Category(number)) => {
                Prefix::Category(band.head() + number % 10)
            }
            (SlotRule::Item { .. } | SlotRule::FirstTen { .. }, Prefix::Id { item, .. }) => {
                self.prefix(item)
            }
            _ => return None,
        };
        self.fits(candidate).then_some(candidate)
    }

    fn exhausted(self, parent_name: &str) -> Notice {
        let name = parent_name.to_string();
        match self {
            SlotRule::Category(_) => Notice::AreaFull { area: name },
            SlotRule::Item { .. } => Notice::CategoryFull { category: name },
            SlotRule::FirstTen { .. } => Notice::FirstTenFull { category: name },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expectation {
    /// Unnumbered parent: containers may declare an area band, nothing else
    /// carries a prefix.
    Free,
    /// No prefix allowed.
    Bare,
    Slot(SlotRule),
}

fn expectation(attrs: &NodeAttributes, kind: NodeKind, settings: Settings) -> Expectation {
    match (attrs.parent_level(), attrs.parent()) {
        (None, _) => Expectation::Free,
        (Some(level), _) if level >= 2 => Expectation::Bare,
        (_, Some(Prefix::Area(band))) => match kind {
            NodeKind::Container => Expectation::Slot(SlotRule::Category(band)),
            NodeKind::Leaf => Expectation::Bare,
        },
        (_, Some(Prefix::Category(category))) => {
            let item = SlotRule::Item {
                category,
                fill_gaps: settings.fill_item_gaps,
            };
            match (kind, settings.flattened()) {
                (NodeKind::Container, false) | (NodeKind::Leaf, true) => Expectation::Slot(item),
                (NodeKind::Leaf, false) => Expectation::Bare,
                (NodeKind::Container, true) if settings.first_ten() => {
                    Expectation::Slot(SlotRule::FirstTen { category })
                }
                (NodeKind::Container, true) => Expectation::Bare,
            }
        }
        _ => Expectation::Bare,
    }
}

struct Subject<'a> {
    request: &'a PlanRequest<'a>,
    attrs: NodeAttributes,
    parent_name: &'a str,
    current: &'a str,
    own: Option<Prefix>,
    plain: &'a str,
}

impl Subject<'_> {
    fn strip(&self) -> Plan {
        match self.own {
            Some(_) => Plan::rename(self.current, self.plain.to_string()),
            None => Plan::keep(),
        }
    }

    fn revert(&self) -> Plan {
        Plan::rename(self.current, self.attrs.old_name.clone())
    }

    fn apply(&self, prefix: Prefix) -> Plan {
        Plan::rename(self.current, prefix.apply(self.plain))
    }
}

pub fn plan(request: &PlanRequest<'_>) -> Result<Plan, PlanError> {
    let node = request.node;
    let parent_name = request
        .parent_name
        .ok_or_else(|| PlanError::MissingParent(node.path.clone()))?;
    let current = node.name();
    let (own, plain) = match grammar::parse_prefix(current) {
        Some((prefix, plain)) => (Some(prefix), plain),
        None => (None, current),
    };
    let subject = Subject {
        request,
        attrs: NodeAttributes::new(node, request.old_path, Some(parent_name)),
        parent_name,
        current,
        own,
        plain,
    };

    Ok(
        match expectation(&subject.attrs, node.kind, request.settings) {
            Expectation::Free => plan_unnumbered_parent(&subject),
            Expectation::Bare => subject.strip(),
            Expectation::Slot(rule) => plan_slot(&subject, rule),
        },
    )
}

fn plan_unnumbered_parent(subject: &Subject<'_>) -> Plan {
    let request = subject.request;
    match subject.own {
        Some(Prefix::Area(band)) if request.node.is_container() => {
            let taken = request
                .siblings
                .iter()
                .filter(|sibling| sibling.is_container() && sibling.name() != subject.current)
                .filter_map(|sibling| match grammar::parse_prefix(sibling.name()) {
                    Some((Prefix::Area(other), _)) => Some(other),
                    _ => None,
                })
                .any(|other| other.overlaps(&band));
            if !taken {
                return Plan::keep();
            }
            let notice = Notice::PrefixConflict {
                name: subject.current.to_string(),
                prefix: band.to_string(),
            };
            let fallback = if request.arrival == Arrival::RenamedInPlace {
                subject.revert()
            } else {
                subject.strip()
            };
            fallback.with_notice(notice)
        }
        Some(_) => subject.strip(),
        None => Plan::keep(),
    }
}

fn plan_slot(subject: &Subject<'_>, rule: SlotRule) -> Plan {
    let request = subject.request;
    let used = used_slots(
        request.siblings,
        request.node.kind,
        rule.mode().level(),
        subject.current,
    );
    let allocate = || match next_slot(&used, rule.mode()) {
        Allocation::Slot(slot) => subject.apply(rule.prefix(slot)),
        Allocation::Exhausted => subject
            .strip()
            .with_notice(rule.exhausted(subject.parent_name)),
    };

    match request.arrival {
        Arrival::Created => match subject.own {
            Some(prefix) if rule.fits(prefix) && !used.contains(&prefix.slot()) => Plan::keep(),
            _ => allocate(),
        },
        Arrival::Moved => allocate(),
        Arrival::ParentRelabeled => match subject.own {
            None => Plan::keep(),
            Some(prefix) if rule.fits(prefix) => Plan::keep(),
            Some(prefix) => match rule.rehome(prefix) {
                Some(rehomed) if !used.contains(&rehomed.slot()) => subject.apply(rehomed),
                _ => allocate(),
            },
        },
        Arrival::RenamedInPlace => {
            let previous = subject.attrs.old_prefix().filter(|prefix| rule.fits(*prefix));
            match subject.own {
                Some(_) if subject.attrs.old_name == subject.current => Plan::keep(),
                Some(prefix) if !rule.fits(prefix) => {
                    subject.revert().with_notice(Notice::PrefixMismatch {
                        name: subject.current.to_string(),
                        parent: subject.parent_name.to_string(),
                    })
                }
                Some(prefix) if subject.attrs.old_prefix() == Some(prefix) => Plan::keep(),
                Some(prefix) => match previous {
                    Some(previous) => subject.apply(previous),
                    None if used.contains(&prefix.slot()) => {
                        subject.revert().with_notice(Notice::PrefixConflict {
                            name: subject.current.to_string(),
                            prefix: prefix.to_string(),
                        })
                    }
                    None => Plan::keep(),
                },
                None => match previous {
                    Some(previous) if !used.contains(&previous.slot()) => subject.apply(previous),
                    _ => Plan::keep(),
                },
            }
        }
    }
}
