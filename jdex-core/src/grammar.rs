use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Checked in this order: area and id before the plainer category pattern.
static AREA_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2})-([0-9]{2}) ").expect("valid area pattern"));
static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2})\.([0-9]{2}) ").expect("valid id pattern"));
static CATEGORY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2}) ").expect("valid category pattern"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrammarError {
    #[error("cannot strip prefixes from an empty path")]
    EmptyPath,
}

/// Numbering level of a name: area (0), category (1) or id (2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Area,
    Category,
    Id,
}

impl Level {
    pub fn depth(self) -> u8 {
        match self {
            Level::Area => 0,
            Level::Category => 1,
            Level::Id => 2,
        }
    }
}

/// A decade band such as `10-19`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Band {
    pub start: u8,
    pub end: u8,
}

impl Band {
    pub fn new(start: u8, end: u8) -> Self {
        Self { start, end }
    }

    /// Leading tens digit inherited by categories inside this band.
    pub fn head(&self) -> u8 {
        self.start / 10 * 10
    }

    pub fn overlaps(&self, other: &Band) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prefix {
    Area(Band),
    Category(u8),
    Id { category: u8, item: u8 },
}

impl Prefix {
    pub fn level(&self) -> Level {
        match self {
            Prefix::Area(_) => Level::Area,
            Prefix::Category(_) => Level::Category,
            Prefix::Id { .. } => Level::Id,
        }
    }

    /// Number after the last `.`, the key used when comparing sibling slots.
    pub fn slot(&self) -> u8 {
        match self {
            Prefix::Area(band) => band.start,
            Prefix::Category(number) => *number,
            Prefix::Id { item, .. } => *item,
        }
    }

    /// Renders `<prefix> <plain>`.
    pub fn apply(&self, plain: &str) -> String {
        format!("{self} {plain}")
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::Area(band) => band.fmt(f),
            Prefix::Category(number) => write!(f, "{number:02}"),
            Prefix::Id { category, item } => write!(f, "{category:02}.{item:02}"),
        }
    }
}

/// Parsed prefix plus the byte offset where the prefix text ends.
fn match_prefix(name: &str) -> Option<(Prefix, usize)> {
    if let Some(caps) = AREA_PATTERN.captures(name) {
        let band = Band::new(caps[1].parse().ok()?, caps[2].parse().ok()?);
        return Some((Prefix::Area(band), caps.get(0)?.end() - 1));
    }
    if let Some(caps) = ID_PATTERN.captures(name) {
        let prefix = Prefix::Id {
            category: caps[1].parse().ok()?,
            item: caps[2].parse().ok()?,
        };
        return Some((prefix, caps.get(0)?.end() - 1));
    }
    if let Some(caps) = CATEGORY_PATTERN.captures(name) {
        let prefix = Prefix::Category(caps[1].parse().ok()?);
        return Some((prefix, caps.get(0)?.end() - 1));
    }
    None
}

/// Splits a name into its prefix and plain part.
pub fn parse_prefix(name: &str) -> Option<(Prefix, &str)> {
    let (prefix, end) = match_prefix(name)?;
    Some((prefix, &name[end + 1..]))
}

pub fn classify_level(name: &str) -> Option<Level> {
    match_prefix(name).map(|(prefix, _)| prefix.level())
}

/// Numeric form of [`classify_level`]: `0`, `1`, `2`, or `-1` when unprefixed.
pub fn level_code(name: &str) -> i8 {
    classify_level(name).map_or(-1, |level| level.depth() as i8)
}

pub fn has_prefix(name: &str) -> bool {
    match_prefix(name).is_some()
}

/// Prefix text without the separating space, or `""`.
pub fn extract_prefix(name: &str) -> &str {
    match match_prefix(name) {
        Some((_, end)) => &name[..end],
        None => "",
    }
}

pub fn plain_name(name: &str) -> &str {
    match match_prefix(name) {
        Some((_, end)) => &name[end + 1..],
        None => name,
    }
}

/// Strips the prefix from every `/`-separated segment of `path`.
pub fn strip_prefix_from_path(path: &str) -> Result<String, GrammarError> {
    if path.is_empty() {
        return Err(GrammarError::EmptyPath);
    }
    Ok(path.split('/').map(plain_name).collect::<Vec<_>>().join("/"))
}
