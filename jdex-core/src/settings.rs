use serde::{Deserialize, Serialize};

/// Numbering toggles, read once per mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Master switch for the modified scheme; the two options below only
    /// apply while it is on.
    pub diverge_from_standard: bool,
    /// Two directory levels: leaves are numbered directly under categories.
    pub flattened_structure: bool,
    /// Folders inside a category may take the `XX.01`-`XX.10` ids.
    pub folders_in_first_ten: bool,
    /// Back-fill free ids inside a category instead of appending.
    pub fill_item_gaps: bool,
}

impl Settings {
    pub fn flattened(&self) -> bool {
        self.diverge_from_standard && self.flattened_structure
    }

    pub fn first_ten(&self) -> bool {
        self.flattened() && self.folders_in_first_ten
    }
}
