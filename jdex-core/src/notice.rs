use std::fmt;

/// Advisory message for the user. Delivery is best-effort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// No category slot left in an area band.
    AreaFull { area: String },
    /// No id slot left in a category.
    CategoryFull { category: String },
    /// All ten low ids of a category are taken.
    FirstTenFull { category: String },
    /// A manually assigned prefix collides with a sibling.
    PrefixConflict { name: String, prefix: String },
    /// A manually edited prefix does not belong under its parent.
    PrefixMismatch { name: String, parent: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::AreaFull { area } => {
                write!(f, "There is no more space for additional categories in \"{area}\"")
            }
            Notice::CategoryFull { category } => {
                write!(f, "There is no more space for additional ids in \"{category}\"")
            }
            Notice::FirstTenFull { category } => write!(
                f,
                "All ten sub-category slots in \"{category}\" are already used"
            ),
            Notice::PrefixConflict { name, prefix } => write!(
                f,
                "Prefix {prefix} is already used by a sibling; \"{name}\" was not renumbered"
            ),
            Notice::PrefixMismatch { name, parent } => write!(
                f,
                "\"{name}\" does not match the numbering of \"{parent}\"; the previous name was restored"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_container() {
        let notice = Notice::AreaFull {
            area: "10-19 Life admin".into(),
        };
        assert!(notice.to_string().contains("10-19 Life admin"));
    }
}
