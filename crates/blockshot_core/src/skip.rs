use std::collections::BTreeSet;

/// Lower-cased class names whose elements (and their subtrees) are never
/// extracted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipClassSet {
    classes: BTreeSet<String>,
}

impl SkipClassSet {
    /// Parse a comma-separated list. Entries are trimmed and lower-cased;
    /// blanks are dropped.
    pub fn parse(csv: &str) -> Self {
        let classes = csv
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_lowercase)
            .collect();
        Self { classes }
    }

    pub fn contains(&self, class: &str) -> bool {
        if self.classes.is_empty() {
            return false;
        }
        self.classes.contains(&class.to_lowercase())
    }

    /// True when any whitespace-separated token of a `class` attribute value
    /// is in the set.
    pub fn matches_attr(&self, class_attr: &str) -> bool {
        class_attr
            .split_ascii_whitespace()
            .any(|class| self.contains(class))
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }
}
