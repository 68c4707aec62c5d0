use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Item status
///
/// Variants are declared in rank order; `rank()` is the single source of
/// truth for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// Newly inserted, not yet titled. Never persisted.
    Fresh,
    NotNeeded,
    Needed,
    Checked,
}

impl Status {
    /// Sort rank: `Fresh < NotNeeded < Needed < Checked`
    pub fn rank(self) -> u8 {
        match self {
            Status::Fresh => 0,
            Status::NotNeeded => 1,
            Status::Needed => 2,
            Status::Checked => 3,
        }
    }

    /// The character used inside the checkbox `[ ]` on disk
    pub fn checkbox_char(self) -> char {
        match self {
            Status::Checked => 'X',
            Status::Fresh | Status::NotNeeded | Status::Needed => ' ',
        }
    }

    /// Whether the item belongs in the needed-only view
    pub fn is_needed(self) -> bool {
        matches!(self, Status::Needed | Status::Checked)
    }

    /// Human-readable name used by the CLI
    pub fn label(self) -> &'static str {
        match self {
            Status::Fresh => "fresh",
            Status::NotNeeded => "not-needed",
            Status::Needed => "needed",
            Status::Checked => "checked",
        }
    }

    /// Marker shown in front of the title in listings
    pub fn glyph(self) -> &'static str {
        match self {
            Status::Fresh => "   ",
            Status::NotNeeded => " • ",
            Status::Needed => "[ ]",
            Status::Checked => "[x]",
        }
    }
}

impl PartialOrd for Status {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Status {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

/// A single checklist entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// User-visible label (trimmed)
    pub title: String,
    pub status: Status,
}

impl ChecklistItem {
    pub fn new(status: Status, title: impl Into<String>) -> Self {
        ChecklistItem {
            title: title.into(),
            status,
        }
    }

    /// A newly inserted item awaiting its title
    pub fn fresh() -> Self {
        ChecklistItem {
            title: String::new(),
            status: Status::Fresh,
        }
    }

    /// True when the title is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty()
    }
}

/// Fold text onto one line: every line break, with the whitespace around it,
/// becomes a single space and the ends are trimmed.
pub fn single_line(text: &str) -> String {
    text.split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Display order: status rank ascending, then title (case-sensitive) ascending.
///
/// Falling back to the title when ranks tie keeps the comparator a total
/// order, which `sort_by` requires.
pub fn display_order(a: &ChecklistItem, b: &ChecklistItem) -> Ordering {
    a.status
        .cmp(&b.status)
        .then_with(|| a.title.cmp(&b.title))
}
