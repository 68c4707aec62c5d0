use serde::{Deserialize, Serialize};

use crate::model::item::{ChecklistItem, Status, display_order, single_line};

/// Which items the presentation is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMode {
    /// Every item
    #[default]
    All,
    /// Only `Needed` and `Checked` items
    NeededOnly,
}

impl FilterMode {
    pub fn label(self) -> &'static str {
        match self {
            FilterMode::All => "all",
            FilterMode::NeededOnly => "needed",
        }
    }

    pub fn other(self) -> Self {
        match self {
            FilterMode::All => FilterMode::NeededOnly,
            FilterMode::NeededOnly => FilterMode::All,
        }
    }
}

/// How a cleanup pass treats statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupMode {
    /// Promote `Fresh` items to `Needed`
    Normalize,
    /// Demote `Checked` items to `NotNeeded` (start a new round)
    Checkout,
}

/// Error type for checklist mutations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChecklistError {
    #[error("item index out of range: {0}")]
    IndexOutOfRange(usize),
}

/// The in-memory list bound to one database file
#[derive(Debug, Clone, Default)]
pub struct Checklist {
    items: Vec<ChecklistItem>,
    /// Unsaved mutations exist
    dirty: bool,
    /// Bumped on every mutation
    revision: u64,
}

impl Checklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a clean (not dirty) checklist from parsed entries, in file order
    pub fn from_entries(entries: Vec<(Status, String)>) -> Self {
        Checklist {
            items: entries
                .into_iter()
                .map(|(status, title)| ChecklistItem::new(status, title))
                .collect(),
            dirty: false,
            revision: 0,
        }
    }

    pub fn items(&self) -> &[ChecklistItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&ChecklistItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn mark_saved(&mut self) {
        self.dirty = false;
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }

    /// Append an item (used by the CLI and tests)
    pub fn push(&mut self, item: ChecklistItem) {
        self.items.push(item);
        self.touch();
    }

    /// Advance an item's status along the cycle for the active filter.
    ///
    /// Under `NeededOnly` a checked item goes back to `Needed`, so a single
    /// toggle never hides the item being toggled.
    pub fn toggle(&mut self, index: usize, mode: FilterMode) -> Result<Status, ChecklistError> {
        let item = self
            .items
            .get_mut(index)
            .ok_or(ChecklistError::IndexOutOfRange(index))?;
        item.status = match (item.status, mode) {
            (Status::Fresh | Status::NotNeeded, _) => Status::Needed,
            (Status::Needed, _) => Status::Checked,
            (Status::Checked, FilterMode::NeededOnly) => Status::Needed,
            (Status::Checked, FilterMode::All) => Status::NotNeeded,
        };
        let status = item.status;
        self.touch();
        Ok(status)
    }

    /// Replace an item's title. Surrounding whitespace is dropped and line
    /// breaks become spaces; an empty title marks the item for removal by the
    /// next cleanup.
    pub fn set_title(&mut self, index: usize, text: &str) -> Result<(), ChecklistError> {
        let item = self
            .items
            .get_mut(index)
            .ok_or(ChecklistError::IndexOutOfRange(index))?;
        let title = single_line(text);
        if item.title == title {
            return Ok(());
        }
        item.title = title;
        self.touch();
        Ok(())
    }

    /// Insert a fresh, untitled item at the front and return its index.
    pub fn insert_new(&mut self) -> usize {
        self.items.insert(0, ChecklistItem::fresh());
        self.touch();
        0
    }

    /// Single normalization pass. Returns true if anything changed.
    ///
    /// Blank items are always removed. A second pass with no intervening
    /// mutation changes nothing.
    pub fn cleanup(&mut self, mode: CleanupMode) -> bool {
        let before = self.items.len();
        self.items.retain(|item| !item.is_blank());
        let mut changed = self.items.len() != before;

        for item in &mut self.items {
            let next = match (mode, item.status) {
                (CleanupMode::Normalize, Status::Fresh) => Status::Needed,
                (CleanupMode::Checkout, Status::Checked) => Status::NotNeeded,
                (_, status) => status,
            };
            if next != item.status {
                item.status = next;
                changed = true;
            }
        }

        if changed {
            self.touch();
        }
        changed
    }

    /// True iff at least one item is something other than `NotNeeded`
    pub fn needs_attention(&self) -> bool {
        self.items.iter().any(|i| i.status != Status::NotNeeded)
    }

    /// Items in canonical order (status, then title). This is the order
    /// written to disk.
    pub fn sorted_items(&self) -> Vec<ChecklistItem> {
        let mut sorted = self.items.clone();
        sorted.sort_by(display_order);
        sorted
    }
}
