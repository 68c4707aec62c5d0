use crate::model::checklist::{Checklist, FilterMode};
use crate::model::item::{ChecklistItem, display_order};

/// Store indices of the items visible under `mode`, in display order.
///
/// The sort is stable, so items with identical status and title keep their
/// store order.
pub fn project(items: &[ChecklistItem], mode: FilterMode) -> Vec<usize> {
    let mut order: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| match mode {
            FilterMode::All => true,
            FilterMode::NeededOnly => item.status.is_needed(),
        })
        .map(|(i, _)| i)
        .collect();
    order.sort_by(|&a, &b| display_order(&items[a], &items[b]));
    order
}

/// Sorted, optionally filtered projection over a [`Checklist`].
///
/// Holds only the filter mode and a cached order keyed by the checklist
/// revision it was computed from. Reads recompute when the revision moved.
#[derive(Debug, Clone, Default)]
pub struct SortedFilteredView {
    mode: FilterMode,
    cache: Option<(u64, Vec<usize>)>,
}

impl SortedFilteredView {
    pub fn new(mode: FilterMode) -> Self {
        SortedFilteredView { mode, cache: None }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: FilterMode) {
        if self.mode != mode {
            self.mode = mode;
            self.invalidate();
        }
    }

    /// Drop the cached order; the next read recomputes
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Store indices in display order
    pub fn rows(&mut self, checklist: &Checklist) -> &[usize] {
        let stale = !matches!(&self.cache, Some((rev, _)) if *rev == checklist.revision());
        if stale {
            self.cache = Some((checklist.revision(), project(checklist.items(), self.mode)));
        }
        match &self.cache {
            Some((_, order)) => order,
            None => &[],
        }
    }

    pub fn len(&mut self, checklist: &Checklist) -> usize {
        self.rows(checklist).len()
    }

    /// Store index behind a display row
    pub fn item_index(&mut self, checklist: &Checklist, row: usize) -> Option<usize> {
        self.rows(checklist).get(row).copied()
    }

    /// Display row of a store index, if visible
    pub fn row_of(&mut self, checklist: &Checklist, index: usize) -> Option<usize> {
        self.rows(checklist).iter().position(|&i| i == index)
    }
}
