//! Share Selection
//!
//! Set of item ids the user marked for sharing. Pure set semantics, no side
//! effects; the transfer simulator clears a shared selection on completion.

use crate::item::ShareableItem;
use std::collections::HashSet;

/// Item ids marked for sharing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: HashSet<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the id if absent, remove it if present
    ///
    /// Returns whether the id is selected afterwards.
    ///
    /// # Examples
    ///
    /// ```
    /// use nearshare_core::SelectionState;
    ///
    /// let mut selection = SelectionState::new();
    /// assert!(selection.toggle("a"));
    /// assert!(!selection.toggle("a"));
    /// assert!(selection.is_empty());
    /// ```
    pub fn toggle(&mut self, item_id: &str) -> bool {
        if self.selected.remove(item_id) {
            false
        } else {
            self.selected.insert(item_id.to_string());
            true
        }
    }

    /// Select an id; returns false if it was already selected
    pub fn select(&mut self, item_id: &str) -> bool {
        self.selected.insert(item_id.to_string())
    }

    /// Deselect an id; returns false if it was not selected
    pub fn deselect(&mut self, item_id: &str) -> bool {
        self.selected.remove(item_id)
    }

    pub fn is_selected(&self, item_id: &str) -> bool {
        self.selected.contains(item_id)
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected ids in no particular order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    /// Selected items, in the order of `items`
    pub fn payload(&self, items: &[ShareableItem]) -> Vec<ShareableItem> {
        items
            .iter()
            .filter(|item| self.is_selected(&item.id))
            .cloned()
            .collect()
    }
}
