//! Row selection.

use std::collections::BTreeSet;

use fleet_model::ItemId;

/// How much of a visible set is selected; drives header checkbox state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectAllState {
    None,
    Partial,
    All,
}

/// Set of selected row identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<ItemId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one row. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: ItemId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Select-all toggle scoped to `visible`.
    ///
    /// When the selection already equals the visible set it is cleared,
    /// otherwise it becomes exactly the visible set.
    pub fn select_all<I>(&mut self, visible: I)
    where
        I: IntoIterator<Item = ItemId>,
    {
        let visible: BTreeSet<ItemId> = visible.into_iter().collect();
        if !visible.is_empty() && self.ids == visible {
            self.ids.clear();
        } else {
            self.ids = visible;
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn has(&self, id: ItemId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.ids.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<ItemId> {
        self.ids().collect()
    }

    /// Replace the whole selection (initial selection from navigation).
    pub fn replace<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = ItemId>,
    {
        self.ids = ids.into_iter().collect();
    }

    /// Drop ids that are no longer present. Returns how many were dropped.
    pub fn retain_present<I>(&mut self, present: I) -> usize
    where
        I: IntoIterator<Item = ItemId>,
    {
        let present: BTreeSet<ItemId> = present.into_iter().collect();
        let before = self.ids.len();
        self.ids.retain(|id| present.contains(id));
        before - self.ids.len()
    }

    pub fn state_for(&self, visible: &[ItemId]) -> SelectAllState {
        let selected = visible.iter().filter(|id| self.ids.contains(id)).count();
        if selected == 0 {
            SelectAllState::None
        } else if selected == visible.len() {
            SelectAllState::All
        } else {
            SelectAllState::Partial
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u64]) -> Vec<ItemId> {
        raw.iter().copied().map(ItemId).collect()
    }

    #[test]
    fn toggle_flips() {
        let mut selection = SelectionSet::new();
        assert!(selection.toggle(ItemId(1)));
        assert!(selection.has(ItemId(1)));
        assert!(!selection.toggle(ItemId(1)));
        assert!(selection.is_empty());
    }

    #[test]
    fn select_all_toggles_against_visible_set() {
        let mut selection = SelectionSet::new();
        selection.toggle(ItemId(1));

        selection.select_all(ids(&[1, 2, 3]));
        assert_eq!(selection.to_vec(), ids(&[1, 2, 3]));

        selection.select_all(ids(&[1, 2, 3]));
        assert!(selection.is_empty());
    }

    #[test]
    fn bucket_scoped_select_all_replaces_other_rows() {
        let mut selection = SelectionSet::new();
        selection.select_all(ids(&[1, 2]));
        selection.select_all(ids(&[3]));
        assert_eq!(selection.to_vec(), ids(&[3]));
    }

    #[test]
    fn retain_present_drops_vanished_ids() {
        let mut selection = SelectionSet::new();
        selection.replace(ids(&[1, 2, 5]));
        assert_eq!(selection.retain_present(ids(&[1, 2, 3])), 1);
        assert_eq!(selection.to_vec(), ids(&[1, 2]));
    }

    #[test]
    fn header_state() {
        let mut selection = SelectionSet::new();
        let visible = ids(&[1, 2]);
        assert_eq!(selection.state_for(&visible), SelectAllState::None);
        selection.toggle(ItemId(1));
        assert_eq!(selection.state_for(&visible), SelectAllState::Partial);
        selection.toggle(ItemId(2));
        assert_eq!(selection.state_for(&visible), SelectAllState::All);
    }
}
