//! Local notes draft.

use fleet_model::{InventoryItem, ItemId, ItemPatch};

/// Editable copy of one item's notes.
///
/// The draft diverges from the cached item while the user types. It is
/// committed with [`start_save`](Self::start_save), and the cache only sees
/// the new text once the save mutation succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesDraft {
    item: ItemId,
    /// Last server-confirmed text.
    saved: String,
    text: String,
    saving: bool,
}

impl NotesDraft {
    pub fn open(item: &InventoryItem) -> Self {
        let saved = item.notes.clone().unwrap_or_default();
        Self {
            item: item.id,
            text: saved.clone(),
            saved,
            saving: false,
        }
    }

    pub fn item(&self) -> ItemId {
        self.item
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.text != self.saved
    }

    #[inline]
    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn edit(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Patch for the save mutation, or `None` when there is nothing to save
    /// or a save is already running.
    pub fn start_save(&mut self) -> Option<ItemPatch> {
        if self.saving || !self.is_dirty() {
            return None;
        }
        self.saving = true;
        Some(ItemPatch::set_notes(self.text.clone()))
    }

    /// Save confirmed with the server's copy of the item.
    ///
    /// Typing that happened while the save was in flight stays in the draft.
    pub fn save_complete(&mut self, confirmed: &InventoryItem) {
        self.saving = false;
        self.saved = confirmed.notes.clone().unwrap_or_default();
    }

    /// Save failed; the draft keeps its text and stays dirty.
    pub fn save_failed(&mut self) {
        self.saving = false;
    }

    /// Drop local edits.
    pub fn discard(&mut self) {
        self.text = self.saved.clone();
    }

    /// Follow a newer server copy unless the user has unsaved edits.
    pub fn rebase(&mut self, item: &InventoryItem) {
        if item.id != self.item || self.is_dirty() || self.saving {
            return;
        }
        self.saved = item.notes.clone().unwrap_or_default();
        self.text = self.saved.clone();
    }
}
