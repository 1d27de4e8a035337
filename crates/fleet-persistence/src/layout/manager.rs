//! Column layout manager.
//!
//! Owns the descriptor list of one view. Every mutation rewrites the whole
//! list to the store under `<view>-column-config`.
//!
//! # Recovery
//!
//! A persisted value is discarded when it does not parse or is not a dense
//! ordering. It is also discarded when it carries a legacy column id, or when
//! its ids differ from the view's current columns (a column added or removed
//! since it was saved). Defaults are substituted and written back
//! immediately. Partial migration is never attempted, so a user's
//! customisation is lost when the schema changes.

use std::collections::HashSet;
use std::sync::Arc;

use fleet_model::{ColumnDescriptor, ViewKind, is_dense_order, visible_columns};

use super::defaults::{CURRENT_LAYOUT_VERSION, LayoutSchema};
use crate::error::{Result, StoreError};
use crate::store::KeyValueStore;

/// Where the current descriptor list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutOrigin {
    /// Nothing persisted; hard-coded defaults.
    Defaults,
    /// Loaded from the store as-is.
    Restored,
    /// Persisted value was unreadable; replaced by defaults.
    RecoveredCorrupt,
    /// Persisted value used legacy ids; replaced by defaults.
    MigratedLegacy,
}

pub struct ColumnLayoutManager {
    schema: LayoutSchema,
    key: String,
    store: Arc<dyn KeyValueStore>,
    columns: Vec<ColumnDescriptor>,
    origin: LayoutOrigin,
}

impl std::fmt::Debug for ColumnLayoutManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnLayoutManager")
            .field("key", &self.key)
            .field("columns", &self.columns)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl ColumnLayoutManager {
    /// Read the view's layout, recovering to defaults when needed.
    ///
    /// Never fails: storage errors during load are logged and the defaults
    /// are used.
    pub fn load(view: ViewKind, store: Arc<dyn KeyValueStore>) -> Self {
        let schema = LayoutSchema::for_view(view);
        let mut manager = Self {
            schema,
            key: view.column_config_key(),
            store,
            columns: schema.defaults(),
            origin: LayoutOrigin::Defaults,
        };

        let raw = match manager.store.get(&manager.key) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %manager.key, error = %e, "could not read column layout, using defaults");
                None
            }
        };

        if let Some(raw) = raw {
            manager.restore(&raw);
        }
        manager
    }

    fn restore(&mut self, raw: &str) {
        match serde_json::from_str::<Vec<ColumnDescriptor>>(raw) {
            Ok(columns) if self.schema.detect_version(&columns) < CURRENT_LAYOUT_VERSION => {
                tracing::warn!(key = %self.key, "legacy column layout found, resetting to defaults");
                self.recover(LayoutOrigin::MigratedLegacy);
            }
            Ok(columns) if !self.schema.has_same_ids(&columns) => {
                tracing::warn!(key = %self.key, "column layout does not match the current columns, resetting to defaults");
                self.recover(LayoutOrigin::RecoveredCorrupt);
            }
            Ok(mut columns) if is_valid(&columns) => {
                columns.sort_by_key(|c| c.order);
                self.columns = columns;
                self.origin = LayoutOrigin::Restored;
                tracing::debug!(key = %self.key, "restored column layout");
            }
            Ok(_) => {
                tracing::warn!(key = %self.key, "inconsistent column layout, resetting to defaults");
                self.recover(LayoutOrigin::RecoveredCorrupt);
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "unparsable column layout, resetting to defaults");
                self.recover(LayoutOrigin::RecoveredCorrupt);
            }
        }
    }

    fn recover(&mut self, origin: LayoutOrigin) {
        self.columns = self.schema.defaults();
        self.origin = origin;
        if let Err(e) = self.store.remove(&self.key) {
            tracing::warn!(key = %self.key, error = %e, "could not clear column layout");
        }
        if let Err(e) = self.persist() {
            tracing::warn!(key = %self.key, error = %e, "could not write default column layout");
        }
    }

    pub fn view(&self) -> ViewKind {
        self.schema.view
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    pub fn origin(&self) -> LayoutOrigin {
        self.origin
    }

    /// All descriptors, ordered by `order`.
    pub fn get(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Visible descriptors in render order.
    pub fn visible(&self) -> Vec<&ColumnDescriptor> {
        visible_columns(&self.columns)
    }

    /// Flip one column's visibility. Returns `false` for an unknown id.
    pub fn toggle_visibility(&mut self, id: &str) -> Result<bool> {
        let Some(column) = self.columns.iter_mut().find(|c| c.id == id) else {
            tracing::debug!(key = %self.key, id, "toggle of unknown column ignored");
            return Ok(false);
        };
        column.visible = !column.visible;
        self.persist()?;
        Ok(true)
    }

    /// Move the column at `from` to `to` and renumber every `order`.
    ///
    /// `to` is clamped to the last position. Returns `false` when `from` is
    /// out of range.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<bool> {
        if from >= self.columns.len() {
            return Ok(false);
        }
        let to = to.min(self.columns.len() - 1);
        let column = self.columns.remove(from);
        self.columns.insert(to, column);
        for (order, column) in self.columns.iter_mut().enumerate() {
            column.order = order;
        }
        self.persist()?;
        Ok(true)
    }

    /// Restore the hard-coded defaults.
    pub fn reset(&mut self) -> Result<()> {
        self.columns = self.schema.defaults();
        self.origin = LayoutOrigin::Defaults;
        tracing::info!(key = %self.key, "column layout reset");
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string(&self.columns)
            .map_err(|source| StoreError::Serialization { source })?;
        self.store.set(&self.key, &json)
    }
}

fn is_valid(columns: &[ColumnDescriptor]) -> bool {
    let mut ids = HashSet::new();
    !columns.is_empty() && is_dense_order(columns) && columns.iter().all(|c| ids.insert(&c.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeyValueStore, MemoryStore};

    fn manager(store: &Arc<MemoryStore>) -> ColumnLayoutManager {
        ColumnLayoutManager::load(ViewKind::Hosts, store.clone())
    }

    #[test]
    fn absent_layout_uses_defaults_without_writing() {
        let store = Arc::new(MemoryStore::new());
        let layout = manager(&store);
        assert_eq!(layout.origin(), LayoutOrigin::Defaults);
        assert_eq!(layout.get(), LayoutSchema::for_view(ViewKind::Hosts).defaults());
        assert_eq!(store.get("hosts-column-config").unwrap(), None);
    }

    #[test]
    fn reorder_renumbers_densely() {
        let store = Arc::new(MemoryStore::new());
        let mut layout = manager(&store);
        let moved = layout.get()[0].id.clone();

        assert!(layout.reorder(0, 2).unwrap());
        assert_eq!(layout.get()[2].id, moved);
        for (index, column) in layout.get().iter().enumerate() {
            assert_eq!(column.order, index);
        }
        assert!(store.get("hosts-column-config").unwrap().is_some());
    }

    #[test]
    fn reorder_out_of_range_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let mut layout = manager(&store);
        let before = layout.get().to_vec();
        assert!(!layout.reorder(99, 0).unwrap());
        assert_eq!(layout.get(), before);
    }

    #[test]
    fn duplicate_ids_are_corrupt() {
        let payload = r#"[{"id":"name","label":"Name","visible":true,"order":0},
                          {"id":"name","label":"Name","visible":true,"order":1}]"#;
        let store = Arc::new(MemoryStore::new().with_value("hosts-column-config", payload));
        let layout = manager(&store);
        assert_eq!(layout.origin(), LayoutOrigin::RecoveredCorrupt);
    }

    #[test]
    fn layout_from_an_older_column_set_is_reset() {
        let mut columns = LayoutSchema::for_view(ViewKind::Hosts).defaults();
        let security = columns.iter().position(|c| c.id == "security").unwrap();
        columns[security].id = "bogus".to_string();
        let store = Arc::new(
            MemoryStore::new()
                .with_value("hosts-column-config", serde_json::to_string(&columns).unwrap()),
        );

        let layout = manager(&store);
        assert_eq!(layout.origin(), LayoutOrigin::RecoveredCorrupt);
        assert!(layout.get().iter().any(|c| c.id == "security"));
        assert!(layout.get().iter().all(|c| c.id != "bogus"));
    }

    #[test]
    fn layout_missing_a_column_is_reset() {
        let mut columns = LayoutSchema::for_view(ViewKind::Hosts).defaults();
        columns.pop();
        let store = Arc::new(
            MemoryStore::new()
                .with_value("hosts-column-config", serde_json::to_string(&columns).unwrap()),
        );
        let layout = manager(&store);
        assert_eq!(layout.origin(), LayoutOrigin::RecoveredCorrupt);
        assert_eq!(layout.get(), LayoutSchema::for_view(ViewKind::Hosts).defaults());
    }

    #[test]
    fn toggle_unknown_column() {
        let store = Arc::new(MemoryStore::new());
        let mut layout = manager(&store);
        assert!(!layout.toggle_visibility("nope").unwrap());
        assert_eq!(store.get("hosts-column-config").unwrap(), None);
    }
}
