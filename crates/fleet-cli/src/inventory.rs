//! Inventory export loading.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use fleet_cache::MemoryApi;
use fleet_model::{GroupRef, InventoryItem, ViewKind};

/// Read a JSON array of inventory items.
pub fn load_inventory(path: &Path) -> Result<Vec<InventoryItem>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read inventory {}", path.display()))?;
    let items: Vec<InventoryItem> = serde_json::from_str(&content)
        .with_context(|| format!("parse inventory {}", path.display()))?;
    tracing::debug!(path = %path.display(), items = items.len(), "loaded inventory");
    Ok(items)
}

/// Distinct groups referenced by `items`, ordered by id.
pub fn group_catalog(items: &[InventoryItem]) -> Vec<GroupRef> {
    let groups: BTreeMap<&str, &GroupRef> = items
        .iter()
        .filter_map(|item| item.group.as_ref())
        .map(|group| (group.id.as_str(), group))
        .collect();
    groups.into_values().cloned().collect()
}

/// In-memory backend serving `items` as the collection of `view`.
pub fn backend(view: ViewKind, items: Vec<InventoryItem>) -> MemoryApi {
    let groups = group_catalog(&items);
    MemoryApi::new().with_groups(groups).with_items(view, items)
}
