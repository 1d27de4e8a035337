//! Backend contract.

mod memory;

pub use memory::MemoryApi;

use std::future::Future;

use fleet_model::{GroupId, GroupRef, InventoryItem, ItemDetail, ItemId, ItemPatch, ViewKind};

use crate::error::Result;

/// Operations the dashboard needs from the inventory server.
///
/// Futures are `Send` so calls can be driven from background refetch tasks.
pub trait InventoryApi: Send + Sync + 'static {
    /// Full collection for one view.
    fn list(&self, view: ViewKind) -> impl Future<Output = Result<Vec<InventoryItem>>> + Send;

    /// One item with its relation collections.
    fn get(&self, id: ItemId) -> impl Future<Output = Result<ItemDetail>> + Send;

    /// Apply a single-row patch. Returns the server-confirmed entity.
    fn update(
        &self,
        id: ItemId,
        patch: ItemPatch,
    ) -> impl Future<Output = Result<InventoryItem>> + Send;

    /// Move `ids` into `group` (or out of any group). Returns the updated subset.
    fn bulk_assign_group(
        &self,
        ids: Vec<ItemId>,
        group: Option<GroupId>,
    ) -> impl Future<Output = Result<Vec<InventoryItem>>> + Send;

    /// Delete `ids`. All or nothing.
    fn bulk_delete(&self, ids: Vec<ItemId>) -> impl Future<Output = Result<()>> + Send;

    /// Group catalog.
    fn list_groups(&self) -> impl Future<Output = Result<Vec<GroupRef>>> + Send;
}
