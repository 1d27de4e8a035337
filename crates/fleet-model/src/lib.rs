//! Data model for the fleet dashboard inventory tables.
//!
//! Hosts, repositories and packages share one row shape, [`InventoryItem`],
//! whose display fields are all nullable. The table engine, the column layout
//! store and the query cache all speak these types.

pub mod column;
pub mod error;
pub mod field;
pub mod ids;
pub mod item;
pub mod patch;

pub use column::{ColumnDescriptor, is_dense_order, visible_columns};
pub use error::{ModelError, Result};
pub use field::{Field, ViewKind};
pub use ids::{GroupId, ItemId};
pub use item::{
    COUNTER_OUTDATED, COUNTER_SECURITY, GroupRef, HostSummary, InventoryItem, ItemDetail,
    UpdateRecord,
};
pub use patch::ItemPatch;
