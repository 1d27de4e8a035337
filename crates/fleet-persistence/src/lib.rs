//! Durable view state for the fleet dashboard.
//!
//! The only state persisted by the table engine is the column layout of each
//! view, stored as a JSON array of column descriptors under
//! `<view>-column-config`.
//!
//! # Architecture
//!
//! - `store/` - Key-value stores (directory of JSON files, in-memory)
//! - `layout/` - Column layout manager, default column sets, legacy detection
//! - `error.rs` - Error types with user-friendly messages

mod error;
mod layout;
mod store;

pub use error::{Result, StoreError};
pub use layout::{CURRENT_LAYOUT_VERSION, ColumnLayoutManager, LayoutOrigin, LayoutSchema};
pub use store::{FileStore, KeyValueStore, MemoryStore};
