//! Durable key-value storage for per-view state.
//!
//! Values are opaque strings; the layout manager decides what they mean, so a
//! corrupted value can be stored and read back like any other.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;

/// A durable string store keyed by name.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}
