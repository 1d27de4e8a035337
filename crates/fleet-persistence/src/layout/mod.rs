//! Per-view column layouts.

mod defaults;
mod manager;

pub use defaults::{CURRENT_LAYOUT_VERSION, LayoutSchema};
pub use manager::{ColumnLayoutManager, LayoutOrigin};
