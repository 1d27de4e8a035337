//! Inventory table views for the fleet dashboard.
//!
//! A [`Dashboard`] owns the services shared across views (settings, backend
//! client, query cache, layout store) and mounts one [`InventoryTable`] per
//! screen. Each table combines:
//!
//! - the filter, sort, group and paginate pipeline from `fleet-table`
//! - the view's persisted column layout from `fleet-persistence`
//! - pessimistic mutations reconciled into the shared cache by `fleet-cache`
//! - navigation parameters applied on mount ([`NavigationParams`])
//! - a local notes draft ([`NotesDraft`])

mod config;
mod draft;
mod error;
pub mod logging;
mod url;
mod view;

pub use config::{
    CacheSettings, DashboardConfig, MAX_PAGE_SIZE, StorageSettings, TableSettings,
};
pub use draft::NotesDraft;
pub use error::{DashboardError, Result};
pub use url::{
    ACTION_ADD, Location, NavigationParams, PARAM_ACTION, PARAM_FILTER, PARAM_OS, PARAM_SELECTED,
    PARAM_SHOW_FILTERS, UiFlags, strip_one_shot,
};
pub use view::{Dashboard, InventoryTable, RenderedBucket, RenderedRow, RenderedTable};
