//! One-shot table rendering of an inventory export.

use std::sync::Arc;

use anyhow::Result;
use fleet_dashboard::{Dashboard, DashboardConfig, RenderedTable};
use fleet_model::{Field, InventoryItem, ViewKind};
use fleet_persistence::KeyValueStore;
use fleet_table::{DerivedFilter, GroupDimension, SortState};

use crate::inventory;

/// Table state requested on the command line.
#[derive(Debug, Clone)]
pub struct TableRequest {
    pub view: ViewKind,
    /// Dashboard location applied before the explicit options.
    pub location: Option<String>,
    pub search: Option<String>,
    pub filter: Option<DerivedFilter>,
    pub fields: Vec<(Field, String)>,
    pub sort: Option<SortState>,
    pub group: Option<GroupDimension>,
    /// Zero-based page.
    pub page: usize,
}

impl TableRequest {
    pub fn new(view: ViewKind) -> Self {
        Self {
            view,
            location: None,
            search: None,
            filter: None,
            fields: Vec::new(),
            sort: None,
            group: None,
            page: 0,
        }
    }
}

/// Mount a table over `items` and render the requested page.
pub async fn render_inventory(
    config: DashboardConfig,
    store: Arc<dyn KeyValueStore>,
    items: Vec<InventoryItem>,
    request: &TableRequest,
) -> Result<RenderedTable> {
    let api = Arc::new(inventory::backend(request.view, items));
    let dashboard = Dashboard::new(config, api, store);

    let location = request
        .location
        .clone()
        .unwrap_or_else(|| format!("/{}", request.view.as_str()));
    let mut table = dashboard.mount(request.view, &location);
    let rows = table.load().await?;
    tracing::debug!(view = %request.view, rows, "inventory mounted");

    if let Some(term) = &request.search {
        table.set_search(term.as_str());
    }
    if let Some(filter) = request.filter {
        table.set_derived_filter(Some(filter));
    }
    for (field, value) in &request.fields {
        table.set_field_filter(field.clone(), value.as_str());
    }
    if let Some(group) = request.group {
        table.set_grouping(group);
    }
    table.set_sort(request.sort.clone());
    table.set_page(request.page);

    let rendered = table.render();
    table.teardown();
    Ok(rendered)
}
