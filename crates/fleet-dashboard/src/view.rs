//! Inventory table view.
//!
//! [`InventoryTable`] is the glue between the engines: the cached collection
//! flows through the [`TableQuery`] pipeline, rows are projected onto the
//! visible columns of the view's layout, and mutations go through the
//! reconciler bound to the table's [`ViewScope`].

use std::sync::Arc;

use fleet_cache::{
    Collection, InventoryApi, Mutation, MutationState, QueryCache, Reconciler, ViewScope,
};
use fleet_model::{
    ColumnDescriptor, Field, GroupId, GroupRef, InventoryItem, ItemDetail, ItemId, ItemPatch,
    ViewKind,
};
use fleet_persistence::{ColumnLayoutManager, FileStore, KeyValueStore};
use fleet_table::{
    DerivedFilter, GroupDimension, Page, Pagination, SelectAllState, SelectionSet, SortState,
    TableQuery, cell_text,
};

use crate::config::DashboardConfig;
use crate::draft::NotesDraft;
use crate::error::{DashboardError, Result};
use crate::url::{Location, NavigationParams, UiFlags, strip_one_shot};

// =============================================================================
// DASHBOARD
// =============================================================================

/// Services shared by every mounted table.
pub struct Dashboard<A> {
    config: DashboardConfig,
    api: Arc<A>,
    cache: QueryCache,
    store: Arc<dyn KeyValueStore>,
}

impl<A: InventoryApi> Dashboard<A> {
    pub fn new(config: DashboardConfig, api: Arc<A>, store: Arc<dyn KeyValueStore>) -> Self {
        let cache = QueryCache::new(config.cache_config());
        Self {
            config,
            api,
            cache,
            store,
        }
    }

    /// Layouts under the configured layout directory.
    pub fn with_file_store(config: DashboardConfig, api: Arc<A>) -> Self {
        let store = Arc::new(FileStore::new(config.layout_dir()));
        Self::new(config, api, store)
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Mount a table for `view` at `location`.
    ///
    /// Navigation parameters are applied once and one-shot parameters are
    /// stripped from [`InventoryTable::location`].
    pub fn mount(&self, view: ViewKind, location: &str) -> InventoryTable<A> {
        let mut location = Location::parse(location);
        let params = NavigationParams::from_location(&location);

        let mut query = TableQuery {
            pagination: Pagination::with_page_size(self.config.table.page_size),
            ..TableQuery::default()
        };
        let mut selection = SelectionSet::new();
        let mut ui = UiFlags::default();
        params.apply(&mut query.criteria, &mut selection, &mut ui);
        if strip_one_shot(&mut location) {
            tracing::debug!(%location, "stripped one-shot navigation parameters");
        }

        let scope = ViewScope::new();
        tracing::debug!(%view, "mounting table");
        InventoryTable {
            view,
            reconciler: Reconciler::new(
                Arc::clone(&self.api),
                self.cache.clone(),
                view,
                scope.clone(),
            ),
            layout: ColumnLayoutManager::load(view, Arc::clone(&self.store)),
            query,
            selection,
            ui,
            location,
            notes: None,
            item_mutation: Mutation::new(),
            assign_mutation: Mutation::new(),
            delete_mutation: Mutation::new(),
            scope,
        }
    }
}

// =============================================================================
// RENDERED OUTPUT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    pub id: ItemId,
    pub selected: bool,
    /// One entry per visible column.
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBucket {
    /// Argument of [`InventoryTable::toggle_select_bucket`].
    pub key: String,
    pub label: String,
    /// Rows in the whole bucket, across pages.
    pub total: usize,
    pub select_state: SelectAllState,
    pub rows: Vec<RenderedRow>,
}

/// Owned snapshot of what the table shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTable {
    pub columns: Vec<ColumnDescriptor>,
    /// Rows are bucketed by a grouping dimension.
    pub grouped: bool,
    pub buckets: Vec<RenderedBucket>,
    pub select_state: SelectAllState,
    pub page: usize,
    pub page_count: usize,
    pub total_rows: usize,
}

impl RenderedTable {
    pub fn rows(&self) -> impl Iterator<Item = &RenderedRow> {
        self.buckets.iter().flat_map(|bucket| bucket.rows.iter())
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.rows().map(|row| row.id).collect()
    }
}

// =============================================================================
// TABLE
// =============================================================================

/// One mounted inventory table.
pub struct InventoryTable<A> {
    view: ViewKind,
    reconciler: Reconciler<A>,
    layout: ColumnLayoutManager,
    query: TableQuery,
    selection: SelectionSet,
    ui: UiFlags,
    location: Location,
    notes: Option<NotesDraft>,
    item_mutation: Mutation<InventoryItem>,
    assign_mutation: Mutation<Vec<InventoryItem>>,
    delete_mutation: Mutation<Vec<ItemId>>,
    scope: ViewScope,
}

impl<A> std::fmt::Debug for InventoryTable<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryTable")
            .field("view", &self.view)
            .field("query", &self.query)
            .field("selection", &self.selection)
            .field("ui", &self.ui)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl<A> Drop for InventoryTable<A> {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

impl<A: InventoryApi> InventoryTable<A> {
    pub fn view(&self) -> ViewKind {
        self.view
    }

    /// Location after one-shot parameters were stripped.
    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn query(&self) -> &TableQuery {
        &self.query
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn ui(&self) -> UiFlags {
        self.ui
    }

    pub fn layout(&self) -> &ColumnLayoutManager {
        &self.layout
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    /// Cancel the scope. Mutations still in flight finish on the server but
    /// their results are dropped.
    pub fn teardown(self) {
        tracing::debug!(view = %self.view, "tearing down table");
    }

    // -------------------------------------------------------------------------
    // Data
    // -------------------------------------------------------------------------

    /// Fetch (or revalidate) the collection and drop selected ids that are
    /// gone. Returns the collection size.
    pub async fn load(&mut self) -> Result<usize> {
        let collection = self.reconciler.collection().await?;
        let dropped = self
            .selection
            .retain_present(collection.iter().map(|item| item.id));
        if dropped > 0 {
            tracing::debug!(view = %self.view, dropped, "deselected rows no longer present");
        }
        if let Some(draft) = &mut self.notes
            && let Some(item) = collection.iter().find(|item| item.id == draft.item())
        {
            draft.rebase(item);
        }
        Ok(collection.len())
    }

    /// Last known collection, without contacting the backend.
    pub fn collection(&self) -> Option<Collection> {
        self.reconciler.cache().collection(self.view)
    }

    pub async fn groups(&self) -> Result<Arc<Vec<GroupRef>>> {
        let api = self.reconciler.api();
        Ok(self.reconciler.cache().fetch_groups(api).await?)
    }

    pub async fn detail(&self, id: ItemId) -> Result<Arc<ItemDetail>> {
        let api = self.reconciler.api();
        Ok(self.reconciler.cache().fetch_detail(api, id).await?)
    }

    fn with_page<R>(&self, f: impl FnOnce(&Page<'_>) -> R) -> R {
        let collection = self.collection();
        let rows = collection.as_deref().map_or(&[][..], Vec::as_slice);
        let page = self.query.apply(rows.iter().map(Arc::as_ref));
        f(&page)
    }

    pub fn render(&self) -> RenderedTable {
        let columns: Vec<ColumnDescriptor> = self.layout.visible().into_iter().cloned().collect();
        self.with_page(|page| {
            let buckets = page
                .buckets
                .iter()
                .map(|bucket| RenderedBucket {
                    key: bucket.key.clone(),
                    label: bucket.label.clone(),
                    total: bucket.total,
                    select_state: self.selection.state_for(&bucket.ids()),
                    rows: bucket
                        .items
                        .iter()
                        .map(|item| RenderedRow {
                            id: item.id,
                            selected: self.selection.has(item.id),
                            cells: columns.iter().map(|c| cell_text(item, &c.id)).collect(),
                        })
                        .collect(),
                })
                .collect();
            RenderedTable {
                select_state: self.selection.state_for(&page.visible_ids()),
                columns: columns.clone(),
                grouped: self.query.grouping.is_active(),
                buckets,
                page: page.page,
                page_count: page.page_count,
                total_rows: page.total_rows,
            }
        })
    }

    // -------------------------------------------------------------------------
    // Query
    // -------------------------------------------------------------------------

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.query.criteria.search_term = term.into();
        self.query.pagination.page = 0;
    }

    /// Filter `field` by `value`; [`fleet_table::ALL`] clears it.
    pub fn set_field_filter(&mut self, field: Field, value: impl Into<String>) {
        self.query.criteria.set_field(field, value);
        self.query.pagination.page = 0;
    }

    pub fn set_derived_filter(&mut self, derived: Option<DerivedFilter>) {
        self.query.criteria.derived = derived;
        self.query.pagination.page = 0;
    }

    pub fn clear_filters(&mut self) {
        self.query.criteria.clear();
        self.query.pagination.page = 0;
    }

    /// Header click: a new field sorts ascending, the same field flips.
    pub fn toggle_sort(&mut self, field: Field) {
        match &mut self.query.sort {
            Some(state) => state.toggle(field),
            None => self.query.sort = Some(SortState::asc(field)),
        }
    }

    pub fn set_sort(&mut self, sort: Option<SortState>) {
        self.query.sort = sort;
    }

    pub fn clear_sort(&mut self) {
        self.query.sort = None;
    }

    pub fn set_grouping(&mut self, dimension: GroupDimension) {
        self.query.grouping = dimension;
        self.query.pagination.page = 0;
    }

    pub fn set_page(&mut self, page: usize) {
        self.query.pagination.page = page;
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.query.pagination = Pagination::with_page_size(page_size);
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    pub fn toggle_row(&mut self, id: ItemId) -> bool {
        self.selection.toggle(id)
    }

    /// Header checkbox: scoped to the rows on the current page.
    pub fn toggle_select_all(&mut self) {
        let visible = self.with_page(|page| page.visible_ids());
        self.selection.select_all(visible);
    }

    /// Bucket header checkbox, addressed by [`RenderedBucket::key`].
    /// Returns `false` if no such bucket is shown.
    pub fn toggle_select_bucket(&mut self, key: &str) -> bool {
        let ids = self.with_page(|page| {
            page.buckets
                .iter()
                .find(|bucket| bucket.key == key)
                .map(|bucket| bucket.ids())
        });
        match ids {
            Some(ids) => {
                self.selection.select_all(ids);
                true
            }
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // -------------------------------------------------------------------------
    // Columns
    // -------------------------------------------------------------------------

    pub fn toggle_column(&mut self, id: &str) -> Result<bool> {
        Ok(self.layout.toggle_visibility(id)?)
    }

    pub fn reorder_columns(&mut self, from: usize, to: usize) -> Result<bool> {
        Ok(self.layout.reorder(from, to)?)
    }

    pub fn reset_columns(&mut self) -> Result<()> {
        Ok(self.layout.reset()?)
    }

    // -------------------------------------------------------------------------
    // UI flags
    // -------------------------------------------------------------------------

    pub fn set_show_filters(&mut self, show: bool) {
        self.ui.show_filters = show;
    }

    pub fn close_add_dialog(&mut self) {
        self.ui.add_dialog_open = false;
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    pub fn item_mutation(&self) -> MutationState<InventoryItem> {
        self.item_mutation.state()
    }

    pub fn assign_mutation(&self) -> MutationState<Vec<InventoryItem>> {
        self.assign_mutation.state()
    }

    pub fn delete_mutation(&self) -> MutationState<Vec<ItemId>> {
        self.delete_mutation.state()
    }


    pub async fn rename(&mut self, id: ItemId, name: impl Into<String>) -> Result<InventoryItem> {
        self.update_item(id, ItemPatch::rename(name)).await
    }

    pub async fn set_flag(
        &mut self,
        id: ItemId,
        flag: impl Into<String>,
        value: bool,
    ) -> Result<InventoryItem> {
        self.update_item(id, ItemPatch::set_flag(flag, value)).await
    }

    pub async fn assign_group(
        &mut self,
        id: ItemId,
        group: Option<GroupId>,
    ) -> Result<InventoryItem> {
        self.update_item(id, ItemPatch::assign_group(group)).await
    }

    async fn update_item(&mut self, id: ItemId, patch: ItemPatch) -> Result<InventoryItem> {
        let item = self
            .reconciler
            .update_item(&self.item_mutation, id, patch)
            .await?;
        if let Some(draft) = &mut self.notes {
            draft.rebase(&item);
        }
        Ok(item)
    }

    /// Move every selected row into `group`. Clears the selection on success.
    pub async fn assign_selected(&mut self, group: Option<GroupId>) -> Result<usize> {
        let ids = self.selection.to_vec();
        let updated = self
            .reconciler
            .bulk_assign_group(&self.assign_mutation, ids, group)
            .await?;
        self.selection.clear();
        Ok(updated.len())
    }

    /// Delete every selected row. Clears the selection on success.
    pub async fn delete_selected(&mut self) -> Result<usize> {
        let ids = self.selection.to_vec();
        let removed = self
            .reconciler
            .bulk_delete(&self.delete_mutation, ids)
            .await?;
        self.selection.clear();
        if self
            .notes
            .as_ref()
            .is_some_and(|draft| removed.contains(&draft.item()))
        {
            self.notes = None;
        }
        Ok(removed.len())
    }

    // -------------------------------------------------------------------------
    // Notes
    // -------------------------------------------------------------------------

    /// Open a notes draft for a row of the cached collection.
    pub fn open_notes(&mut self, id: ItemId) -> Option<&mut NotesDraft> {
        let collection = self.collection()?;
        let item = collection.iter().find(|item| item.id == id)?;
        self.notes = Some(NotesDraft::open(item));
        self.notes.as_mut()
    }

    pub fn notes(&self) -> Option<&NotesDraft> {
        self.notes.as_ref()
    }

    pub fn notes_mut(&mut self) -> Option<&mut NotesDraft> {
        self.notes.as_mut()
    }

    pub fn close_notes(&mut self) -> Option<NotesDraft> {
        self.notes.take()
    }

    /// Save the open draft. Returns `false` when there was nothing to save.
    pub async fn save_notes(&mut self) -> Result<bool> {
        let draft = self.notes.as_mut().ok_or(DashboardError::NoDraft)?;
        let Some(patch) = draft.start_save() else {
            return Ok(false);
        };
        let id = draft.item();

        let outcome = self
            .reconciler
            .update_item(&self.item_mutation, id, patch)
            .await;
        match outcome {
            Ok(item) => {
                if let Some(draft) = &mut self.notes {
                    draft.save_complete(&item);
                }
                Ok(true)
            }
            Err(error) => {
                if let Some(draft) = &mut self.notes {
                    draft.save_failed();
                }
                Err(error.into())
            }
        }
    }
}
