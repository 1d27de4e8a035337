//! Mounted table behaviour against the in-memory backend.

use std::sync::Arc;

use fleet_cache::{ApiError, MemoryApi, MutationState};
use fleet_dashboard::{Dashboard, DashboardConfig, DashboardError, InventoryTable};
use fleet_model::{Field, GroupId, GroupRef, InventoryItem, ItemId, ViewKind};
use fleet_persistence::{FileStore, KeyValueStore, MemoryStore};
use fleet_table::{DerivedFilter, GroupDimension, SelectAllState};
use tempfile::tempdir;

fn group(id: &str) -> GroupRef {
    GroupRef::new(GroupId::new(id).unwrap(), id.to_uppercase(), "#336699")
}

fn hosts() -> Vec<InventoryItem> {
    vec![
        InventoryItem::new(1u64)
            .with_name("web-01")
            .with_os("Ubuntu")
            .with_group(group("g1"))
            .with_counter("outdated", 4),
        InventoryItem::new(2u64)
            .with_name("web-02")
            .with_os("Debian")
            .with_counter("outdated", 0),
        InventoryItem::new(3u64)
            .with_name("db-01")
            .with_os("Ubuntu")
            .with_group(group("g1"))
            .with_counter("outdated", 1),
    ]
}

fn backend() -> Arc<MemoryApi> {
    Arc::new(
        MemoryApi::new()
            .with_groups(vec![group("g1"), group("g2")])
            .with_items(ViewKind::Hosts, hosts()),
    )
}

fn dashboard(api: &Arc<MemoryApi>) -> Dashboard<MemoryApi> {
    Dashboard::new(
        DashboardConfig::default(),
        Arc::clone(api),
        Arc::new(MemoryStore::new()),
    )
}

async fn mounted(dashboard: &Dashboard<MemoryApi>, location: &str) -> InventoryTable<MemoryApi> {
    let mut table = dashboard.mount(ViewKind::Hosts, location);
    table.load().await.unwrap();
    table
}

/// Let spawned refetches run to completion.
async fn drain() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn navigation_parameters_apply_once() {
    let api = backend();
    let dashboard = dashboard(&api);
    let table = mounted(&dashboard, "/hosts?filter=needs-updates&action=add&selected=1,3,99").await;

    assert!(table.ui().add_dialog_open);
    assert!(table.ui().show_filters);
    assert_eq!(table.location().to_string(), "/hosts?filter=needs-updates");
    assert_eq!(table.query().criteria.derived, Some(DerivedFilter::NeedsUpdates));
    // 99 is not in the collection.
    assert_eq!(table.selection().to_vec(), [ItemId(1), ItemId(3)]);

    let rendered = table.render();
    assert_eq!(rendered.ids(), [ItemId(1), ItemId(3)]);
    assert_eq!(rendered.select_state, SelectAllState::All);
}

#[tokio::test]
async fn ui_flags_follow_the_user() {
    let api = backend();
    let dashboard = dashboard(&api);
    let mut table = mounted(&dashboard, "/hosts?action=add").await;
    assert!(table.ui().add_dialog_open);
    assert!(!table.ui().show_filters);

    table.close_add_dialog();
    table.set_show_filters(true);
    assert!(!table.ui().add_dialog_open);
    assert!(table.ui().show_filters);
    assert_eq!(table.location().to_string(), "/hosts");
}

#[tokio::test]
async fn render_projects_visible_columns() {
    let api = backend();
    let dashboard = dashboard(&api);
    let mut table = mounted(&dashboard, "/hosts").await;
    table.toggle_sort(Field::Name);

    let rendered = table.render();
    let ids: Vec<&str> = rendered.columns.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids[..4], ["name", "address", "group", "os"]);
    assert!(!ids.contains(&"category"));

    let first = rendered.rows().next().unwrap();
    assert_eq!(first.id, ItemId(3));
    assert_eq!(first.cells[0], "db-01");
    assert_eq!(first.cells[2], "G1");
    assert_eq!(first.cells.len(), rendered.columns.len());
    assert_eq!(rendered.total_rows, 3);
}

#[tokio::test]
async fn filter_changes_reset_the_page() {
    let api = backend();
    let dashboard = dashboard(&api);
    let mut table = mounted(&dashboard, "/hosts").await;
    table.set_page_size(1);
    table.set_page(2);
    assert_eq!(table.render().page, 2);

    table.set_field_filter(Field::Os, "ubuntu");
    let rendered = table.render();
    assert_eq!(rendered.page, 0);
    assert_eq!(rendered.page_count, 2);
}

#[tokio::test]
async fn select_all_is_scoped_to_the_page() {
    let api = backend();
    let dashboard = dashboard(&api);
    let mut table = mounted(&dashboard, "/hosts").await;
    table.set_page_size(2);

    table.toggle_select_all();
    assert_eq!(table.selection().len(), 2);
    assert_eq!(table.render().select_state, SelectAllState::All);

    table.toggle_select_all();
    assert!(table.selection().is_empty());
}

#[tokio::test]
async fn bucket_select_all_covers_one_bucket() {
    let api = backend();
    let dashboard = dashboard(&api);
    let mut table = mounted(&dashboard, "/hosts").await;
    table.set_grouping(GroupDimension::Group);

    assert!(table.toggle_select_bucket("g1"));
    assert_eq!(table.selection().to_vec(), [ItemId(1), ItemId(3)]);
    assert!(!table.toggle_select_bucket("nope"));

    let rendered = table.render();
    let g1 = rendered.buckets.iter().find(|b| b.label == "G1").unwrap();
    assert_eq!(g1.select_state, SelectAllState::All);
    assert_eq!(rendered.select_state, SelectAllState::Partial);
}

#[tokio::test]
async fn bucket_select_all_keeps_same_named_groups_apart() {
    let web = |id: &str| GroupRef::new(GroupId::new(id).unwrap(), "Web", "#336699");
    let api = Arc::new(MemoryApi::new().with_items(
        ViewKind::Hosts,
        vec![
            InventoryItem::new(1u64).with_name("a").with_group(web("g1")),
            InventoryItem::new(2u64).with_name("b").with_group(web("g2")),
        ],
    ));
    let dashboard = dashboard(&api);
    let mut table = mounted(&dashboard, "/hosts").await;
    table.set_grouping(GroupDimension::Group);

    let rendered = table.render();
    let labels: Vec<&str> = rendered.buckets.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, ["Web", "Web"]);

    assert!(table.toggle_select_bucket(&rendered.buckets[1].key));
    assert_eq!(table.selection().to_vec(), [ItemId(2)]);
}

#[tokio::test]
async fn bulk_assign_clears_selection_and_refreshes() {
    let api = backend();
    let dashboard = dashboard(&api);
    let mut table = mounted(&dashboard, "/hosts").await;
    table.toggle_row(ItemId(1));
    table.toggle_row(ItemId(2));

    let updated = table
        .assign_selected(Some(GroupId::new("g2").unwrap()))
        .await
        .unwrap();
    assert_eq!(updated, 2);
    assert!(table.selection().is_empty());
    assert!(matches!(table.assign_mutation(), MutationState::Success(_)));

    let rendered = table.render();
    let row = rendered.rows().find(|row| row.id == ItemId(2)).unwrap();
    assert_eq!(row.cells[2], "G2");

    drain().await;
    assert_eq!(api.list_calls(), 2);
}

#[tokio::test]
async fn failed_bulk_delete_keeps_selection() {
    let api = backend();
    let dashboard = dashboard(&api);
    let mut table = mounted(&dashboard, "/hosts").await;
    table.toggle_row(ItemId(1));
    api.fail_next(ApiError::Network("connection reset".into()));

    let error = table.delete_selected().await.unwrap_err();
    assert!(matches!(error, DashboardError::Api(ApiError::Network(_))));
    assert!(table.selection().has(ItemId(1)));
    assert_eq!(table.render().total_rows, 3);
    assert!(matches!(table.delete_mutation(), MutationState::Error(_)));
}

#[tokio::test]
async fn delete_selected_removes_rows() {
    let api = backend();
    let dashboard = dashboard(&api);
    let mut table = mounted(&dashboard, "/hosts").await;
    table.toggle_row(ItemId(2));
    table.open_notes(ItemId(2)).unwrap();

    assert_eq!(table.delete_selected().await.unwrap(), 1);
    assert!(table.notes().is_none());
    assert_eq!(table.render().ids(), [ItemId(1), ItemId(3)]);
}

#[tokio::test]
async fn notes_draft_saves_through_the_cache() {
    let api = backend();
    let dashboard = dashboard(&api);
    let mut table = mounted(&dashboard, "/hosts").await;

    assert!(matches!(table.save_notes().await, Err(DashboardError::NoDraft)));

    table.open_notes(ItemId(1)).unwrap().edit("rack 4");
    assert!(table.save_notes().await.unwrap());
    assert!(!table.notes().unwrap().is_dirty());
    assert!(!table.save_notes().await.unwrap());

    let cached = table.collection().unwrap();
    let row = cached.iter().find(|item| item.id == ItemId(1)).unwrap();
    assert_eq!(row.notes.as_deref(), Some("rack 4"));
}

#[tokio::test]
async fn failed_notes_save_keeps_the_draft() {
    let api = backend();
    let dashboard = dashboard(&api);
    let mut table = mounted(&dashboard, "/hosts").await;

    table.open_notes(ItemId(1)).unwrap().edit("rack 4");
    api.fail_next(ApiError::Network("timeout".into()));
    assert!(table.save_notes().await.is_err());

    let draft = table.notes().unwrap();
    assert!(draft.is_dirty());
    assert!(!draft.is_saving());
    assert_eq!(draft.text(), "rack 4");
}

#[tokio::test]
async fn rename_validation_error_leaves_row_untouched() {
    let api = backend();
    let dashboard = dashboard(&api);
    let mut table = mounted(&dashboard, "/hosts").await;

    let error = table.rename(ItemId(1), "  ").await.unwrap_err();
    assert!(matches!(error, DashboardError::Api(ApiError::Validation(_))));
    assert!(!error.user_message().is_empty());

    table.rename(ItemId(1), "web-01a").await.unwrap();
    let rendered = table.render();
    let row = rendered.rows().find(|row| row.id == ItemId(1)).unwrap();
    assert_eq!(row.cells[0], "web-01a");
}

#[tokio::test]
async fn column_layout_survives_remount() {
    let dir = tempdir().unwrap();
    let api = backend();
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(dir.path()));
    let dashboard = Dashboard::new(DashboardConfig::default(), Arc::clone(&api), store);

    {
        let mut table = mounted(&dashboard, "/hosts").await;
        assert!(table.toggle_column("address").unwrap());
        assert!(!table.toggle_column("no-such-column").unwrap());
    }

    let table = mounted(&dashboard, "/hosts").await;
    let rendered = table.render();
    assert!(rendered.columns.iter().all(|c| c.id != "address"));
}

#[tokio::test]
async fn teardown_cancels_the_scope() {
    let api = backend();
    let dashboard = dashboard(&api);
    let table = mounted(&dashboard, "/hosts").await;
    let scope = table.scope().clone();

    table.teardown();
    assert!(scope.is_cancelled());
}

#[tokio::test]
async fn groups_are_cached() {
    let api = backend();
    let dashboard = dashboard(&api);
    let table = mounted(&dashboard, "/hosts").await;

    let groups = table.groups().await.unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(dashboard.cache().stats().misses, 2);
}
