//! In-process backend with failure injection.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use fleet_model::{
    GroupId, GroupRef, HostSummary, InventoryItem, ItemDetail, ItemId, ItemPatch, UpdateRecord,
    ViewKind,
};

use super::InventoryApi;
use crate::error::{ApiError, Result};

#[derive(Debug, Default)]
struct State {
    views: BTreeMap<ViewKind, Vec<InventoryItem>>,
    relations: HashMap<ItemId, (Vec<UpdateRecord>, Vec<HostSummary>)>,
    groups: Vec<GroupRef>,
}

impl State {
    fn contains(&self, id: ItemId) -> bool {
        self.views.values().flatten().any(|item| item.id == id)
    }

    fn find(&self, id: ItemId) -> Option<&InventoryItem> {
        self.views.values().flatten().find(|item| item.id == id)
    }

    fn resolve_group(&self, group: Option<&GroupId>) -> Result<Option<GroupRef>> {
        let Some(id) = group else {
            return Ok(None);
        };
        self.groups
            .iter()
            .find(|g| &g.id == id)
            .cloned()
            .map(Some)
            .ok_or_else(|| ApiError::Validation(format!("unknown group {id}")))
    }

    /// Apply `change` to every copy of `id`. Returns the last updated copy.
    fn modify(
        &mut self,
        id: ItemId,
        change: impl Fn(&mut InventoryItem),
    ) -> Option<InventoryItem> {
        let mut updated = None;
        for item in self.views.values_mut().flatten().filter(|item| item.id == id) {
            change(item);
            updated = Some(item.clone());
        }
        updated
    }
}

/// [`InventoryApi`] backed by in-memory collections.
///
/// Failures queued with [`fail_next`](Self::fail_next) are returned by the
/// next calls in FIFO order, before any state is touched.
#[derive(Debug, Default)]
pub struct MemoryApi {
    state: Mutex<State>,
    failures: Mutex<VecDeque<ApiError>>,
    latency: Mutex<Duration>,
    list_calls: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(self, view: ViewKind, items: Vec<InventoryItem>) -> Self {
        self.replace_items(view, items);
        self
    }

    pub fn with_groups(self, groups: Vec<GroupRef>) -> Self {
        lock(&self.state).groups = groups;
        self
    }

    /// Relation collections returned by [`InventoryApi::get`] for `detail.item.id`.
    pub fn with_detail(self, detail: ItemDetail) -> Self {
        lock(&self.state)
            .relations
            .insert(detail.item.id, (detail.history, detail.installed_on));
        self
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        *lock(&self.latency) = latency;
        self
    }

    /// Server-side change not caused by the dashboard.
    pub fn replace_items(&self, view: ViewKind, items: Vec<InventoryItem>) {
        lock(&self.state).views.insert(view, items);
    }

    /// Current server copy of a view.
    pub fn items(&self, view: ViewKind) -> Vec<InventoryItem> {
        lock(&self.state)
            .views
            .get(&view)
            .cloned()
            .unwrap_or_default()
    }

    pub fn fail_next(&self, error: ApiError) {
        lock(&self.failures).push_back(error);
    }

    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.latency) = latency;
    }

    /// Number of `list` calls served so far, failed ones included.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    async fn enter(&self, operation: &'static str) -> Result<()> {
        let latency = *lock(&self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let failure = lock(&self.failures).pop_front();
        match failure {
            Some(error) => {
                tracing::debug!(operation, %error, "injected backend failure");
                Err(error)
            }
            None => Ok(()),
        }
    }

    fn apply(&self, id: ItemId, patch: &ItemPatch) -> Result<InventoryItem> {
        let mut state = lock(&self.state);
        if !state.contains(id) {
            return Err(ApiError::NotFound(id));
        }
        let updated = match patch {
            ItemPatch::Rename { name } => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(ApiError::Validation("name must not be blank".into()));
                }
                state.modify(id, |item| item.name = Some(name.to_string()))
            }
            ItemPatch::SetFlag { flag, value } => {
                state.modify(id, |item| {
                    item.flags.insert(flag.clone(), *value);
                })
            }
            ItemPatch::AssignGroup { group } => {
                let group = state.resolve_group(group.as_ref())?;
                state.modify(id, |item| item.group = group.clone())
            }
            ItemPatch::SetNotes { notes } => {
                let notes = (!notes.trim().is_empty()).then(|| notes.clone());
                state.modify(id, |item| item.notes = notes.clone())
            }
        };
        updated.ok_or(ApiError::NotFound(id))
    }

    fn assign(&self, ids: &[ItemId], group: Option<&GroupId>) -> Result<Vec<InventoryItem>> {
        let mut state = lock(&self.state);
        if let Some(missing) = ids.iter().find(|id| !state.contains(**id)) {
            return Err(ApiError::NotFound(*missing));
        }
        let group = state.resolve_group(group)?;

        let mut updated: Vec<InventoryItem> = Vec::with_capacity(ids.len());
        for &id in ids {
            if updated.iter().any(|item| item.id == id) {
                continue;
            }
            if let Some(item) = state.modify(id, |item| item.group = group.clone()) {
                updated.push(item);
            }
        }
        Ok(updated)
    }

    fn delete(&self, ids: &[ItemId]) -> Result<()> {
        let mut state = lock(&self.state);
        if let Some(missing) = ids.iter().find(|id| !state.contains(**id)) {
            return Err(ApiError::NotFound(*missing));
        }
        for items in state.views.values_mut() {
            items.retain(|item| !ids.contains(&item.id));
        }
        for id in ids {
            state.relations.remove(id);
        }
        Ok(())
    }
}

impl InventoryApi for MemoryApi {
    async fn list(&self, view: ViewKind) -> Result<Vec<InventoryItem>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.enter("list").await?;
        Ok(self.items(view))
    }

    async fn get(&self, id: ItemId) -> Result<ItemDetail> {
        self.enter("get").await?;
        let state = lock(&self.state);
        let item = state.find(id).cloned().ok_or(ApiError::NotFound(id))?;
        let (history, installed_on) = state.relations.get(&id).cloned().unwrap_or_default();
        Ok(ItemDetail {
            item,
            history,
            installed_on,
        })
    }

    async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<InventoryItem> {
        self.enter(patch.operation()).await?;
        self.apply(id, &patch)
    }

    async fn bulk_assign_group(
        &self,
        ids: Vec<ItemId>,
        group: Option<GroupId>,
    ) -> Result<Vec<InventoryItem>> {
        self.enter("bulk_assign_group").await?;
        self.assign(&ids, group.as_ref())
    }

    async fn bulk_delete(&self, ids: Vec<ItemId>) -> Result<()> {
        self.enter("bulk_delete").await?;
        self.delete(&ids)
    }

    async fn list_groups(&self) -> Result<Vec<GroupRef>> {
        self.enter("list_groups").await?;
        Ok(lock(&self.state).groups.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: &str) -> GroupRef {
        GroupRef::new(GroupId::new(id).unwrap(), id.to_uppercase(), "#000000")
    }

    fn api() -> MemoryApi {
        MemoryApi::new()
            .with_groups(vec![group("g1"), group("g2")])
            .with_items(
                ViewKind::Hosts,
                vec![
                    InventoryItem::new(1u64).with_name("alpha"),
                    InventoryItem::new(2u64).with_name("beta").with_group(group("g1")),
                ],
            )
    }

    #[tokio::test]
    async fn injected_failure_leaves_state_untouched() {
        let api = api();
        api.fail_next(ApiError::Network("reset".into()));

        let err = api.update(ItemId(1), ItemPatch::rename("gamma")).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
        assert_eq!(api.items(ViewKind::Hosts)[0].name.as_deref(), Some("alpha"));

        let updated = api.update(ItemId(1), ItemPatch::rename("gamma")).await.unwrap();
        assert_eq!(updated.name.as_deref(), Some("gamma"));
    }

    #[tokio::test]
    async fn blank_rename_is_rejected() {
        let err = api().update(ItemId(1), ItemPatch::rename("  ")).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn bulk_assign_is_all_or_nothing() {
        let api = api();
        let g2 = GroupId::new("g2").unwrap();

        let err = api
            .bulk_assign_group(vec![ItemId(1), ItemId(9)], Some(g2.clone()))
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::NotFound(ItemId(9)));
        assert!(api.items(ViewKind::Hosts)[0].group.is_none());

        let updated = api
            .bulk_assign_group(vec![ItemId(1), ItemId(2), ItemId(1)], Some(g2.clone()))
            .await
            .unwrap();
        assert_eq!(updated.len(), 2);
        assert!(updated.iter().all(|item| item.group_id() == Some(&g2)));
    }

    #[tokio::test]
    async fn unknown_group_is_a_validation_error() {
        let missing = GroupId::new("nope").unwrap();
        let err = api()
            .update(ItemId(1), ItemPatch::assign_group(Some(missing)))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_removes_rows_and_detail() {
        let api = api();
        api.bulk_delete(vec![ItemId(2)]).await.unwrap();
        assert_eq!(api.items(ViewKind::Hosts).len(), 1);
        assert_eq!(api.get(ItemId(2)).await.unwrap_err(), ApiError::NotFound(ItemId(2)));
    }
}
