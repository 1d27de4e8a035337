//! Pessimistic mutation reconciliation.
//!
//! The cache is only written after the server confirmed a change. Single-row
//! edits swap in the returned entity. Bulk edits merge the returned subset by
//! id and then invalidate the collection, so a background refetch repairs
//! anything the merge could not know about (rows the server touched as a side
//! effect, ordering, counters).
//!
//! Results arriving after the owning [`ViewScope`] was cancelled are dropped
//! without touching the cache or the mutation state.

use std::sync::Arc;

use fleet_model::{GroupId, InventoryItem, ItemId, ItemPatch, ViewKind};

use crate::api::InventoryApi;
use crate::cache::{Collection, QueryCache};
use crate::error::{ApiError, Result};
use crate::key::QueryKey;
use crate::mutation::Mutation;
use crate::scope::ViewScope;

/// Runs mutations for one view against a backend and keeps the cache in step.
pub struct Reconciler<A> {
    api: Arc<A>,
    cache: QueryCache,
    view: ViewKind,
    scope: ViewScope,
}

impl<A> Clone for Reconciler<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            cache: self.cache.clone(),
            view: self.view,
            scope: self.scope.clone(),
        }
    }
}

impl<A> std::fmt::Debug for Reconciler<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("view", &self.view)
            .field("cancelled", &self.scope.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<A: InventoryApi> Reconciler<A> {
    pub fn new(api: Arc<A>, cache: QueryCache, view: ViewKind, scope: ViewScope) -> Self {
        Self {
            api,
            cache,
            view,
            scope,
        }
    }

    pub fn view(&self) -> ViewKind {
        self.view
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    /// Collection of this view, stale-while-revalidate.
    pub async fn collection(&self) -> Result<Collection> {
        self.cache.fetch_collection(&self.api, self.view).await
    }

    /// Rename, flag toggle, group reassignment or notes save for one row.
    ///
    /// On success only the matching cached row is replaced.
    pub async fn update_item(
        &self,
        mutation: &Mutation<InventoryItem>,
        id: ItemId,
        patch: ItemPatch,
    ) -> Result<InventoryItem> {
        let operation = patch.operation();
        self.begin(mutation, operation)?;

        let response = self.api.update(id, patch).await;
        if self.is_late(operation) {
            return Err(ApiError::Cancelled);
        }

        let outcome = match response {
            Ok(item) => {
                self.cache.replace_item(self.view, item.clone()).await;
                Ok(item)
            }
            Err(error) => Err(error),
        };
        self.settle(mutation, operation, outcome)
    }

    /// Move `ids` into `group`. Returns the server-updated rows.
    pub async fn bulk_assign_group(
        &self,
        mutation: &Mutation<Vec<InventoryItem>>,
        ids: Vec<ItemId>,
        group: Option<GroupId>,
    ) -> Result<Vec<InventoryItem>> {
        const OPERATION: &str = "bulk_assign_group";
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.begin(mutation, OPERATION)?;

        let response = self.api.bulk_assign_group(ids, group).await;
        if self.is_late(OPERATION) {
            return Err(ApiError::Cancelled);
        }

        let outcome = match response {
            Ok(updated) => {
                let merged = self.cache.merge_items(self.view, updated.clone()).await;
                tracing::debug!(view = %self.view, merged, "merged bulk update");
                for item in &updated {
                    self.cache.invalidate(&QueryKey::Detail(item.id)).await;
                }
                self.refresh_collection().await;
                Ok(updated)
            }
            Err(error) => Err(error),
        };
        self.settle(mutation, OPERATION, outcome)
    }

    /// Delete `ids`. Returns the ids removed.
    pub async fn bulk_delete(
        &self,
        mutation: &Mutation<Vec<ItemId>>,
        ids: Vec<ItemId>,
    ) -> Result<Vec<ItemId>> {
        const OPERATION: &str = "bulk_delete";
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.begin(mutation, OPERATION)?;

        let response = self.api.bulk_delete(ids.clone()).await;
        if self.is_late(OPERATION) {
            return Err(ApiError::Cancelled);
        }

        let outcome = match response {
            Ok(()) => {
                let removed = self.cache.remove_items(self.view, &ids).await;
                tracing::debug!(view = %self.view, removed, "removed deleted rows");
                self.refresh_collection().await;
                Ok(ids)
            }
            Err(error) => Err(error),
        };
        self.settle(mutation, OPERATION, outcome)
    }

    async fn refresh_collection(&self) {
        let key = QueryKey::Collection(self.view);
        if self.cache.invalidate(&key).await {
            self.cache.revalidate(&self.api, key);
        }
    }

    fn begin<T: Clone>(&self, mutation: &Mutation<T>, operation: &'static str) -> Result<()> {
        if self.scope.is_cancelled() {
            tracing::debug!(view = %self.view, operation, "mutation refused, view torn down");
            return Err(ApiError::Cancelled);
        }
        mutation.begin()
    }

    fn is_late(&self, operation: &'static str) -> bool {
        let late = self.scope.is_cancelled();
        if late {
            tracing::warn!(view = %self.view, operation, "dropping mutation result after view teardown");
        }
        late
    }

    fn settle<T: Clone>(
        &self,
        mutation: &Mutation<T>,
        operation: &'static str,
        outcome: Result<T>,
    ) -> Result<T> {
        match &outcome {
            Ok(_) => tracing::info!(view = %self.view, operation, "mutation succeeded"),
            Err(error) => {
                tracing::warn!(view = %self.view, operation, %error, "mutation failed");
            }
        }
        mutation.finish(&outcome);
        outcome
    }
}
