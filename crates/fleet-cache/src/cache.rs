//! Key-addressed query cache with stale-while-revalidate reads.
//!
//! Every key owns a slot holding the last value, the time it was fetched, a
//! generation counter and a write lock. Writes to a key are serialised by its
//! lock and bump the generation. A fetch remembers the generation it started
//! from and its result is dropped if the slot moved on in the meantime, so a
//! slow refetch never overwrites a newer merge.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use fleet_model::{GroupRef, InventoryItem, ItemDetail, ItemId, ViewKind};
use tokio::time::Instant;

use crate::api::InventoryApi;
use crate::error::Result;
use crate::key::{CacheConfig, QueryKey, QueryKind};

/// Cached collection. Rows are individually shared so a reconcile can keep
/// untouched rows by reference.
pub type Collection = Arc<Vec<Arc<InventoryItem>>>;

/// State of a key at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Within its staleness window.
    Fresh,
    /// Cached, but past its window or invalidated.
    Stale,
    /// Nothing cached.
    Missing,
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub stale_hits: u64,
    pub misses: u64,
    /// Fetch results dropped because a newer write landed first.
    pub discarded_writes: u64,
}

// =============================================================================
// SLOTS
// =============================================================================

struct Slot<V> {
    value: Option<V>,
    fetched_at: Option<Instant>,
    invalidated: bool,
    generation: u64,
    /// Generation the in-flight background refetch started from.
    refetching: Option<u64>,
    write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Self {
            value: None,
            fetched_at: None,
            invalidated: false,
            generation: 0,
            refetching: None,
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }
}

struct Store<K, V> {
    stale_time: Duration,
    slots: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V> Store<K, V>
where
    K: Copy + Eq + Hash,
    V: Clone,
{
    fn new(stale_time: Duration) -> Self {
        Self {
            stale_time,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<K, Slot<V>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn peek(&self, key: K) -> Option<V> {
        self.slots().get(&key).and_then(|slot| slot.value.clone())
    }

    fn read(&self, key: K) -> (Freshness, Option<V>) {
        let slots = self.slots();
        let Some(slot) = slots.get(&key) else {
            return (Freshness::Missing, None);
        };
        match (&slot.value, slot.fetched_at) {
            (Some(value), Some(at)) if !slot.invalidated && at.elapsed() < self.stale_time => {
                (Freshness::Fresh, Some(value.clone()))
            }
            (Some(value), _) => (Freshness::Stale, Some(value.clone())),
            (None, _) => (Freshness::Missing, None),
        }
    }

    fn generation(&self, key: K) -> u64 {
        self.slots().get(&key).map_or(0, |slot| slot.generation)
    }

    fn write_lock(&self, key: K) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(&self.slots().entry(key).or_default().write_lock)
    }

    /// Claim the background refetch for `key`. `None` when one is already
    /// running from the current generation.
    fn begin_refetch(&self, key: K) -> Option<u64> {
        let mut slots = self.slots();
        let slot = slots.entry(key).or_default();
        if slot.refetching == Some(slot.generation) {
            return None;
        }
        slot.refetching = Some(slot.generation);
        Some(slot.generation)
    }

    fn end_refetch(&self, key: K, generation: u64) {
        if let Some(slot) = self.slots().get_mut(&key)
            && slot.refetching == Some(generation)
        {
            slot.refetching = None;
        }
    }

    /// Store a fetched value unless a write happened since `generation`.
    fn store_if_current(&self, key: K, generation: u64, value: V) -> bool {
        let mut slots = self.slots();
        let slot = slots.entry(key).or_default();
        if slot.generation != generation {
            return false;
        }
        slot.value = Some(value);
        slot.fetched_at = Some(Instant::now());
        slot.invalidated = false;
        slot.generation += 1;
        true
    }

    fn set(&self, key: K, value: V) {
        let mut slots = self.slots();
        let slot = slots.entry(key).or_default();
        slot.value = Some(value);
        slot.fetched_at = Some(Instant::now());
        slot.invalidated = false;
        slot.generation += 1;
    }

    /// Rewrite the cached value in place. `f` returning `None` leaves the
    /// slot untouched. The fetch time is kept: a merge is not a refetch.
    fn update<R>(&self, key: K, f: impl FnOnce(&V) -> Option<(V, R)>) -> Option<R> {
        let mut slots = self.slots();
        let slot = slots.get_mut(&key)?;
        let (value, result) = f(slot.value.as_ref()?)?;
        slot.value = Some(value);
        slot.generation += 1;
        Some(result)
    }

    fn invalidate(&self, key: K) -> bool {
        let mut slots = self.slots();
        let Some(slot) = slots.get_mut(&key) else {
            return false;
        };
        slot.invalidated = true;
        slot.generation += 1;
        slot.value.is_some()
    }

    fn remove(&self, key: K) {
        let mut slots = self.slots();
        if let Some(slot) = slots.get_mut(&key) {
            slot.value = None;
            slot.fetched_at = None;
            slot.generation += 1;
        }
    }
}

// =============================================================================
// CACHE
// =============================================================================

struct Inner {
    collections: Store<ViewKind, Collection>,
    details: Store<ItemId, Arc<ItemDetail>>,
    groups: Store<(), Arc<Vec<GroupRef>>>,
    hits: AtomicU64,
    stale_hits: AtomicU64,
    misses: AtomicU64,
    discarded_writes: AtomicU64,
}

fn collections(inner: &Inner) -> &Store<ViewKind, Collection> {
    &inner.collections
}

fn details(inner: &Inner) -> &Store<ItemId, Arc<ItemDetail>> {
    &inner.details
}

fn groups(inner: &Inner) -> &Store<(), Arc<Vec<GroupRef>>> {
    &inner.groups
}

/// Shared query cache. Cloning yields another handle to the same cache.
#[derive(Clone)]
pub struct QueryCache {
    config: CacheConfig,
    inner: Arc<Inner>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            inner: Arc::new(Inner {
                collections: Store::new(config.stale_time(QueryKind::Collection)),
                details: Store::new(config.stale_time(QueryKind::Detail)),
                groups: Store::new(config.stale_time(QueryKind::Groups)),
                hits: AtomicU64::new(0),
                stale_hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                discarded_writes: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            stale_hits: self.inner.stale_hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            discarded_writes: self.inner.discarded_writes.load(Ordering::Relaxed),
        }
    }

    pub fn freshness(&self, key: &QueryKey) -> Freshness {
        match *key {
            QueryKey::Collection(view) => self.inner.collections.read(view).0,
            QueryKey::Detail(id) => self.inner.details.read(id).0,
            QueryKey::Groups => self.inner.groups.read(()).0,
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Last known collection of `view`, without touching the backend.
    pub fn collection(&self, view: ViewKind) -> Option<Collection> {
        self.inner.collections.peek(view)
    }

    pub fn detail(&self, id: ItemId) -> Option<Arc<ItemDetail>> {
        self.inner.details.peek(id)
    }

    pub fn groups(&self) -> Option<Arc<Vec<GroupRef>>> {
        self.inner.groups.peek(())
    }

    pub async fn fetch_collection<A: InventoryApi>(
        &self,
        api: &Arc<A>,
        view: ViewKind,
    ) -> Result<Collection> {
        self.fetch(collections, view, QueryKey::Collection(view), api, move |api| async move {
            api.list(view).await.map(into_collection)
        })
        .await
    }

    pub async fn fetch_detail<A: InventoryApi>(
        &self,
        api: &Arc<A>,
        id: ItemId,
    ) -> Result<Arc<ItemDetail>> {
        self.fetch(details, id, QueryKey::Detail(id), api, move |api| async move {
            api.get(id).await.map(Arc::new)
        })
        .await
    }

    pub async fn fetch_groups<A: InventoryApi>(&self, api: &Arc<A>) -> Result<Arc<Vec<GroupRef>>> {
        self.fetch(groups, (), QueryKey::Groups, api, |api| async move {
            api.list_groups().await.map(Arc::new)
        })
        .await
    }

    /// Start a background refetch of `key` regardless of its freshness.
    pub fn revalidate<A: InventoryApi>(&self, api: &Arc<A>, key: QueryKey) {
        let api = Arc::clone(api);
        match key {
            QueryKey::Collection(view) => self.spawn_refetch(collections, view, key, api, move |api| async move {
                api.list(view).await.map(into_collection)
            }),
            QueryKey::Detail(id) => self.spawn_refetch(details, id, key, api, move |api| async move {
                api.get(id).await.map(Arc::new)
            }),
            QueryKey::Groups => self.spawn_refetch(groups, (), key, api, |api| async move {
                api.list_groups().await.map(Arc::new)
            }),
        }
    }

    async fn fetch<K, V, A, F, Fut>(
        &self,
        select: fn(&Inner) -> &Store<K, V>,
        key: K,
        query_key: QueryKey,
        api: &Arc<A>,
        load: F,
    ) -> Result<V>
    where
        K: Copy + Eq + Hash + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
        A: InventoryApi,
        F: FnOnce(Arc<A>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let store = select(&self.inner);
        match store.read(key) {
            (Freshness::Fresh, Some(value)) => {
                self.inner.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %query_key, "cache hit");
                Ok(value)
            }
            (Freshness::Stale, Some(value)) => {
                self.inner.stale_hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %query_key, "serving stale value, revalidating");
                self.spawn_refetch(select, key, query_key, Arc::clone(api), load);
                Ok(value)
            }
            _ => {
                self.inner.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %query_key, "cache miss");
                let generation = store.generation(key);
                let value = load(Arc::clone(api)).await?;
                if self
                    .write_back(select, key, query_key, generation, value.clone())
                    .await
                {
                    Ok(value)
                } else {
                    Ok(store.peek(key).unwrap_or(value))
                }
            }
        }
    }

    fn spawn_refetch<K, V, A, F, Fut>(
        &self,
        select: fn(&Inner) -> &Store<K, V>,
        key: K,
        query_key: QueryKey,
        api: Arc<A>,
        load: F,
    ) where
        K: Copy + Eq + Hash + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
        A: InventoryApi,
        F: FnOnce(Arc<A>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let Some(generation) = select(&self.inner).begin_refetch(key) else {
            tracing::trace!(key = %query_key, "refetch already in flight");
            return;
        };
        let cache = self.clone();
        tokio::spawn(async move {
            match load(api).await {
                Ok(value) => {
                    cache
                        .write_back(select, key, query_key, generation, value)
                        .await;
                }
                Err(error) => {
                    tracing::warn!(key = %query_key, %error, "background refetch failed");
                }
            }
            select(&cache.inner).end_refetch(key, generation);
        });
    }

    async fn write_back<K, V>(
        &self,
        select: fn(&Inner) -> &Store<K, V>,
        key: K,
        query_key: QueryKey,
        generation: u64,
        value: V,
    ) -> bool
    where
        K: Copy + Eq + Hash,
        V: Clone,
    {
        let store = select(&self.inner);
        let lock = store.write_lock(key);
        let _guard = lock.lock().await;
        if store.store_if_current(key, generation, value) {
            tracing::debug!(key = %query_key, "cached fetch result");
            true
        } else {
            self.inner.discarded_writes.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(key = %query_key, "discarding fetch result older than cached value");
            false
        }
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Seed or overwrite a collection.
    pub async fn set_collection(&self, view: ViewKind, items: Vec<InventoryItem>) {
        let store = &self.inner.collections;
        let lock = store.write_lock(view);
        let _guard = lock.lock().await;
        store.set(view, into_collection(items));
    }

    pub async fn set_detail(&self, detail: ItemDetail) {
        let id = detail.item.id;
        let store = &self.inner.details;
        let lock = store.write_lock(id);
        let _guard = lock.lock().await;
        store.set(id, Arc::new(detail));
    }

    pub async fn set_groups(&self, catalog: Vec<GroupRef>) {
        let store = &self.inner.groups;
        let lock = store.write_lock(());
        let _guard = lock.lock().await;
        store.set((), Arc::new(catalog));
    }

    /// Rewrite a cached collection in place. `updater` returns `None` to
    /// leave it unchanged. Returns whether a new value was stored; nothing
    /// happens when the collection is not cached.
    pub async fn update_collection<F>(&self, view: ViewKind, updater: F) -> bool
    where
        F: FnOnce(&[Arc<InventoryItem>]) -> Option<Vec<Arc<InventoryItem>>>,
    {
        let store = &self.inner.collections;
        let lock = store.write_lock(view);
        let _guard = lock.lock().await;
        store
            .update(view, |current| updater(current).map(|next| (Arc::new(next), ())))
            .is_some()
    }

    /// Swap in the server copy of one row. Other rows keep their `Arc`.
    ///
    /// A cached detail for the same id gets the new row too. Returns whether
    /// the collection held the row.
    pub async fn replace_item(&self, view: ViewKind, item: InventoryItem) -> bool {
        let id = item.id;
        let item = Arc::new(item);

        let replaced = {
            let store = &self.inner.collections;
            let lock = store.write_lock(view);
            let _guard = lock.lock().await;
            store
                .update(view, |current| {
                    let (next, count) = merge_by_id(current, std::slice::from_ref(&item));
                    (count > 0).then_some((next, ()))
                })
                .is_some()
        };

        let store = &self.inner.details;
        let lock = store.write_lock(id);
        let _guard = lock.lock().await;
        store.update(id, |detail| {
            let mut detail = ItemDetail::clone(detail);
            detail.item = InventoryItem::clone(&item);
            Some((Arc::new(detail), ()))
        });

        replaced
    }

    /// Merge a server-returned subset by id. Returns how many rows changed.
    pub async fn merge_items(&self, view: ViewKind, items: Vec<InventoryItem>) -> usize {
        let items: Vec<Arc<InventoryItem>> = items.into_iter().map(Arc::new).collect();
        let store = &self.inner.collections;
        let lock = store.write_lock(view);
        let _guard = lock.lock().await;
        store
            .update(view, |current| {
                let (next, count) = merge_by_id(current, &items);
                (count > 0).then_some((next, count))
            })
            .unwrap_or(0)
    }

    /// Drop rows by id, and their cached details. Returns how many rows went.
    pub async fn remove_items(&self, view: ViewKind, ids: &[ItemId]) -> usize {
        let removed = {
            let store = &self.inner.collections;
            let lock = store.write_lock(view);
            let _guard = lock.lock().await;
            store
                .update(view, |current| {
                    let (next, count) = remove_ids(current, ids);
                    (count > 0).then_some((next, count))
                })
                .unwrap_or(0)
        };
        for &id in ids {
            let store = &self.inner.details;
            let lock = store.write_lock(id);
            let _guard = lock.lock().await;
            store.remove(id);
        }
        removed
    }

    /// Mark `key` stale so the next read revalidates. Fetches already in
    /// flight for it will be discarded. Returns whether a value was cached.
    pub async fn invalidate(&self, key: &QueryKey) -> bool {
        let invalidated = match *key {
            QueryKey::Collection(view) => {
                let store = &self.inner.collections;
                let lock = store.write_lock(view);
                let _guard = lock.lock().await;
                store.invalidate(view)
            }
            QueryKey::Detail(id) => {
                let store = &self.inner.details;
                let lock = store.write_lock(id);
                let _guard = lock.lock().await;
                store.invalidate(id)
            }
            QueryKey::Groups => {
                let store = &self.inner.groups;
                let lock = store.write_lock(());
                let _guard = lock.lock().await;
                store.invalidate(())
            }
        };
        tracing::debug!(%key, invalidated, "invalidated query");
        invalidated
    }
}

fn into_collection(items: Vec<InventoryItem>) -> Collection {
    Arc::new(items.into_iter().map(Arc::new).collect())
}

/// Replace rows whose id appears in `updates`. Rows without an update are
/// shared with `current`.
fn merge_by_id(current: &Collection, updates: &[Arc<InventoryItem>]) -> (Collection, usize) {
    let by_id: HashMap<ItemId, &Arc<InventoryItem>> =
        updates.iter().map(|item| (item.id, item)).collect();
    let mut count = 0;
    let next: Vec<Arc<InventoryItem>> = current
        .iter()
        .map(|row| match by_id.get(&row.id) {
            Some(update) => {
                count += 1;
                Arc::clone(update)
            }
            None => Arc::clone(row),
        })
        .collect();
    (Arc::new(next), count)
}

fn remove_ids(current: &Collection, ids: &[ItemId]) -> (Collection, usize) {
    let next: Vec<Arc<InventoryItem>> = current
        .iter()
        .filter(|row| !ids.contains(&row.id))
        .cloned()
        .collect();
    let count = current.len() - next.len();
    (Arc::new(next), count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(ids: &[u64]) -> Collection {
        into_collection(ids.iter().map(|&id| InventoryItem::new(id)).collect())
    }

    #[test]
    fn merge_keeps_untouched_rows_by_reference() {
        let current = rows(&[1, 2, 3]);
        let update = Arc::new(InventoryItem::new(2u64).with_name("renamed"));

        let (next, count) = merge_by_id(&current, std::slice::from_ref(&update));
        assert_eq!(count, 1);
        assert!(Arc::ptr_eq(&next[0], &current[0]));
        assert!(Arc::ptr_eq(&next[1], &update));
        assert!(Arc::ptr_eq(&next[2], &current[2]));
    }

    #[tokio::test]
    async fn update_collection_applies_updater() {
        let cache = QueryCache::default();
        assert!(!cache.update_collection(ViewKind::Hosts, |rows| Some(rows.to_vec())).await);

        cache
            .set_collection(ViewKind::Hosts, vec![InventoryItem::new(1u64), InventoryItem::new(2u64)])
            .await;
        let reversed = cache
            .update_collection(ViewKind::Hosts, |rows| Some(rows.iter().rev().cloned().collect()))
            .await;
        assert!(reversed);
        assert!(!cache.update_collection(ViewKind::Hosts, |_| None).await);

        let ids: Vec<ItemId> = cache
            .collection(ViewKind::Hosts)
            .unwrap()
            .iter()
            .map(|item| item.id)
            .collect();
        assert_eq!(ids, [ItemId(2), ItemId(1)]);
    }

    #[test]
    fn merge_ignores_unknown_ids() {
        let current = rows(&[1]);
        let (next, count) = merge_by_id(&current, &[Arc::new(InventoryItem::new(7u64))]);
        assert_eq!(count, 0);
        assert_eq!(next.len(), 1);
    }

    #[test]
    fn remove_counts_rows() {
        let (next, count) = remove_ids(&rows(&[1, 2, 3]), &[ItemId(1), ItemId(3), ItemId(9)]);
        assert_eq!(count, 2);
        assert_eq!(next[0].id, ItemId(2));
    }

    #[test]
    fn stale_fetch_is_discarded_after_newer_write() {
        let store: Store<ViewKind, u32> = Store::new(Duration::from_secs(60));
        let started = store.generation(ViewKind::Hosts);
        store.set(ViewKind::Hosts, 2);
        assert!(!store.store_if_current(ViewKind::Hosts, started, 1));
        assert_eq!(store.peek(ViewKind::Hosts), Some(2));
    }

    #[test]
    fn invalidated_value_reads_stale() {
        let store: Store<ViewKind, u32> = Store::new(Duration::from_secs(60));
        store.set(ViewKind::Hosts, 1);
        assert_eq!(store.read(ViewKind::Hosts).0, Freshness::Fresh);
        assert!(store.invalidate(ViewKind::Hosts));
        assert_eq!(store.read(ViewKind::Hosts), (Freshness::Stale, Some(1)));
    }

    #[test]
    fn one_refetch_per_generation() {
        let store: Store<ViewKind, u32> = Store::new(Duration::ZERO);
        let generation = store.begin_refetch(ViewKind::Hosts).unwrap();
        assert_eq!(store.begin_refetch(ViewKind::Hosts), None);

        store.invalidate(ViewKind::Hosts);
        assert!(store.begin_refetch(ViewKind::Hosts).is_some());
        store.end_refetch(ViewKind::Hosts, generation);
    }
}
