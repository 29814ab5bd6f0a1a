//! ============================================================================
//! Optimistic Collection - Apply locally, reconcile with the server
//! ============================================================================
//! Holds an ordered, identity-keyed list of records rendered by a view.
//! A mutation:
//! 1. snapshots the targeted record
//! 2. applies the anticipated change immediately
//! 3. awaits the server call
//! 4. on success keeps the local change, or overwrites it with the server's
//!    record when one comes back (server wins)
//! 5. on failure restores that record's snapshot and reports the error
//!
//! Mutations on the same key are queued behind a per-key lock, so two rapid
//! clicks on one record never interleave their snapshot/restore. Different
//! keys proceed independently.
//!
//! Dropping a mutation before the server answers (timeout, `select!`, task
//! abort) counts as a failure: the snapshot is restored and the key lock is
//! released.
//! ============================================================================

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::runtime::Handle;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::{ApiError, MutationError};
use crate::events::EventSink;
use crate::types::{AdminReview, Bid, Listing, Notification, Quest, RecordId};

/// Records that carry a stable identity
pub trait Keyed: Clone + Send + Sync + 'static {
    type Key: Eq + Hash + Clone + fmt::Display + Send + Sync + 'static;

    fn key(&self) -> Self::Key;
}

/// How a mutation settled
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome<T> {
    /// The transform was a no-op; no request was sent
    Unchanged(T),
    /// Server accepted; the optimistic record stands
    Applied(T),
    /// Server accepted and returned the authoritative record
    Confirmed(T),
}

impl<T> MutationOutcome<T> {
    pub fn record(&self) -> &T {
        match self {
            MutationOutcome::Unchanged(r)
            | MutationOutcome::Applied(r)
            | MutationOutcome::Confirmed(r) => r,
        }
    }

    pub fn into_record(self) -> T {
        match self {
            MutationOutcome::Unchanged(r)
            | MutationOutcome::Applied(r)
            | MutationOutcome::Confirmed(r) => r,
        }
    }

    pub fn sent_request(&self) -> bool {
        !matches!(self, MutationOutcome::Unchanged(_))
    }
}

struct Items<T> {
    records: Vec<T>,
    /// Bumped on every wholesale replacement from the server
    generation: u64,
}

impl<T: Keyed> Items<T> {
    /// Put `snapshot` back unless a refresh replaced the records meanwhile
    fn restore(&mut self, key: &T::Key, snapshot: T, generation: u64) {
        if self.generation != generation {
            warn!("Skipping rollback of {}: collection was refreshed", key);
            return;
        }
        if let Some(record) = self.records.iter_mut().find(|r| r.key() == *key) {
            *record = snapshot;
        }
    }
}

type KeyLocks<K> = Arc<StdMutex<HashMap<K, Arc<Mutex<()>>>>>;

/// View-owned collection with optimistic mutations
pub struct OptimisticCollection<T: Keyed> {
    items: Arc<RwLock<Items<T>>>,
    key_locks: KeyLocks<T::Key>,
    sink: EventSink,
}

impl<T: Keyed> Clone for OptimisticCollection<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            key_locks: Arc::clone(&self.key_locks),
            sink: self.sink.clone(),
        }
    }
}

impl<T: Keyed> OptimisticCollection<T> {
    pub fn new(sink: EventSink) -> Self {
        Self::with_items(Vec::new(), sink)
    }

    pub fn with_items(records: Vec<T>, sink: EventSink) -> Self {
        Self {
            items: Arc::new(RwLock::new(Items {
                records,
                generation: 0,
            })),
            key_locks: Arc::new(StdMutex::new(HashMap::new())),
            sink,
        }
    }

    pub fn sink(&self) -> &EventSink {
        &self.sink
    }

    /// Replace the whole collection with fresh server data
    pub async fn replace_all(&self, records: Vec<T>) {
        let mut items = self.items.write().await;
        items.records = records;
        items.generation += 1;
        debug!(
            "Collection replaced: {} records (generation {})",
            items.records.len(),
            items.generation
        );
    }

    /// Insert or replace a single record the server sent back outside a mutation
    pub async fn upsert(&self, record: T) {
        let key = record.key();
        let mut items = self.items.write().await;
        match items.records.iter_mut().find(|r| r.key() == key) {
            Some(slot) => *slot = record,
            None => items.records.push(record),
        }
    }

    pub async fn snapshot(&self) -> Vec<T> {
        self.items.read().await.records.clone()
    }

    pub async fn get(&self, key: &T::Key) -> Option<T> {
        self.items
            .read()
            .await
            .records
            .iter()
            .find(|r| r.key() == *key)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Run an optimistic mutation on the record identified by `key`.
    ///
    /// `apply` edits the record in place and returns whether it changed
    /// anything; returning `false` short-circuits without calling the server.
    /// `op` is the server call; it resolves to the authoritative record when
    /// the server sends one back. Failures are reported on the event sink
    /// under `context`.
    pub async fn mutate<A, F>(
        &self,
        key: &T::Key,
        context: &str,
        apply: A,
        op: F,
    ) -> Result<MutationOutcome<T>, MutationError>
    where
        A: FnOnce(&mut T) -> bool + Send,
        F: Future<Output = Result<Option<T>, ApiError>> + Send,
    {
        let key_lock = KeyLock::acquire(&self.key_locks, key);
        let _guard = key_lock.lock.lock().await;
        self.mutate_locked(key, context, apply, op).await
    }

    async fn mutate_locked<A, F>(
        &self,
        key: &T::Key,
        context: &str,
        apply: A,
        op: F,
    ) -> Result<MutationOutcome<T>, MutationError>
    where
        A: FnOnce(&mut T) -> bool + Send,
        F: Future<Output = Result<Option<T>, ApiError>> + Send,
    {
        let mut pending = {
            let mut items = self.items.write().await;
            let generation = items.generation;
            let record = items
                .records
                .iter_mut()
                .find(|r| r.key() == *key)
                .ok_or_else(|| MutationError::NotFound(key.to_string()))?;

            let before = record.clone();
            if !apply(record) {
                *record = before.clone();
                return Ok(MutationOutcome::Unchanged(before));
            }
            PendingRollback {
                items: &self.items,
                key,
                snapshot: Some(before),
                generation,
            }
        };

        let result = op.await;
        let snapshot = pending.disarm();

        match result {
            Ok(Some(server)) => {
                self.overwrite(key, server.clone()).await;
                Ok(MutationOutcome::Confirmed(server))
            }
            Ok(None) => {
                let current = self
                    .get(key)
                    .await
                    .or(snapshot)
                    .ok_or_else(|| MutationError::NotFound(key.to_string()))?;
                Ok(MutationOutcome::Applied(current))
            }
            Err(err) => {
                if let Some(snapshot) = snapshot {
                    self.items
                        .write()
                        .await
                        .restore(key, snapshot, pending.generation);
                }
                self.sink.report(&err, context);
                Err(MutationError::Rejected(err))
            }
        }
    }

    async fn overwrite(&self, key: &T::Key, record: T) {
        let mut items = self.items.write().await;
        if let Some(slot) = items.records.iter_mut().find(|r| r.key() == *key) {
            *slot = record;
        }
    }
}

/// Snapshot of a record whose server call has not settled yet.
/// Restored on drop unless disarmed.
struct PendingRollback<'a, T: Keyed> {
    items: &'a Arc<RwLock<Items<T>>>,
    key: &'a T::Key,
    snapshot: Option<T>,
    generation: u64,
}

impl<T: Keyed> PendingRollback<'_, T> {
    fn disarm(&mut self) -> Option<T> {
        self.snapshot.take()
    }
}

impl<T: Keyed> Drop for PendingRollback<'_, T> {
    fn drop(&mut self) {
        let Some(snapshot) = self.snapshot.take() else {
            return;
        };
        warn!("Mutation of {} abandoned before the server answered", self.key);

        match self.items.try_write() {
            Ok(mut items) => items.restore(self.key, snapshot, self.generation),
            Err(_) => {
                // Someone holds the lock for a moment; restore once it is free
                let items = Arc::clone(self.items);
                let key = self.key.clone();
                let generation = self.generation;
                match Handle::try_current() {
                    Ok(handle) => {
                        handle.spawn(async move {
                            items.write().await.restore(&key, snapshot, generation);
                        });
                    }
                    Err(_) => warn!("No runtime to restore {}; record left optimistic", key),
                }
            }
        }
    }
}

/// Membership in the per-key lock map. The entry is removed when the last
/// holder lets go, including when the mutation is dropped mid-flight.
struct KeyLock<K: Eq + Hash + Clone> {
    locks: KeyLocks<K>,
    key: K,
    lock: Arc<Mutex<()>>,
}

impl<K: Eq + Hash + Clone> KeyLock<K> {
    fn acquire(locks: &KeyLocks<K>, key: &K) -> Self {
        let mut map = locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let lock = Arc::clone(
            map.entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        );
        Self {
            locks: Arc::clone(locks),
            key: key.clone(),
            lock,
        }
    }
}

impl<K: Eq + Hash + Clone> Drop for KeyLock<K> {
    fn drop(&mut self) {
        let mut map = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Only the map and this holder have it: nobody else is queued
        if Arc::strong_count(&self.lock) == 2 {
            map.remove(&self.key);
        }
    }
}

// ============================================================================
// Keyed impls for API records
// ============================================================================

impl Keyed for Notification {
    type Key = RecordId;

    fn key(&self) -> RecordId {
        self.id.clone()
    }
}

impl Keyed for Quest {
    type Key = RecordId;

    fn key(&self) -> RecordId {
        self.id.clone()
    }
}

impl Keyed for Bid {
    type Key = RecordId;

    fn key(&self) -> RecordId {
        self.id.clone()
    }
}

impl Keyed for Listing {
    type Key = RecordId;

    fn key(&self) -> RecordId {
        self.id.clone()
    }
}

impl Keyed for AdminReview {
    type Key = RecordId;

    fn key(&self) -> RecordId {
        self.id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::UiEvent;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: u32,
        value: &'static str,
    }

    impl Keyed for Item {
        type Key = u32;

        fn key(&self) -> u32 {
            self.id
        }
    }

    fn items() -> Vec<Item> {
        vec![Item { id: 1, value: "a" }, Item { id: 2, value: "b" }]
    }

    fn set(value: &'static str) -> impl FnOnce(&mut Item) -> bool + Send {
        move |item: &mut Item| {
            if item.value == value {
                return false;
            }
            item.value = value;
            true
        }
    }

    #[tokio::test]
    async fn test_success_keeps_optimistic_state() {
        let (sink, _rx) = EventSink::channel();
        let coll = OptimisticCollection::with_items(items(), sink);

        let outcome = coll
            .mutate(&1, "update", set("x"), async { Ok(None) })
            .await
            .unwrap();

        assert_eq!(outcome, MutationOutcome::Applied(Item { id: 1, value: "x" }));
        assert_eq!(coll.get(&1).await.unwrap().value, "x");
    }

    #[tokio::test]
    async fn test_server_record_wins() {
        let (sink, _rx) = EventSink::channel();
        let coll = OptimisticCollection::with_items(items(), sink);

        let outcome = coll
            .mutate(&1, "update", set("x"), async {
                Ok(Some(Item { id: 1, value: "server" }))
            })
            .await
            .unwrap();

        assert!(matches!(outcome, MutationOutcome::Confirmed(_)));
        assert_eq!(coll.get(&1).await.unwrap().value, "server");
    }

    #[tokio::test]
    async fn test_failure_restores_only_target_and_reports() {
        let (sink, mut rx) = EventSink::channel();
        let coll = OptimisticCollection::with_items(items(), sink);

        coll.mutate(&2, "update", set("y"), async { Ok(None) })
            .await
            .unwrap();

        let err = coll
            .mutate(&1, "Failed to update", set("x"), async {
                Err(ApiError::Transport("offline".into()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, MutationError::Rejected(ApiError::Transport(_))));
        assert_eq!(
            coll.snapshot().await,
            vec![Item { id: 1, value: "a" }, Item { id: 2, value: "y" }]
        );
        match rx.try_recv().unwrap() {
            UiEvent::Toast { message, .. } => assert!(message.contains("offline")),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unchanged_skips_request() {
        let (sink, _rx) = EventSink::channel();
        let coll = OptimisticCollection::with_items(items(), sink);
        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);

        let outcome = coll
            .mutate(&1, "update", set("a"), async move {
                flag.store(true, Ordering::SeqCst);
                Ok(None)
            })
            .await
            .unwrap();

        assert!(!outcome.sent_request());
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let (sink, _rx) = EventSink::channel();
        let coll = OptimisticCollection::with_items(items(), sink);
        let err = coll
            .mutate(&9, "update", set("x"), async { Ok(None) })
            .await
            .unwrap_err();
        assert_eq!(err, MutationError::NotFound("9".to_string()));
    }

    #[tokio::test]
    async fn test_same_key_mutations_are_serialized() {
        let (sink, _rx) = EventSink::channel();
        let coll = OptimisticCollection::with_items(items(), sink);
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let first = {
            let coll = coll.clone();
            tokio::spawn(async move {
                coll.mutate(&1, "first", set("first"), async move {
                    let _ = release_rx.await;
                    Err(ApiError::Transport("boom".into()))
                })
                .await
            })
        };
        // Let the first mutation apply and park on its server call
        while coll.get(&1).await.unwrap().value != "first" {
            tokio::task::yield_now().await;
        }

        let second = {
            let coll = coll.clone();
            tokio::spawn(async move {
                coll.mutate(&1, "second", set("second"), async { Ok(None) })
                    .await
            })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        // Second is queued behind the first, not applied on top of it
        assert_eq!(coll.get(&1).await.unwrap().value, "first");

        release_tx.send(()).unwrap();
        assert!(first.await.unwrap().is_err());
        second.await.unwrap().unwrap();

        // First rolled back to "a" before second applied
        assert_eq!(coll.get(&1).await.unwrap().value, "second");
        assert!(coll.key_locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_abandoned_mutation_restores_record() {
        let (sink, _rx) = EventSink::channel();
        let coll = OptimisticCollection::with_items(items(), sink);

        let result = tokio::time::timeout(
            Duration::from_millis(50),
            coll.mutate(&1, "update", set("x"), std::future::pending()),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(coll.get(&1).await.unwrap().value, "a");
        assert!(coll.key_locks.lock().unwrap().is_empty());

        // The key is free for the next mutation
        coll.mutate(&1, "update", set("y"), async { Ok(None) })
            .await
            .unwrap();
        assert_eq!(coll.get(&1).await.unwrap().value, "y");
    }

    #[tokio::test]
    async fn test_aborted_task_releases_queued_key() {
        let (sink, _rx) = EventSink::channel();
        let coll = OptimisticCollection::with_items(items(), sink);

        let stuck = {
            let coll = coll.clone();
            tokio::spawn(async move {
                coll.mutate(&2, "update", set("z"), std::future::pending())
                    .await
            })
        };
        while coll.get(&2).await.unwrap().value != "z" {
            tokio::task::yield_now().await;
        }

        stuck.abort();
        assert!(stuck.await.unwrap_err().is_cancelled());
        assert_eq!(coll.get(&2).await.unwrap().value, "b");
        assert!(coll.key_locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_during_flight_skips_rollback() {
        let (sink, _rx) = EventSink::channel();
        let coll = OptimisticCollection::with_items(items(), sink);
        let refresher = coll.clone();

        let result = coll
            .mutate(&1, "update", set("x"), async move {
                refresher
                    .replace_all(vec![Item { id: 1, value: "fresh" }])
                    .await;
                Err(ApiError::Transport("late".into()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(coll.get(&1).await.unwrap().value, "fresh");
    }
}
