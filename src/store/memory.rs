use leptos::logging::log;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::store::document::{Document, DocumentStore, NewDocument, Query, ServerClock};
use crate::store::listeners::{Listeners, Subscription};

#[derive(Default)]
struct MemoryState {
    // Insertion order per collection.
    collections: HashMap<String, Vec<Document>>,
    clock: ServerClock,
    writes: usize,
    fail_writes: Option<StoreError>,
    fail_reads: Option<StoreError>,
}

/// In-process document store.
///
/// Backs the test suite and works as a throwaway backend; the fault switches
/// let callers rehearse connectivity failures.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    listeners: Listeners,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every following write fail with `error` until cleared.
    pub fn fail_writes(&self, error: Option<StoreError>) {
        self.lock().fail_writes = error;
    }

    /// Makes every following read (and live query setup) fail until cleared.
    pub fn fail_reads(&self, error: Option<StoreError>) {
        self.lock().fail_reads = error;
    }

    /// Cuts every open live query with `error`.
    pub fn drop_subscriptions(&self, error: StoreError) {
        self.listeners.fail_all(error);
    }

    /// Number of committed write operations (a batch counts once).
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    pub fn len(&self, collection: &str) -> usize {
        self.lock()
            .collections
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn commit(&self, collection: &str, documents: Vec<NewDocument>) -> StoreResult<Vec<Document>> {
        let written = {
            let mut state = self.lock();
            if let Some(e) = state.fail_writes.clone() {
                return Err(e);
            }
            let written: Vec<Document> = documents
                .into_iter()
                .map(|d| {
                    let now = state.clock.tick();
                    d.into_document(Uuid::new_v4().to_string(), now)
                })
                .collect();
            state
                .collections
                .entry(collection.to_string())
                .or_default()
                .extend(written.iter().cloned());
            state.writes += 1;
            written
        };
        self.publish(collection);
        Ok(written)
    }

    fn snapshot(&self, collection: &str) -> Vec<Document> {
        self.lock()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn publish(&self, collection: &str) {
        let docs = self.snapshot(collection);
        self.listeners
            .notify(collection, |query| Ok(query.apply(docs.clone())));
    }

    fn check_reads(&self) -> StoreResult<()> {
        match self.lock().fail_reads.clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, document: NewDocument) -> StoreResult<Document> {
        let mut written = self.commit(collection, vec![document])?;
        written.pop().ok_or(StoreError::Closed)
    }

    async fn insert_batch(
        &self,
        collection: &str,
        documents: Vec<NewDocument>,
    ) -> StoreResult<Vec<Document>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        log!("[STORE] Batch of {} documents into '{}'", documents.len(), collection);
        self.commit(collection, documents)
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        self.check_reads()?;
        Ok(query.apply(self.snapshot(collection)))
    }

    async fn fetch_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.check_reads()?;
        Ok(self.snapshot(collection))
    }

    async fn subscribe(&self, collection: &str, query: Query) -> Subscription {
        let initial = self
            .check_reads()
            .map(|()| query.apply(self.snapshot(collection)));
        self.listeners.register(collection, query, initial)
    }

    fn active_listeners(&self) -> usize {
        self.listeners.active_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::document::Fields;
    use futures::StreamExt;
    use serde_json::json;

    fn named(name: &str) -> NewDocument {
        let mut fields = Fields::new();
        fields.insert("name".into(), json!(name));
        NewDocument::new(fields).with_server_timestamp("timestamp")
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamp() {
        let store = MemoryStore::new();
        let doc = store.insert("reviews", named("a")).await.unwrap();
        assert!(!doc.id.is_empty());
        assert!(doc.fields.contains_key("timestamp"));
        assert_eq!(store.len("reviews"), 1);
    }

    #[tokio::test]
    async fn test_failed_batch_writes_nothing() {
        let store = MemoryStore::new();
        store.fail_writes(Some(StoreError::Unavailable("offline".into())));
        let result = store
            .insert_batch("reviews", vec![named("a"), named("b")])
            .await;
        assert!(result.is_err());
        assert!(store.is_empty("reviews"));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_subscription_sees_writes_in_order() {
        let store = MemoryStore::new();
        store.insert("reviews", named("old")).await.unwrap();
        let mut sub = store
            .subscribe("reviews", Query::newest_first("timestamp", None))
            .await;
        assert_eq!(sub.next().await.unwrap().unwrap().len(), 1);

        store.insert("reviews", named("new")).await.unwrap();
        let snapshot = sub.next().await.unwrap().unwrap();
        assert_eq!(snapshot[0].fields["name"], json!("new"));
        assert_eq!(snapshot[1].fields["name"], json!("old"));
    }

    #[tokio::test]
    async fn test_failed_reads_fail_live_query_setup() {
        let store = MemoryStore::new();
        store.fail_reads(Some(StoreError::Unavailable("offline".into())));
        let mut sub = store
            .subscribe("reviews", Query::newest_first("timestamp", None))
            .await;
        assert!(sub.next().await.unwrap().is_err());
        assert_eq!(store.active_listeners(), 0);
    }
}
