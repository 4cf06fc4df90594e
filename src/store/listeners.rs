//! Live-query bookkeeping shared by every store backend.
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::Stream;
use leptos::logging::log;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use crate::error::{StoreError, StoreResult};
use crate::store::document::{Document, Query};

pub type SnapshotResult = StoreResult<Vec<Document>>;

struct Listener {
    collection: String,
    query: Query,
    tx: UnboundedSender<SnapshotResult>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: HashMap<u64, Listener>,
}

/// Registered live queries of one store.
#[derive(Clone, Default)]
pub struct Listeners {
    inner: Arc<Mutex<Registry>>,
}

impl Listeners {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a live query and primes it with `initial`.
    pub fn register(&self, collection: &str, query: Query, initial: SnapshotResult) -> Subscription {
        let (tx, rx) = mpsc::unbounded();
        let failed = initial.is_err();
        // Receiver is alive, so the send cannot fail.
        let _ = tx.unbounded_send(initial);

        let id = {
            let mut registry = self.lock();
            registry.next_id += 1;
            let id = registry.next_id;
            if !failed {
                registry.entries.insert(
                    id,
                    Listener {
                        collection: collection.to_string(),
                        query,
                        tx,
                    },
                );
            }
            id
        };
        log!("[STORE] Live query {} opened on '{}'", id, collection);

        Subscription {
            rx,
            handle: SubscriptionHandle {
                id,
                listeners: self.clone(),
            },
            finished: false,
        }
    }

    /// Drops a live query. Returns false if it was already gone.
    pub fn release(&self, id: u64) -> bool {
        let removed = self.lock().entries.remove(&id).is_some();
        if removed {
            log!("[STORE] Live query {} released", id);
        }
        removed
    }

    pub fn is_active(&self, id: u64) -> bool {
        self.lock().entries.contains_key(&id)
    }

    pub fn active_count(&self) -> usize {
        self.lock().entries.len()
    }

    /// The query of one live query, if still registered.
    pub fn query_of(&self, id: u64) -> Option<(String, Query)> {
        self.lock()
            .entries
            .get(&id)
            .map(|l| (l.collection.clone(), l.query.clone()))
    }

    /// Pushes a result to one live query. An error ends that live query.
    pub fn send(&self, id: u64, result: SnapshotResult) {
        let mut registry = self.lock();
        let is_err = result.is_err();
        let delivered = registry
            .entries
            .get(&id)
            .map(|l| l.tx.unbounded_send(result).is_ok())
            .unwrap_or(false);
        if is_err || !delivered {
            registry.entries.remove(&id);
        }
    }

    /// Re-runs every live query on `collection` and pushes the fresh results.
    pub fn notify<F>(&self, collection: &str, mut run: F)
    where
        F: FnMut(&Query) -> SnapshotResult,
    {
        let mut registry = self.lock();
        let mut closed = Vec::new();
        for (id, listener) in registry.entries.iter() {
            if listener.collection != collection {
                continue;
            }
            let result = run(&listener.query);
            let is_err = result.is_err();
            if listener.tx.unbounded_send(result).is_err() || is_err {
                closed.push(*id);
            }
        }
        for id in closed {
            registry.entries.remove(&id);
        }
    }

    /// Terminates every live query with `error`.
    pub fn fail_all(&self, error: StoreError) {
        let mut registry = self.lock();
        for (_, listener) in registry.entries.drain() {
            let _ = listener.tx.unbounded_send(Err(error.clone()));
        }
    }
}

/// Release handle for a live query; cloneable so a surface can keep it while
/// the stream itself is consumed elsewhere.
#[derive(Clone)]
pub struct SubscriptionHandle {
    id: u64,
    listeners: Listeners,
}

impl SubscriptionHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn release(&self) -> bool {
        self.listeners.release(self.id)
    }

    pub fn is_active(&self) -> bool {
        self.listeners.is_active(self.id)
    }
}

/// Stream of query results for one live query.
///
/// Ends after an error or once released. Dropping it releases the live query.
pub struct Subscription {
    rx: UnboundedReceiver<SnapshotResult>,
    handle: SubscriptionHandle,
    finished: bool,
}

impl Subscription {
    pub fn handle(&self) -> SubscriptionHandle {
        self.handle.clone()
    }

    pub fn unsubscribe(self) {
        // Drop does the release.
    }
}

impl Stream for Subscription {
    type Item = SnapshotResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match Pin::new(&mut self.rx).poll_next(cx) {
            Poll::Ready(Some(Err(e))) => {
                self.finished = true;
                self.handle.release();
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                self.finished = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.release();
    }
}
