//! Browser-side store: the server's document endpoints over HTTP.
use gloo_net::http::{Request, Response};
use gloo_timers::future::TimeoutFuture;
use leptos::logging::{log, warn};
use serde::de::DeserializeOwned;
use std::time::Duration;
use wasm_bindgen_futures::spawn_local;

use crate::error::{StoreError, StoreResult};
use crate::store::document::{Direction, Document, DocumentStore, NewDocument, Query};
use crate::store::listeners::{Listeners, Subscription};

/// Live queries are served by polling; a new snapshot is pushed only when the
/// result differs from the last one delivered.
#[derive(Clone)]
pub struct HttpStore {
    base_url: String,
    poll_interval: Duration,
    listeners: Listeners,
}

impl HttpStore {
    /// `base_url` may be empty to address the page's own origin.
    pub fn new(base_url: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            poll_interval,
            listeners: Listeners::default(),
        }
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/api/collections/{}/documents",
            self.base_url,
            urlencoding::encode(collection)
        )
    }

    fn batch_url(&self, collection: &str) -> String {
        format!(
            "{}/api/collections/{}/batch",
            self.base_url,
            urlencoding::encode(collection)
        )
    }

    pub fn query_url(&self, collection: &str, query: &Query) -> String {
        let direction = match query.direction {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        };
        let mut url = format!(
            "{}?order_by={}&direction={}",
            self.documents_url(collection),
            urlencoding::encode(&query.order_by),
            direction
        );
        if let Some(limit) = query.limit {
            url.push_str(&format!("&limit={}", limit));
        }
        url
    }

    async fn read<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
        if !response.ok() {
            return Err(StoreError::Transport(format!(
                "server returned {} {}",
                response.status(),
                response.status_text()
            )));
        }
        Ok(response.json::<T>().await?)
    }

    async fn get<T: DeserializeOwned>(url: &str) -> StoreResult<T> {
        let response = Request::get(url).send().await?;
        Self::read(response).await
    }

    fn spawn_poller(&self, id: u64, mut last: Vec<Document>) {
        let store = self.clone();
        let interval = u32::try_from(self.poll_interval.as_millis()).unwrap_or(u32::MAX);
        spawn_local(async move {
            loop {
                TimeoutFuture::new(interval).await;
                let Some((collection, query)) = store.listeners.query_of(id) else {
                    break;
                };
                match store.query(&collection, &query).await {
                    Ok(docs) if docs == last => {}
                    Ok(docs) => {
                        last = docs.clone();
                        store.listeners.send(id, Ok(docs));
                    }
                    Err(e) => {
                        warn!("[STORE] Live query {} lost: {}", id, e);
                        store.listeners.send(id, Err(e));
                        break;
                    }
                }
            }
            log!("[STORE] Poller {} stopped", id);
        });
    }
}

impl DocumentStore for HttpStore {
    async fn insert(&self, collection: &str, document: NewDocument) -> StoreResult<Document> {
        let response = Request::post(&self.documents_url(collection))
            .json(&document)?
            .send()
            .await?;
        Self::read(response).await
    }

    async fn insert_batch(
        &self,
        collection: &str,
        documents: Vec<NewDocument>,
    ) -> StoreResult<Vec<Document>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let response = Request::post(&self.batch_url(collection))
            .json(&documents)?
            .send()
            .await?;
        Self::read(response).await
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        Self::get(&self.query_url(collection, query)).await
    }

    async fn fetch_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        Self::get(&self.documents_url(collection)).await
    }

    async fn subscribe(&self, collection: &str, query: Query) -> Subscription {
        let initial = self.query(collection, &query).await;
        let last = initial.as_ref().ok().cloned();
        let subscription = self.listeners.register(collection, query, initial);
        if let Some(last) = last {
            self.spawn_poller(subscription.handle().id(), last);
        }
        subscription
    }

    fn active_listeners(&self) -> usize {
        self.listeners.active_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_url_encodes_parameters() {
        let store = HttpStore::new("http://localhost:3004/", Duration::from_secs(2));
        let url = store.query_url("site reviews", &Query::newest_first("timestamp", Some(5)));
        assert_eq!(
            url,
            "http://localhost:3004/api/collections/site%20reviews/documents?order_by=timestamp&direction=desc&limit=5"
        );
    }

    #[test]
    fn test_relative_base_url() {
        let store = HttpStore::new("", Duration::from_secs(2));
        assert_eq!(
            store.query_url("reviews", &Query::newest_first("timestamp", None)),
            "/api/collections/reviews/documents?order_by=timestamp&direction=desc"
        );
    }
}
