//! Reads and writes against the reviews collection.
use futures::Stream;
use leptos::logging::{error, log, warn};
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::{ReviewError, Result};
use crate::models::review::{NewReview, Review, ReviewSubmission, TIMESTAMP_FIELD};
use crate::models::service::Service;
use crate::store::document::{Document, DocumentStore, Fields, Query};
use crate::store::listeners::{Subscription, SubscriptionHandle};

pub const DEFAULT_COLLECTION: &str = "reviews";

/// Sample reviews inserted once so a fresh site never shows an empty feed.
pub fn seed_reviews() -> Vec<NewReview> {
    vec![
        NewReview::seed(
            "Rajesh Kumar",
            5,
            "Excellent service! Dhiraj sir helped us register our company smoothly and efficiently.",
            Service::CompanyFormation,
        ),
        NewReview::seed(
            "Priya Sharma",
            5,
            "Very professional and knowledgeable. Made GST registration process very simple.",
            Service::GstRegistration,
        ),
        NewReview::seed(
            "Amit Patel",
            5,
            "Great tax planning advice that saved us significant amount. Highly recommended!",
            Service::TaxPlanning,
        ),
        NewReview::seed(
            "Sunita Gupta",
            4,
            "Professional audit services with detailed reporting. Very satisfied with the work.",
            Service::AuditServices,
        ),
        NewReview::seed(
            "Vikram Singh",
            5,
            "Quick and accurate tax filing. No hassles, everything was handled professionally.",
            Service::Other,
        ),
    ]
}

/// Turns a client-supplied body into a review the server is willing to store.
///
/// The result never carries a client timestamp. A sample flag is honoured only
/// when `allow_seed` is set and the body is one of [`seed_reviews`]; a claimed
/// sample that is not one is rejected.
pub fn accept_submission(fields: Fields, allow_seed: bool) -> Result<NewReview> {
    let submission = ReviewSubmission::from_fields(fields)?;
    let review = submission.draft.validate()?;
    if !submission.is_seed {
        return Ok(review);
    }
    if !allow_seed {
        warn!("[REVIEWS] Dropping sample flag from '{}'", review.name);
        return Ok(review);
    }
    seed_reviews()
        .into_iter()
        .find(|seed| {
            seed.name == review.name
                && seed.message == review.message
                && seed.rating == review.rating
                && seed.service == review.service
        })
        .ok_or_else(|| ReviewError::Rejected(format!("'{}' is not a sample review", review.name)))
}

/// Decodes documents, dropping the ones that break the review invariants.
pub fn decode_documents(docs: Vec<Document>) -> Vec<Review> {
    docs.into_iter()
        .filter_map(|doc| match Review::from_document(doc) {
            Ok(review) => Some(review),
            Err(e) => {
                warn!("[REVIEWS] Skipping document: {}", e);
                None
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct ReviewRepository<S> {
    store: S,
    collection: String,
}

impl<S: DocumentStore> ReviewRepository<S> {
    pub fn new(store: S) -> Self {
        Self::with_collection(store, DEFAULT_COLLECTION)
    }

    pub fn with_collection(store: S, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Inserts the missing sample reviews; safe to call on every page load.
    ///
    /// Best effort: failures are logged and reported as zero insertions.
    pub async fn ensure_seeded(&self) -> usize {
        match self.try_ensure_seeded().await {
            Ok(inserted) => inserted,
            Err(e) => {
                error!("[REVIEWS] Seeding skipped: {}", e);
                0
            }
        }
    }

    /// Seeding with the failure surfaced, for callers that want it.
    pub async fn try_ensure_seeded(&self) -> Result<usize> {
        let existing = self
            .store
            .fetch_all(&self.collection)
            .await
            .map_err(ReviewError::Seeding)?;
        let existing = decode_documents(existing);

        // name + message equality is the only duplicate guard; it is not atomic
        // with concurrent submissions.
        let missing = seed_reviews()
            .into_iter()
            .filter(|seed| !existing.iter().any(|r| seed.matches(r)))
            .map(|seed| seed.to_document())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ReviewError::Seeding(e.into()))?;

        if missing.is_empty() {
            return Ok(0);
        }
        let inserted = self
            .store
            .insert_batch(&self.collection, missing)
            .await
            .map_err(ReviewError::Seeding)?;
        log!("[REVIEWS] Seeded {} sample reviews", inserted.len());
        Ok(inserted.len())
    }

    /// Opens a live, newest-first view of the collection.
    pub async fn subscribe(&self, limit: Option<usize>) -> ReviewStream {
        let query = Query::newest_first(TIMESTAMP_FIELD, limit);
        let inner = self.store.subscribe(&self.collection, query).await;
        ReviewStream { inner }
    }

    /// Writes one review. No retry: a failure leaves nothing behind.
    pub async fn submit(&self, review: &NewReview) -> Result<Review> {
        let doc = review
            .to_document()
            .map_err(|e| ReviewError::Write(e.into()))?;
        let stored = self
            .store
            .insert(&self.collection, doc)
            .await
            .map_err(ReviewError::Write)?;
        log!("[REVIEWS] Review {} submitted", stored.id);
        Review::from_document(stored)
    }

    /// One-shot read of the whole collection, newest first.
    pub async fn list(&self, limit: Option<usize>) -> Result<Vec<Review>> {
        let query = Query::newest_first(TIMESTAMP_FIELD, limit);
        let docs = self
            .store
            .query(&self.collection, &query)
            .await
            .map_err(ReviewError::Subscription)?;
        Ok(decode_documents(docs))
    }
}

/// Stream of decoded snapshots for one live query.
///
/// Yields `Err` once if the store drops the query, then ends.
pub struct ReviewStream {
    inner: Subscription,
}

impl ReviewStream {
    pub fn handle(&self) -> SubscriptionHandle {
        self.inner.handle()
    }

    pub fn unsubscribe(self) {
        self.inner.unsubscribe();
    }
}

impl Stream for ReviewStream {
    type Item = Result<Vec<Review>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx).map(|item| {
            item.map(|snapshot| {
                snapshot
                    .map(decode_documents)
                    .map_err(ReviewError::Subscription)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, ValidationError};
    use crate::models::review::ReviewDraft;
    use crate::store::memory::MemoryStore;
    use futures::StreamExt;

    fn repo() -> (MemoryStore, ReviewRepository<MemoryStore>) {
        let store = MemoryStore::new();
        (store.clone(), ReviewRepository::new(store))
    }

    fn draft(name: &str, rating: u8, message: &str) -> NewReview {
        ReviewDraft {
            name: name.into(),
            rating,
            message: message.into(),
            ..Default::default()
        }
        .validate()
        .unwrap()
    }

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_accept_submission_strips_client_timestamp_and_seed_flag() {
        let review = accept_submission(
            fields(serde_json::json!({
                "name": " Spam ",
                "rating": 5,
                "message": "pinned",
                "timestamp": "2099-01-01T00:00:00.000000Z",
                "isSeed": true
            })),
            false,
        )
        .unwrap();
        assert_eq!(review.name, "Spam");
        assert_eq!(review.is_seed, None);

        let doc = review.to_document().unwrap();
        assert!(!doc.fields.contains_key("timestamp"));
        assert_eq!(doc.server_timestamp.as_deref(), Some(TIMESTAMP_FIELD));
    }

    #[test]
    fn test_accept_submission_rejects_invalid_reviews() {
        let err = accept_submission(fields(serde_json::json!({"rating": 0, "message": ""})), false)
            .unwrap_err();
        assert!(matches!(err, ReviewError::Validation(ValidationError::NameRequired)));

        let err = accept_submission(
            fields(serde_json::json!({"name": "A", "rating": 0, "message": "m"})),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, ReviewError::Validation(ValidationError::RatingRequired)));

        let err = accept_submission(
            fields(serde_json::json!({"name": "A", "rating": 9, "message": "m"})),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, ReviewError::Validation(ValidationError::RatingOutOfRange(9))));

        let err = accept_submission(
            fields(serde_json::json!({"name": "A", "rating": "five", "message": "m"})),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, ReviewError::Decode { .. }));
    }

    #[test]
    fn test_sample_flag_only_for_known_samples() {
        let seed = seed_reviews().remove(0);
        let doc = seed.to_document().unwrap();
        let accepted = accept_submission(doc.fields, true).unwrap();
        assert_eq!(accepted, seed);

        let forged = fields(serde_json::json!({
            "name": "Spam", "rating": 5, "message": "pinned", "isSeed": true
        }));
        assert!(matches!(
            accept_submission(forged, true),
            Err(ReviewError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_seeding_is_idempotent() {
        let (store, repo) = repo();
        assert_eq!(repo.ensure_seeded().await, 5);
        for _ in 0..4 {
            assert_eq!(repo.ensure_seeded().await, 0);
        }
        let all = repo.list(None).await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.iter().all(|r| r.is_seed));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_seeding_only_fills_gaps() {
        let (store, repo) = repo();
        let seeds = seed_reviews();
        repo.submit(&seeds[0]).await.unwrap();
        assert_eq!(repo.ensure_seeded().await, 4);
        assert_eq!(store.len(DEFAULT_COLLECTION), 5);
    }

    #[tokio::test]
    async fn test_seeding_failure_is_swallowed() {
        let (store, repo) = repo();
        store.fail_reads(Some(StoreError::Unavailable("offline".into())));
        assert_eq!(repo.ensure_seeded().await, 0);
        assert!(matches!(
            repo.try_ensure_seeded().await,
            Err(ReviewError::Seeding(_))
        ));
        assert!(store.is_empty(DEFAULT_COLLECTION));
    }

    #[tokio::test]
    async fn test_subscribe_orders_newest_first() {
        let (_, repo) = repo();
        for name in ["t1", "t2", "t3"] {
            repo.submit(&draft(name, 5, "ok")).await.unwrap();
        }
        let mut stream = repo.subscribe(None).await;
        let names: Vec<String> = stream
            .next()
            .await
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["t3", "t2", "t1"]);
    }

    #[tokio::test]
    async fn test_bounded_subscription_caps_length() {
        let (_, repo) = repo();
        repo.ensure_seeded().await;
        for i in 0..3 {
            repo.submit(&draft(&format!("n{i}"), 3, "ok")).await.unwrap();
        }
        let mut stream = repo.subscribe(Some(5)).await;
        let snapshot = stream.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 5);
        assert_eq!(snapshot[0].name, "n2");
    }

    #[tokio::test]
    async fn test_unsubscribe_releases_listener() {
        let (store, repo) = repo();
        let mut stream = repo.subscribe(None).await;
        let _ = stream.next().await;
        assert_eq!(store.active_listeners(), 1);
        stream.unsubscribe();
        assert_eq!(store.active_listeners(), 0);

        repo.submit(&draft("late", 5, "ok")).await.unwrap();
        assert_eq!(store.active_listeners(), 0);
    }

    #[tokio::test]
    async fn test_submit_then_snapshot_contains_exactly_one() {
        let (_, repo) = repo();
        let mut stream = repo.subscribe(None).await;
        let _ = stream.next().await;

        let written = repo
            .submit(&draft("  Meera  ", 5, " Smooth GST filing "))
            .await
            .unwrap();
        let snapshot = stream.next().await.unwrap().unwrap();
        let matching: Vec<_> = snapshot
            .iter()
            .filter(|r| r.name == "Meera" && r.message == "Smooth GST filing")
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].id, written.id);
        assert!(!written.is_seed);
    }

    #[tokio::test]
    async fn test_submit_failure_propagates_without_writing() {
        let (store, repo) = repo();
        store.fail_writes(Some(StoreError::Transport("timeout".into())));
        let result = repo.submit(&draft("A", 5, "m")).await;
        assert!(matches!(result, Err(ReviewError::Write(_))));
        assert!(store.is_empty(DEFAULT_COLLECTION));
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces_on_stream() {
        let (store, repo) = repo();
        let mut stream = repo.subscribe(None).await;
        let _ = stream.next().await;
        store.drop_subscriptions(StoreError::Transport("reset".into()));
        assert!(matches!(
            stream.next().await,
            Some(Err(ReviewError::Subscription(_)))
        ));
        assert!(stream.next().await.is_none());
    }
}
