//! Submission of a review form: validate, write, reconcile locally.
use leptos::logging::warn;

use crate::error::{Result, ReviewError};
use crate::feed::Feed;
use crate::models::review::{NewReview, Review, ReviewDraft};
use crate::repository::ReviewRepository;
use crate::store::document::DocumentStore;

pub const SUCCESS_MESSAGE: &str = "Thank you! Your review has been submitted successfully.";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SubmitState {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed(String),
}

/// Form draft plus the state machine
/// `Idle -> Validating -> Submitting -> {Succeeded, Failed} -> Idle`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubmissionWorkflow {
    draft: ReviewDraft,
    state: SubmitState,
}

impl SubmissionWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &ReviewDraft {
        &self.draft
    }

    pub fn state(&self) -> &SubmitState {
        &self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == SubmitState::Submitting
    }

    pub fn succeeded(&self) -> bool {
        self.state == SubmitState::Succeeded
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            SubmitState::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    /// Edits the draft. Counts as a new interaction, so any banner goes away.
    /// Ignored while a write is in flight.
    pub fn edit(&mut self, f: impl FnOnce(&mut ReviewDraft)) {
        if self.is_submitting() {
            return;
        }
        f(&mut self.draft);
        self.state = SubmitState::Idle;
    }

    /// Validates the draft and latches into `Submitting`.
    pub fn begin(&mut self) -> Result<NewReview> {
        if self.is_submitting() {
            return Err(ReviewError::SubmitInFlight);
        }
        self.state = SubmitState::Validating;
        match self.draft.validate() {
            Ok(review) => {
                self.state = SubmitState::Submitting;
                Ok(review)
            }
            Err(e) => {
                self.state = SubmitState::Failed(e.user_message().to_string());
                Err(e.into())
            }
        }
    }

    /// Records the write outcome. The draft is cleared only on success.
    pub fn complete(&mut self, outcome: &Result<Review>) {
        match outcome {
            Ok(_) => {
                self.draft = ReviewDraft::default();
                self.state = SubmitState::Succeeded;
            }
            Err(e) => {
                warn!("[REVIEWS] Submission failed: {}", e);
                self.state = SubmitState::Failed(e.user_message());
            }
        }
    }

    /// Drops the success banner once its display time is over.
    pub fn expire_success(&mut self) {
        if self.succeeded() {
            self.state = SubmitState::Idle;
        }
    }

    /// Full round trip for callers that own the feed directly.
    pub async fn submit<S: DocumentStore>(
        &mut self,
        repository: &ReviewRepository<S>,
        feed: &mut Feed,
    ) -> Result<Review> {
        let review = self.begin()?;
        let outcome = repository.submit(&review).await;
        if let Ok(written) = &outcome {
            feed.insert_optimistic(written.clone());
        }
        self.complete(&outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, ValidationError};
    use crate::models::service::Service;
    use crate::store::memory::MemoryStore;

    fn filled(workflow: &mut SubmissionWorkflow) {
        workflow.edit(|d| {
            d.name = "Kavya Iyer".into();
            d.rating = 5;
            d.service = Some(Service::IncomeTaxFiling);
            d.message = "Filed on time".into();
        });
    }

    #[tokio::test]
    async fn test_success_clears_draft_and_updates_feed() {
        let store = MemoryStore::new();
        let repo = ReviewRepository::new(store.clone());
        let mut feed = Feed::bounded(5);
        let mut workflow = SubmissionWorkflow::new();
        filled(&mut workflow);

        let review = workflow.submit(&repo, &mut feed).await.unwrap();
        assert!(workflow.succeeded());
        assert!(workflow.draft().is_blank());
        assert_eq!(feed.current()[0].id, review.id);
        assert_eq!(review.service, Service::IncomeTaxFiling);

        workflow.expire_success();
        assert_eq!(workflow.state(), &SubmitState::Idle);
    }

    #[tokio::test]
    async fn test_validation_failure_never_reaches_store() {
        let store = MemoryStore::new();
        let repo = ReviewRepository::new(store.clone());
        let mut feed = Feed::unbounded();
        let mut workflow = SubmissionWorkflow::new();
        workflow.edit(|d| {
            d.name = "Kavya".into();
            d.message = "No stars".into();
        });

        let result = workflow.submit(&repo, &mut feed).await;
        assert_eq!(
            result,
            Err(ReviewError::Validation(ValidationError::RatingRequired))
        );
        assert_eq!(workflow.error_message(), Some("Please select a rating"));
        assert_eq!(store.write_count(), 0);
        assert!(feed.is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_keeps_draft() {
        let store = MemoryStore::new();
        store.fail_writes(Some(StoreError::Transport("offline".into())));
        let repo = ReviewRepository::new(store.clone());
        let mut feed = Feed::unbounded();
        let mut workflow = SubmissionWorkflow::new();
        filled(&mut workflow);
        let before = workflow.draft().clone();

        let result = workflow.submit(&repo, &mut feed).await;
        assert!(matches!(result, Err(ReviewError::Write(_))));
        assert_eq!(workflow.draft(), &before);
        assert_eq!(
            workflow.error_message(),
            Some("Failed to submit review. Please check your connection and try again.")
        );
        assert!(feed.is_empty());
    }

    #[test]
    fn test_second_submit_is_latched() {
        let mut workflow = SubmissionWorkflow::new();
        filled(&mut workflow);
        assert!(workflow.begin().is_ok());
        assert!(workflow.is_submitting());
        assert_eq!(workflow.begin(), Err(ReviewError::SubmitInFlight));

        // Edits are ignored mid-flight.
        workflow.edit(|d| d.name.clear());
        assert_eq!(workflow.draft().name, "Kavya Iyer");
    }

    #[test]
    fn test_edit_clears_error_banner() {
        let mut workflow = SubmissionWorkflow::new();
        assert!(workflow.begin().is_err());
        assert_eq!(workflow.error_message(), Some("Please enter your name"));
        workflow.edit(|d| d.name = "K".into());
        assert_eq!(workflow.state(), &SubmitState::Idle);
    }
}
