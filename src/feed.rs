//! In-memory view of the reviews collection for one presentation surface.
use leptos::logging::warn;

use crate::error::ReviewError;
use crate::models::review::Review;
use crate::stats::ReviewStats;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FeedStatus {
    #[default]
    Loading,
    Ready,
    Failed(String),
}

/// Latest snapshot, replaced wholesale on every store notification.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feed {
    limit: Option<usize>,
    reviews: Vec<Review>,
    status: FeedStatus,
}

impl Feed {
    /// Most recent `limit` reviews, as the carousel shows.
    pub fn bounded(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn current(&self) -> &[Review] {
        &self.reviews
    }

    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == FeedStatus::Loading
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    /// Takes one item from the live query. Snapshots replace everything held,
    /// which also absorbs any optimistic entry already present.
    pub fn apply(&mut self, update: Result<Vec<Review>, ReviewError>) {
        match update {
            Ok(mut reviews) => {
                if let Some(limit) = self.limit {
                    reviews.truncate(limit);
                }
                self.reviews = reviews;
                self.status = FeedStatus::Ready;
            }
            Err(e) => {
                warn!("[FEED] Keeping last snapshot: {}", e);
                self.status = FeedStatus::Failed(e.user_message());
            }
        }
    }

    /// Puts a just-written review at the front ahead of the next snapshot.
    pub fn insert_optimistic(&mut self, review: Review) {
        self.reviews.retain(|r| r.id != review.id);
        self.reviews.insert(0, review);
        if let Some(limit) = self.limit {
            self.reviews.truncate(limit);
        }
    }

    pub fn stats(&self) -> ReviewStats {
        ReviewStats::compute(&self.reviews)
    }
}

/// Slide pointer for the rotating carousel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Carousel {
    index: usize,
}

impl Carousel {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Rotation only makes sense with more than one slide.
    pub fn rotates(len: usize) -> bool {
        len > 1
    }

    pub fn advance(&mut self, len: usize) {
        self.index = if len == 0 { 0 } else { (self.index + 1) % len };
    }

    pub fn previous(&mut self, len: usize) {
        self.index = if len == 0 { 0 } else { (self.index + len - 1) % len };
    }

    pub fn go_to(&mut self, index: usize, len: usize) {
        if index < len {
            self.index = index;
        }
    }

    /// Resets the pointer when the feed shrank beneath it.
    pub fn clamp(&mut self, len: usize) {
        if self.index >= len {
            self.index = 0;
        }
    }
}
