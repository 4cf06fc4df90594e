use thiserror::Error;

/// Failures raised by a document store backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Subscription closed")]
    Closed,
}

#[cfg(feature = "ssr")]
impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<gloo_net::Error> for StoreError {
    fn from(e: gloo_net::Error) -> Self {
        StoreError::Transport(e.to_string())
    }
}

/// A draft that must not reach the store.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name required")]
    NameRequired,

    #[error("rating required")]
    RatingRequired,

    #[error("rating {0} is out of range 1-5")]
    RatingOutOfRange(u8),

    #[error("message required")]
    MessageRequired,
}

impl ValidationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::NameRequired => "Please enter your name",
            ValidationError::RatingRequired | ValidationError::RatingOutOfRange(_) => {
                "Please select a rating"
            }
            ValidationError::MessageRequired => "Please write your review",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReviewError {
    #[error("Invalid review: {0}")]
    Validation(#[from] ValidationError),

    #[error("Write failed: {0}")]
    Write(StoreError),

    #[error("Subscription failed: {0}")]
    Subscription(StoreError),

    #[error("Seeding failed: {0}")]
    Seeding(StoreError),

    #[error("Malformed review document {id}: {reason}")]
    Decode { id: String, reason: String },

    #[error("A submission is already in flight")]
    SubmitInFlight,

    #[error("Rejected review: {0}")]
    Rejected(String),
}

impl ReviewError {
    /// Local failures that never touched the store.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ReviewError::Validation(_) | ReviewError::SubmitInFlight | ReviewError::Rejected(_)
        )
    }

    /// Text shown in the form or feed banner.
    pub fn user_message(&self) -> String {
        match self {
            ReviewError::Validation(v) => v.user_message().to_string(),
            ReviewError::Write(_) => {
                "Failed to submit review. Please check your connection and try again.".to_string()
            }
            ReviewError::Subscription(_) => {
                "Failed to load reviews. Please refresh the page.".to_string()
            }
            ReviewError::SubmitInFlight => "Your review is already being submitted.".to_string(),
            other => other.to_string(),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub type Result<T> = std::result::Result<T, ReviewError>;
