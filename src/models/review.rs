// src/models/review.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ReviewError, ValidationError};
use crate::models::service::Service;
use crate::store::document::{Document, Fields, NewDocument};

pub const TIMESTAMP_FIELD: &str = "timestamp";

/// A persisted review, normalized at the repository boundary.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub name: String,
    pub rating: u8,
    pub message: String,
    pub service: Service,
    pub email: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub is_seed: bool,
}

// Raw document shape, tolerant of the older field names.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredReview {
    name: String,
    rating: i64,
    message: String,
    #[serde(default)]
    service: Option<Service>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, alias = "date")]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default, alias = "isPredefined")]
    is_seed: Option<bool>,
}

impl Review {
    /// Normalizes a stored document into the full review shape.
    pub fn from_document(doc: Document) -> Result<Review, ReviewError> {
        let decode_err = |reason: String| ReviewError::Decode {
            id: doc.id.clone(),
            reason,
        };
        let stored: StoredReview = serde_json::from_value(Value::Object(doc.fields.clone()))
            .map_err(|e| decode_err(e.to_string()))?;

        let rating = u8::try_from(stored.rating)
            .ok()
            .filter(|r| (1..=5).contains(r))
            .ok_or_else(|| decode_err(format!("rating {} out of range", stored.rating)))?;
        if stored.name.trim().is_empty() {
            return Err(decode_err("empty name".to_string()));
        }
        if stored.message.trim().is_empty() {
            return Err(decode_err("empty message".to_string()));
        }

        Ok(Review {
            id: doc.id,
            name: stored.name,
            rating,
            message: stored.message,
            service: stored.service.unwrap_or_default(),
            email: stored.email.filter(|e| !e.trim().is_empty()),
            timestamp: stored.timestamp.unwrap_or_else(Utc::now),
            is_seed: stored.is_seed.unwrap_or(false),
        })
    }

    /// Avatar text: first letter of each word of the name.
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|w| w.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }
}

/// A validated review ready to be written.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub name: String,
    pub rating: u8,
    pub message: String,
    pub service: Service,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_seed: Option<bool>,
}

impl NewReview {
    pub fn seed(name: &str, rating: u8, message: &str, service: Service) -> Self {
        Self {
            name: name.to_string(),
            rating,
            message: message.to_string(),
            service,
            email: None,
            is_seed: Some(true),
        }
    }

    /// Same reviewer and same text, the identity used for seeding.
    pub fn matches(&self, review: &Review) -> bool {
        self.name == review.name && self.message == review.message
    }

    pub fn to_document(&self) -> Result<NewDocument, serde_json::Error> {
        let fields = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Fields::new(),
        };
        Ok(NewDocument::new(fields).with_server_timestamp(TIMESTAMP_FIELD))
    }
}

/// In-progress form contents; never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewDraft {
    pub name: String,
    pub email: String,
    /// 0 means no star picked yet.
    pub rating: u8,
    pub service: Option<Service>,
    pub message: String,
}

impl ReviewDraft {
    /// Checks the fields in form order, stopping at the first problem.
    pub fn validate(&self) -> Result<NewReview, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::NameRequired);
        }
        if self.rating == 0 {
            return Err(ValidationError::RatingRequired);
        }
        if self.rating > 5 {
            return Err(ValidationError::RatingOutOfRange(self.rating));
        }
        let message = self.message.trim();
        if message.is_empty() {
            return Err(ValidationError::MessageRequired);
        }
        let email = self.email.trim();

        Ok(NewReview {
            name: name.to_string(),
            rating: self.rating,
            message: message.to_string(),
            service: self.service.unwrap_or_default(),
            email: (!email.is_empty()).then(|| email.to_string()),
            is_seed: None,
        })
    }

    pub fn is_blank(&self) -> bool {
        *self == ReviewDraft::default()
    }
}

// Body a client may send; ids, timestamps and unknown keys are ignored.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmittedFields {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    rating: i64,
    #[serde(default)]
    service: Option<Service>,
    #[serde(default)]
    message: String,
    #[serde(default, alias = "isPredefined")]
    is_seed: bool,
}

/// A review as received from a client, before the server decides what to keep.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSubmission {
    pub draft: ReviewDraft,
    /// Whether the client claimed this is a sample review.
    pub is_seed: bool,
}

impl ReviewSubmission {
    pub fn from_fields(fields: Fields) -> Result<ReviewSubmission, ReviewError> {
        let submitted: SubmittedFields = serde_json::from_value(Value::Object(fields))
            .map_err(|e| ReviewError::Decode {
                id: String::new(),
                reason: e.to_string(),
            })?;
        // Anything below one star counts as no rating.
        let rating = u8::try_from(submitted.rating.max(0)).unwrap_or(u8::MAX);

        Ok(ReviewSubmission {
            draft: ReviewDraft {
                name: submitted.name,
                email: submitted.email.unwrap_or_default(),
                rating,
                service: submitted.service,
                message: submitted.message,
            },
            is_seed: submitted.is_seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(fields: Value) -> Document {
        Document {
            id: "doc-1".into(),
            fields: fields.as_object().cloned().unwrap(),
        }
    }

    fn draft() -> ReviewDraft {
        ReviewDraft {
            name: "  Asha Rao ".into(),
            email: String::new(),
            rating: 4,
            service: None,
            message: " Quick turnaround ".into(),
        }
    }

    #[test]
    fn test_decode_fills_defaults() {
        let review = Review::from_document(document(json!({
            "name": "Asha Rao",
            "rating": 5,
            "message": "Great",
            "timestamp": "2024-05-01T10:00:00.000000Z"
        })))
        .unwrap();
        assert_eq!(review.id, "doc-1");
        assert_eq!(review.service, Service::Other);
        assert!(!review.is_seed);
        assert_eq!(review.email, None);
    }

    #[test]
    fn test_decode_accepts_legacy_field_names() {
        let review = Review::from_document(document(json!({
            "name": "Rajesh Kumar",
            "rating": 5,
            "message": "Excellent",
            "service": "Company Formation",
            "date": "2024-05-01T10:00:00Z",
            "isPredefined": true
        })))
        .unwrap();
        assert!(review.is_seed);
        assert_eq!(review.service, Service::CompanyFormation);
        assert_eq!(review.timestamp.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn test_decode_rejects_out_of_range_rating() {
        for rating in [0, 6, -1] {
            let result = Review::from_document(document(json!({
                "name": "A", "rating": rating, "message": "m"
            })));
            assert!(matches!(result, Err(ReviewError::Decode { .. })));
        }
    }

    #[test]
    fn test_decode_rejects_missing_name() {
        let result = Review::from_document(document(json!({ "rating": 3, "message": "m" })));
        assert!(result.is_err());
    }

    #[test]
    fn test_initials() {
        let review = Review::from_document(document(json!({
            "name": "priya  sharma", "rating": 5, "message": "m"
        })))
        .unwrap();
        assert_eq!(review.initials(), "PS");
    }

    #[test]
    fn test_validate_trims_and_defaults_service() {
        let review = draft().validate().unwrap();
        assert_eq!(review.name, "Asha Rao");
        assert_eq!(review.message, "Quick turnaround");
        assert_eq!(review.service, Service::Other);
        assert_eq!(review.is_seed, None);
    }

    #[test]
    fn test_validate_short_circuits_in_field_order() {
        let empty = ReviewDraft::default();
        assert_eq!(empty.validate(), Err(ValidationError::NameRequired));

        let no_rating = ReviewDraft { rating: 0, message: String::new(), ..draft() };
        assert_eq!(no_rating.validate(), Err(ValidationError::RatingRequired));

        let blank_message = ReviewDraft { message: "   ".into(), ..draft() };
        assert_eq!(blank_message.validate(), Err(ValidationError::MessageRequired));

        let too_high = ReviewDraft { rating: 9, ..draft() };
        assert_eq!(too_high.validate(), Err(ValidationError::RatingOutOfRange(9)));
    }

    #[test]
    fn test_submitted_document_omits_seed_flag() {
        let doc = draft().validate().unwrap().to_document().unwrap();
        assert!(!doc.fields.contains_key("isSeed"));
        assert_eq!(doc.fields["service"], json!("Other Services"));
        assert_eq!(doc.server_timestamp.as_deref(), Some(TIMESTAMP_FIELD));
    }

    #[test]
    fn test_seed_document_carries_seed_flag() {
        let doc = NewReview::seed("A", 5, "m", Service::TaxPlanning)
            .to_document()
            .unwrap();
        assert_eq!(doc.fields["isSeed"], json!(true));
    }
}
