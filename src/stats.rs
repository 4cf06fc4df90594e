use serde::{Deserialize, Serialize};

use crate::models::review::Review;

/// Aggregate figures shown next to the review feed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub count: usize,
    /// Mean rating rounded to one decimal; 0 for an empty feed.
    pub average_rating: f64,
    /// Whole-number percentage of reviews rated 4 or 5.
    pub satisfaction_rate: u32,
}

impl ReviewStats {
    pub fn compute(reviews: &[Review]) -> Self {
        let count = reviews.len();
        if count == 0 {
            return Self::default();
        }
        let total: u64 = reviews.iter().map(|r| u64::from(r.rating)).sum();
        let satisfied = reviews.iter().filter(|r| r.rating >= 4).count();

        let average_rating = (total as f64 * 10.0 / count as f64).round() / 10.0;
        let satisfaction_rate = (satisfied as f64 * 100.0 / count as f64).round() as u32;

        Self {
            count,
            average_rating,
            satisfaction_rate,
        }
    }

    /// Average as displayed: one decimal, or a bare "0" with no reviews.
    pub fn average_label(&self) -> String {
        if self.count == 0 {
            return "0".to_string();
        }
        format!("{:.1}", self.average_rating)
    }
}
