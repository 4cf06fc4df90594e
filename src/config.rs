use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::repository::DEFAULT_COLLECTION;

/// Id of the element carrying the server's settings to the browser.
pub const CONFIG_ELEMENT_ID: &str = "reviews-config";

/// Tunables of the review feature.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReviewsConfig {
    pub collection: String,
    pub carousel_limit: usize,
    pub rotation_interval_ms: u64,
    pub success_flash_ms: u64,
    /// Server only; never written into the page.
    #[serde(skip_serializing)]
    pub db_path: String,
    /// How often the browser re-reads a live query.
    pub poll_interval_ms: u64,
}

impl Default for ReviewsConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            carousel_limit: 5,
            rotation_interval_ms: 5_000,
            success_flash_ms: 3_000,
            db_path: "reviewdesk.db".to_string(),
            poll_interval_ms: 2_000,
        }
    }
}

impl ReviewsConfig {
    /// Defaults overridden by `REVIEWS_*` environment variables when set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(collection) = lookup("REVIEWS_COLLECTION").filter(|c| !c.trim().is_empty()) {
            config.collection = collection;
        }
        if let Some(path) = lookup("REVIEWS_DB_PATH") {
            config.db_path = path;
        }
        if let Some(limit) = lookup("REVIEWS_CAROUSEL_LIMIT").and_then(|v| v.parse().ok()) {
            config.carousel_limit = limit;
        }
        if let Some(ms) = lookup("REVIEWS_POLL_INTERVAL_MS").and_then(|v| v.parse().ok()) {
            config.poll_interval_ms = ms;
        }
        config
    }

    /// JSON safe to place inside a `<script>` element.
    pub fn to_page_json(&self) -> String {
        serde_json::to_string(self)
            .map(|json| json.replace('<', "\\u003c"))
            .unwrap_or_default()
    }

    /// Reads settings embedded with [`to_page_json`](Self::to_page_json);
    /// falls back to defaults when missing or unreadable.
    pub fn from_page_json(json: Option<&str>) -> Self {
        json.and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default()
    }

    pub fn rotation_interval(&self) -> Duration {
        Duration::from_millis(self.rotation_interval_ms)
    }

    pub fn success_flash(&self) -> Duration {
        Duration::from_millis(self.success_flash_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ReviewsConfig::default();
        assert_eq!(config.collection, "reviews");
        assert_eq!(config.carousel_limit, 5);
        assert_eq!(config.rotation_interval(), Duration::from_secs(5));
        assert_eq!(config.success_flash(), Duration::from_secs(3));
    }

    #[test]
    fn test_overrides_ignore_garbage() {
        let env: HashMap<&str, &str> = [
            ("REVIEWS_COLLECTION", "testimonials"),
            ("REVIEWS_CAROUSEL_LIMIT", "three"),
            ("REVIEWS_POLL_INTERVAL_MS", "500"),
        ]
        .into_iter()
        .collect();
        let config = ReviewsConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.collection, "testimonials");
        assert_eq!(config.carousel_limit, 5);
        assert_eq!(config.poll_interval_ms, 500);
    }

    #[test]
    fn test_page_json_carries_browser_settings() {
        let config = ReviewsConfig {
            collection: "testimonials".into(),
            carousel_limit: 3,
            poll_interval_ms: 500,
            db_path: "/srv/private.db".into(),
            ..Default::default()
        };
        let json = config.to_page_json();
        assert!(!json.contains("private.db"));

        let read = ReviewsConfig::from_page_json(Some(&json));
        assert_eq!(read.collection, "testimonials");
        assert_eq!(read.carousel_limit, 3);
        assert_eq!(read.poll_interval(), Duration::from_millis(500));
        assert_eq!(read.db_path, ReviewsConfig::default().db_path);
    }

    #[test]
    fn test_page_json_cannot_close_script() {
        let config = ReviewsConfig {
            collection: "</script><b>".into(),
            ..Default::default()
        };
        let json = config.to_page_json();
        assert!(!json.contains('<'));
        assert_eq!(
            ReviewsConfig::from_page_json(Some(&json)).collection,
            "</script><b>"
        );
    }

    #[test]
    fn test_missing_page_json_falls_back() {
        assert_eq!(ReviewsConfig::from_page_json(None), ReviewsConfig::default());
        assert_eq!(
            ReviewsConfig::from_page_json(Some("not json")),
            ReviewsConfig::default()
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ReviewsConfig = serde_json::from_str(r#"{"carousel_limit": 3}"#).unwrap();
        assert_eq!(config.carousel_limit, 3);
        assert_eq!(config.collection, "reviews");
    }
}
