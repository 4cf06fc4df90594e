//! The document-store boundary the review subsystem is written against.
//!
//! Any backend offering the five primitives of [`DocumentStore`] can hold the
//! reviews collection: the in-process [`MemoryStore`](crate::store::memory::MemoryStore),
//! the SQLite store behind the server, or the HTTP client used in the browser.
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

use crate::error::StoreResult;
use crate::store::listeners::Subscription;

pub type Fields = Map<String, Value>;

/// A stored document: store-assigned id plus its JSON fields.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// A document about to be written.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct NewDocument {
    pub fields: Fields,
    /// Field the store fills with its own clock reading at write time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_timestamp: Option<String>,
}

impl NewDocument {
    pub fn new(fields: Fields) -> Self {
        Self {
            fields,
            server_timestamp: None,
        }
    }

    pub fn with_server_timestamp(mut self, field: impl Into<String>) -> Self {
        self.server_timestamp = Some(field.into());
        self
    }

    /// Resolves the server timestamp sentinel into a concrete document.
    pub fn into_document(self, id: String, now: DateTime<Utc>) -> Document {
        let mut fields = self.fields;
        if let Some(field) = self.server_timestamp {
            fields.insert(field, Value::String(format_timestamp(now)));
        }
        Document { id, fields }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub order_by: String,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Query {
    pub fn newest_first(field: impl Into<String>, limit: Option<usize>) -> Self {
        Self {
            order_by: field.into(),
            direction: Direction::Desc,
            limit,
        }
    }

    /// Orders and truncates documents given in insertion order.
    ///
    /// Documents sharing a sort value keep newest-insertion-first order when
    /// descending, oldest-first when ascending.
    pub fn apply(&self, mut docs: Vec<Document>) -> Vec<Document> {
        match self.direction {
            Direction::Asc => {
                docs.sort_by(|a, b| compare_fields(a, b, &self.order_by));
            }
            Direction::Desc => {
                docs.reverse();
                docs.sort_by(|a, b| compare_fields(b, a, &self.order_by));
            }
        }
        if let Some(limit) = self.limit {
            docs.truncate(limit);
        }
        docs
    }
}

fn compare_fields(a: &Document, b: &Document, field: &str) -> Ordering {
    compare_values(a.fields.get(field), b.fields.get(field))
}

/// Missing values sort lowest, then numbers, then strings.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Fixed-width RFC 3339 so string order matches time order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Strictly increasing clock for server-assigned timestamps.
#[derive(Debug, Clone, Default)]
pub struct ServerClock {
    last: Option<DateTime<Utc>>,
}

impl ServerClock {
    pub fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.last {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last = Some(next);
        next
    }
}

/// Generic store over named collections of JSON documents.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Inserts one document and returns it as stored.
    async fn insert(&self, collection: &str, document: NewDocument) -> StoreResult<Document>;

    /// Inserts all documents or none of them.
    async fn insert_batch(
        &self,
        collection: &str,
        documents: Vec<NewDocument>,
    ) -> StoreResult<Vec<Document>>;

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>>;

    async fn fetch_all(&self, collection: &str) -> StoreResult<Vec<Document>>;

    /// Opens a live query. The first item is the current result; later items
    /// follow every change to the collection.
    async fn subscribe(&self, collection: &str, query: Query) -> Subscription;

    /// Number of live queries not yet released.
    fn active_listeners(&self) -> usize;
}
