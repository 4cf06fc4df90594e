#[cfg(feature = "ssr")]
mod db_impl {
    use crate::error::{StoreError, StoreResult};
    use crate::store::document::{
        Direction, Document, DocumentStore, Fields, NewDocument, Query, ServerClock,
    };
    use crate::store::listeners::{Listeners, Subscription};
    use leptos::logging::log;
    use rusqlite::{params, Connection};
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use uuid::Uuid;


    struct Inner {
        conn: Connection,
        clock: ServerClock,
    }

    /// Document store persisted in a single SQLite table.
    #[derive(Clone)]
    pub struct SqliteStore {
        inner: Arc<Mutex<Inner>>,
        listeners: Listeners,
    }

    impl SqliteStore {
        // Create a new database connection
        pub fn new(db_path: &str) -> StoreResult<Self> {
            let conn = Connection::open(db_path)?;
            log!("[DB] Database connection established at: {}", db_path);
            Ok(SqliteStore {
                inner: Arc::new(Mutex::new(Inner {
                    conn,
                    clock: ServerClock::default(),
                })),
                listeners: Listeners::default(),
            })
        }

        // Create the database schema
        pub async fn create_schema(&self) -> StoreResult<()> {
            let inner = self.inner.lock().await;
            inner
                .conn
                .execute_batch(
                    "CREATE TABLE IF NOT EXISTS documents (
                        seq INTEGER PRIMARY KEY AUTOINCREMENT,
                        id TEXT NOT NULL UNIQUE,
                        collection TEXT NOT NULL,
                        body TEXT NOT NULL,
                        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                    );
                    CREATE INDEX IF NOT EXISTS idx_documents_collection
                        ON documents(collection);",
                )
                .map_err(|e| {
                    log!("[DB] Failed creating documents table: {}", e);
                    e
                })?;
            Ok(())
        }

        fn write(
            inner: &mut Inner,
            collection: &str,
            documents: Vec<NewDocument>,
        ) -> StoreResult<Vec<Document>> {
            let tx = inner.conn.transaction()?;
            let mut written = Vec::with_capacity(documents.len());
            for document in documents {
                let doc = document.into_document(Uuid::new_v4().to_string(), inner.clock.tick());
                let body = serde_json::to_string(&doc.fields)?;
                tx.execute(
                    "INSERT INTO documents (id, collection, body) VALUES (?1, ?2, ?3)",
                    params![&doc.id, collection, body],
                )?;
                written.push(doc);
            }
            tx.commit()?;
            log!("[DB] Committed {} documents into '{}'", written.len(), collection);
            Ok(written)
        }

        fn run_query(
            conn: &Connection,
            collection: &str,
            query: Option<&Query>,
        ) -> StoreResult<Vec<Document>> {
            let rows = match query {
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, body FROM documents WHERE collection = ?1 ORDER BY seq ASC",
                    )?;
                    let rows = stmt
                        .query_map(params![collection], |row| {
                            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                        })?
                        .collect::<Result<Vec<_>, _>>()?;
                    rows
                }
                Some(query) => {
                    let sql = match query.direction {
                        Direction::Asc => {
                            "SELECT id, body FROM documents WHERE collection = ?1
                             ORDER BY json_extract(body, ?2) ASC, seq ASC LIMIT ?3"
                        }
                        Direction::Desc => {
                            "SELECT id, body FROM documents WHERE collection = ?1
                             ORDER BY json_extract(body, ?2) DESC, seq DESC LIMIT ?3"
                        }
                    };
                    let path = format!("$.{}", query.order_by);
                    let limit = query.limit.map(|l| l as i64).unwrap_or(-1);
                    let mut stmt = conn.prepare(sql)?;
                    let rows = stmt
                        .query_map(params![collection, path, limit], |row| {
                            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                        })?
                        .collect::<Result<Vec<_>, _>>()?;
                    rows
                }
            };

            rows.into_iter()
                .map(|(id, body)| -> StoreResult<Document> {
                    let fields: Fields = serde_json::from_str(&body)?;
                    Ok(Document { id, fields })
                })
                .collect()
        }

        async fn commit(
            &self,
            collection: &str,
            documents: Vec<NewDocument>,
        ) -> StoreResult<Vec<Document>> {
            let mut guard = self.inner.lock().await;
            let inner = &mut *guard;
            let written = Self::write(inner, collection, documents)?;
            let conn = &inner.conn;
            self.listeners
                .notify(collection, |query| Self::run_query(conn, collection, Some(query)));
            Ok(written)
        }
    }

    impl DocumentStore for SqliteStore {
        async fn insert(&self, collection: &str, document: NewDocument) -> StoreResult<Document> {
            let mut written = self.commit(collection, vec![document]).await?;
            written.pop().ok_or(StoreError::Closed)
        }

        async fn insert_batch(
            &self,
            collection: &str,
            documents: Vec<NewDocument>,
        ) -> StoreResult<Vec<Document>> {
            if documents.is_empty() {
                return Ok(Vec::new());
            }
            self.commit(collection, documents).await
        }

        async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
            let inner = self.inner.lock().await;
            Self::run_query(&inner.conn, collection, Some(query))
        }

        async fn fetch_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
            let inner = self.inner.lock().await;
            Self::run_query(&inner.conn, collection, None)
        }

        async fn subscribe(&self, collection: &str, query: Query) -> Subscription {
            let inner = self.inner.lock().await;
            let initial = Self::run_query(&inner.conn, collection, Some(&query));
            self.listeners.register(collection, query, initial)
        }

        fn active_listeners(&self) -> usize {
            self.listeners.active_count()
        }
    }
}

#[cfg(feature = "ssr")]
pub use db_impl::SqliteStore;
