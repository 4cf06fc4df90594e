#[cfg(feature = "ssr")]
use actix_web::{web, HttpResponse};
#[cfg(feature = "ssr")]
use crate::db::SqliteStore;
#[cfg(feature = "ssr")]
use crate::config::ReviewsConfig;
#[cfg(feature = "ssr")]
use crate::repository::{accept_submission, ReviewRepository};
#[cfg(feature = "ssr")]
use crate::stats::ReviewStats;
#[cfg(feature = "ssr")]
use crate::store::document::{Direction, DocumentStore, NewDocument, Query};
#[cfg(feature = "ssr")]
use crate::error::ReviewError;
#[cfg(feature = "ssr")]
use leptos::logging::{log, warn};
#[cfg(feature = "ssr")]
use serde::Deserialize;

/// Query string of the document listing; without `order_by` the whole
/// collection comes back in insertion order.
#[cfg(feature = "ssr")]
#[derive(Deserialize, Debug, Default)]
pub struct DocumentsParams {
    pub order_by: Option<String>,
    #[serde(default)]
    pub direction: Direction,
    pub limit: Option<usize>,
}

#[cfg(feature = "ssr")]
pub async fn get_documents(
    store: web::Data<SqliteStore>,
    collection: web::Path<String>,
    params: web::Query<DocumentsParams>,
) -> HttpResponse {
    let collection = collection.into_inner();
    let params = params.into_inner();
    let result = match params.order_by {
        Some(order_by) => {
            let query = Query {
                order_by,
                direction: params.direction,
                limit: params.limit,
            };
            store.query(&collection, &query).await
        }
        None => store.fetch_all(&collection).await,
    };
    match result {
        Ok(docs) => {
            log!("[SERVER] Returning {} documents from '{}'", docs.len(), collection);
            HttpResponse::Ok().json(docs)
        }
        Err(err) => {
            log!("[SERVER ERROR] Failed to fetch '{}': {}", collection, err);
            HttpResponse::InternalServerError().body("Failed to fetch documents")
        }
    }
}

/// Writes into the reviews collection go through review validation; the
/// stored document always gets the server's timestamp.
#[cfg(feature = "ssr")]
fn checked_document(
    config: &ReviewsConfig,
    collection: &str,
    document: NewDocument,
    allow_seed: bool,
) -> Result<NewDocument, ReviewError> {
    if collection != config.collection {
        return Ok(document);
    }
    let review = accept_submission(document.fields, allow_seed)?;
    review
        .to_document()
        .map_err(|e| ReviewError::Write(e.into()))
}

#[cfg(feature = "ssr")]
fn rejected(collection: &str, err: &ReviewError) -> HttpResponse {
    warn!("[SERVER] Rejected write to '{}': {}", collection, err);
    HttpResponse::BadRequest().body(err.user_message())
}

#[cfg(feature = "ssr")]
pub async fn create_document(
    store: web::Data<SqliteStore>,
    config: web::Data<ReviewsConfig>,
    collection: web::Path<String>,
    document: web::Json<NewDocument>,
) -> HttpResponse {
    let collection = collection.into_inner();
    let document = match checked_document(&config, &collection, document.into_inner(), false) {
        Ok(document) => document,
        Err(err) => return rejected(&collection, &err),
    };
    match store.insert(&collection, document).await {
        Ok(doc) => {
            log!("[SERVER] Stored document {} in '{}'", doc.id, collection);
            HttpResponse::Ok().json(doc)
        }
        Err(err) => {
            log!("[SERVER ERROR] Failed to store document in '{}': {}", collection, err);
            HttpResponse::InternalServerError().body("Failed to store document")
        }
    }
}

/// Batch insert; the only path on which sample reviews may be written.
#[cfg(feature = "ssr")]
pub async fn create_batch(
    store: web::Data<SqliteStore>,
    config: web::Data<ReviewsConfig>,
    collection: web::Path<String>,
    documents: web::Json<Vec<NewDocument>>,
) -> HttpResponse {
    let collection = collection.into_inner();
    let documents = match documents
        .into_inner()
        .into_iter()
        .map(|doc| checked_document(&config, &collection, doc, true))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(documents) => documents,
        Err(err) => return rejected(&collection, &err),
    };
    match store.insert_batch(&collection, documents).await {
        Ok(docs) => HttpResponse::Ok().json(docs),
        Err(err) => {
            log!("[SERVER ERROR] Batch into '{}' failed: {}", collection, err);
            HttpResponse::InternalServerError().body("Failed to store documents")
        }
    }
}

#[cfg(feature = "ssr")]
pub async fn get_review_stats(
    store: web::Data<SqliteStore>,
    config: web::Data<ReviewsConfig>,
) -> HttpResponse {
    let repo = ReviewRepository::with_collection(store.get_ref().clone(), config.collection.clone());
    match repo.list(None).await {
        Ok(reviews) => HttpResponse::Ok().json(ReviewStats::compute(&reviews)),
        Err(err) => {
            log!("[SERVER ERROR] Failed to compute review stats: {}", err);
            HttpResponse::InternalServerError().body("Failed to compute review stats")
        }
    }
}

/// Registers the REST routes under `/api`.
#[cfg(feature = "ssr")]
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/reviews/stats", web::get().to(get_review_stats))
            .route(
                "/collections/{collection}/documents",
                web::get().to(get_documents),
            )
            .route(
                "/collections/{collection}/documents",
                web::post().to(create_document),
            )
            .route("/collections/{collection}/batch", web::post().to(create_batch)),
    );
}
