//! REST API for annvec.
//!
//! Serves one shared [`QueryEngine`] over JSON endpoints. The engine is
//! registered as `web::Data` app data; queries from different workers run
//! concurrently under its read lock.
//!
//! ## Endpoints
//!
//! - `POST /insert` - Insert labeled vectors
//! - `POST /search` - Top-k similarity search, one or more queries
//! - `POST /get` - Retrieve records by ID
//! - `GET /stats` - Record count and engine settings
//!
//! ## Usage
//!
//! ```rust,no_run
//! use actix_web::{web, App, HttpServer};
//! use annvec::{EngineConfig, QueryEngine};
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     let engine = web::Data::new(QueryEngine::new(EngineConfig::default()).unwrap());
//!     HttpServer::new(move || App::new().app_data(engine.clone()).configure(annvec::server::config))
//!         .bind("0.0.0.0:7878")?
//!         .run()
//!         .await
//! }
//! ```

use crate::{QueryEngine, RecordId, SearchHit};
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};


// --- Request structs ---

#[derive(Deserialize)]
struct RecordEntry {
    id: RecordId,
    label: String,
    vector: Vec<f32>,
}

#[derive(Deserialize)]
struct Query {
    vector: Vec<f32>,
    k: usize,
    ef_search: Option<usize>,
}

#[derive(Deserialize)]
struct InsertRequest {
    records: Vec<RecordEntry>,
}

#[derive(Deserialize)]
struct SearchRequest {
    queries: Vec<Query>,
}

#[derive(Deserialize)]
struct GetRequest {
    ids: Vec<RecordId>,
}

// --- Response structs ---

#[derive(Serialize)]
struct InsertResponse {
    inserted: usize,
    results: Vec<InsertResult>,
}

#[derive(Serialize)]
struct InsertResult {
    id: RecordId,
    status: String,
    message: String,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchResultGroup>,
}

#[derive(Serialize)]
struct SearchResultGroup {
    matches: Vec<SearchHit>,
    message: String,
}

#[derive(Serialize)]
struct GetResponse {
    results: Vec<GetResult>,
}

#[derive(Serialize)]
struct GetResult {
    id: RecordId,
    label: Option<String>,
    vector: Option<Vec<f32>>,
}

#[derive(Serialize)]
struct StatsResponse {
    count: usize,
    dimension: usize,
    strategy: &'static str,
    metric: &'static str,
}

// --- Handlers ---

async fn insert_handler(
    engine: web::Data<QueryEngine>,
    body: web::Json<InsertRequest>,
) -> impl Responder {
    let mut results = Vec::new();
    let mut inserted = 0;

    for entry in body.into_inner().records {
        let id = entry.id;
        match engine.insert(id, entry.label, entry.vector) {
            Ok(()) => {
                inserted += 1;
                results.push(InsertResult {
                    id,
                    status: "ok".to_string(),
                    message: format!("Inserted record {}", id),
                });
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "insert rejected");
                results.push(InsertResult {
                    id,
                    status: "error".to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    HttpResponse::Ok().json(InsertResponse { inserted, results })
}

async fn search_handler(
    engine: web::Data<QueryEngine>,
    body: web::Json<SearchRequest>,
) -> impl Responder {
    let mut results = Vec::new();

    for query in &body.queries {
        let ef_search = query.ef_search.unwrap_or(engine.config().hnsw.ef_search);
        match engine.similarity_search_with_ef(&query.vector, query.k, ef_search) {
            Ok(matches) => {
                results.push(SearchResultGroup {
                    matches,
                    message: "Search Success".to_string(),
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "search rejected");
                results.push(SearchResultGroup {
                    matches: Vec::new(),
                    message: e.to_string(),
                });
            }
        }
    }

    HttpResponse::Ok().json(SearchResponse { results })
}

async fn get_handler(
    engine: web::Data<QueryEngine>,
    body: web::Json<GetRequest>,
) -> impl Responder {
    let results = body
        .ids
        .iter()
        .map(|&id| match engine.get(id) {
            Ok(record) => GetResult {
                id,
                label: Some(record.label),
                vector: Some(record.vector),
            },
            Err(_) => GetResult { id, label: None, vector: None },
        })
        .collect();

    HttpResponse::Ok().json(GetResponse { results })
}

async fn stats_handler(engine: web::Data<QueryEngine>) -> impl Responder {
    let config = engine.config();
    HttpResponse::Ok().json(StatsResponse {
        count: engine.len(),
        dimension: engine.dimension(),
        strategy: config.strategy.name(),
        metric: config.metric.name(),
    })
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/insert").route(web::post().to(insert_handler)))
       .service(web::resource("/search").route(web::post().to(search_handler)))
       .service(web::resource("/get").route(web::post().to(get_handler)))
       .service(web::resource("/stats").route(web::get().to(stats_handler)));
}
