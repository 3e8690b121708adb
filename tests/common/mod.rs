//! In-process collection server for integration tests
//!
//! Routes under `/v1`:
//!   architecture  GET (page/size envelope), POST JSON `{code}`, DELETE JSON `{id}`
//!   firmware      POST form-encoded `{version}`
//!   legacy        GET with limit/offset, bare JSON array
//!   broken        GET returning a non-JSON body
//!   down          GET returning 503

#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Debug, Default)]
pub struct Collection {
    pub records: Vec<Value>,
    pub next_id: u64,
    pub list_calls: usize,
    pub create_calls: usize,
    pub delete_calls: usize,
    pub last_form: Option<HashMap<String, String>>,
}

pub type Shared = Arc<Mutex<Collection>>;

pub struct Fixture {
    pub base_url: String,
    pub state: Shared,
}

impl Fixture {
    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().records.len()
    }
}

/// Start a server holding architecture records 1..=count
pub async fn spawn(count: u64) -> Fixture {
    let records = (1..=count)
        .map(|id| json!({ "id": id, "code": format!("arch-{}", id) }))
        .collect();
    let state = Arc::new(Mutex::new(Collection {
        records,
        next_id: count + 1,
        ..Default::default()
    }));

    let app = Router::new()
        .route("/v1/architecture", get(list).post(create).delete(remove))
        .route("/v1/firmware", axum::routing::post(create_form))
        .route("/v1/legacy", get(list_legacy))
        .route("/v1/broken", get(|| async { "<html>gateway</html>" }))
        .route(
            "/v1/down",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": "maintenance" }))) }),
        )
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Fixture {
        base_url: format!("http://{}", addr),
        state,
    }
}

/// A base URL nothing is listening on
pub async fn closed_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<usize>,
    size: Option<usize>,
}

async fn list(State(state): State<Shared>, Query(q): Query<PageQuery>) -> Json<Value> {
    let mut collection = state.lock().unwrap();
    collection.list_calls += 1;

    let size = q.size.unwrap_or(10).max(1);
    let page = q.page.unwrap_or(1).max(1);
    let total = collection.records.len();
    let data: Vec<Value> = collection.records.iter().skip((page - 1) * size).take(size).cloned().collect();

    Json(json!({
        "data": data,
        "page": page,
        "total_pages": ((total + size - 1) / size).max(1),
        "total_count": total,
    }))
}

async fn create(State(state): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut collection = state.lock().unwrap();
    collection.create_calls += 1;

    let code = body.get("code").and_then(Value::as_str).unwrap_or("").trim().to_string();
    if code.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "validation failed", "errors": { "code": ["is required"] } })),
        );
    }
    if collection.records.iter().any(|r| r["code"] == code.as_str()) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "validation failed", "errors": { "code": "already exists" } })),
        );
    }

    let id = collection.next_id;
    collection.next_id += 1;
    let record = json!({ "id": id, "code": code });
    collection.records.push(record.clone());

    (StatusCode::CREATED, Json(json!({ "success": true, "data": record })))
}

async fn remove(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    let mut collection = state.lock().unwrap();
    collection.delete_calls += 1;

    let id = body.get("id").cloned().unwrap_or(Value::Null);
    match collection.records.iter().position(|r| r["id"] == id) {
        Some(index) => {
            collection.records.remove(index);
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err((StatusCode::NOT_FOUND, Json(json!({ "message": format!("no record {}", id) })))),
    }
}

async fn create_form(
    State(state): State<Shared>,
    Form(fields): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let mut collection = state.lock().unwrap();
    collection.create_calls += 1;

    let id = collection.next_id;
    collection.next_id += 1;
    let version = fields.get("version").cloned().unwrap_or_default();
    collection.last_form = Some(fields);

    // Bare record, no envelope
    (StatusCode::OK, Json(json!({ "id": id, "version": version })))
}

#[derive(Deserialize)]
struct OffsetQuery {
    limit: Option<usize>,
    offset: Option<usize>,
}

async fn list_legacy(State(state): State<Shared>, Query(q): Query<OffsetQuery>) -> Json<Value> {
    let mut collection = state.lock().unwrap();
    collection.list_calls += 1;

    let limit = q.limit.unwrap_or(10);
    let offset = q.offset.unwrap_or(0);
    let data: Vec<Value> = collection.records.iter().skip(offset).take(limit).cloned().collect();
    Json(Value::Array(data))
}
