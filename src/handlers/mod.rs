use axum::Json;
use serde_json::{Value, json};

pub mod admin;
pub mod auth;
pub mod blog;
pub mod catalog;
pub mod chat;
pub mod leads;
pub mod newsletter;

/// GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
