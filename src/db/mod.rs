//! Database module: models, schema and per-entity stores.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows, plus the status enums
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: pool bootstrap
//! - one store module per aggregate

pub mod catalog;
pub mod chat;
pub mod comments;
pub mod leads;
pub mod models;
pub mod posts;
pub mod schema;
pub mod settings;
pub mod sqlite;
pub mod subscribers;
pub mod taxonomy;
pub mod users;

pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, connect};
