pub mod api;
pub mod auth;
pub mod data_url;
pub mod db;
pub mod models;
pub mod schema;
pub mod validation;

use std::sync::Arc;

/// Application state shared across all handlers
pub type AppState = Arc<db::DbPool>;
