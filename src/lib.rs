pub mod auth;
pub mod backend;
pub mod bilty_number;
pub mod config;
pub mod conversion;
pub mod database;
pub mod dtos;
pub mod error;
pub mod export;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod validation;
pub mod workflow;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::state::AppState;

pub const BASE_PATH: &str = "/bilty-desk";

/// The full application under [`BASE_PATH`], with CORS and `/health`.
pub fn build_app(state: AppState) -> Router {
    let api = routes::create_router(state.clone())
        .route("/", get(|| async { "Bilty Desk API" }))
        .route("/health", get(health_check));

    Router::new()
        .nest(BASE_PATH, api)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
