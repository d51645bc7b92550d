use axum::{
    routing::{get, post},
    Router, middleware,
};
use crate::state::AppState;
use crate::handlers::dashboard::{get_dashboard, reload_store};
use crate::middleware::auth::require_auth;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/reload", post(reload_store))
        .layer(middleware::from_fn_with_state(state, require_auth))
}
