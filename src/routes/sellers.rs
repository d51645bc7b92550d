use axum::{
    routing::get,
    Router, middleware,
};
use crate::state::AppState;
use crate::handlers::seller::{create_seller, delete_seller, get_seller, list_sellers, update_seller};
use crate::middleware::auth::require_auth;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/sellers", get(list_sellers).post(create_seller))
        .route("/sellers/{id}", get(get_seller).put(update_seller).delete(delete_seller))
        .layer(middleware::from_fn_with_state(state, require_auth))
}
