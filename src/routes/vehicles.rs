use axum::{
    routing::get,
    Router, middleware,
};
use crate::state::AppState;
use crate::handlers::vehicle::{create_vehicle, delete_vehicle, get_vehicle, list_vehicles, update_vehicle};
use crate::middleware::auth::require_auth;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/vehicles", get(list_vehicles).post(create_vehicle))
        .route("/vehicles/{id}", get(get_vehicle).put(update_vehicle).delete(delete_vehicle))
        .layer(middleware::from_fn_with_state(state, require_auth))
}
