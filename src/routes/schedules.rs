use axum::{
    routing::get,
    Router, middleware,
};
use crate::state::AppState;
use crate::handlers::schedule::{create_schedule, delete_schedule, get_schedule, list_schedules, update_schedule};
use crate::middleware::auth::require_auth;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/schedules", get(list_schedules).post(create_schedule))
        .route("/schedules/{id}", get(get_schedule).put(update_schedule).delete(delete_schedule))
        .layer(middleware::from_fn_with_state(state, require_auth))
}
