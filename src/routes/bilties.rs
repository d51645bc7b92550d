use axum::{
    routing::{get, patch, post},
    Router, middleware,
};
use crate::state::AppState;
use crate::handlers::bilty::{
    create_bilty, create_bilty_billing, delete_bilty, get_bilty, list_bilties, list_bilty_billings,
    preview_bilty_billing, update_bilty, update_bilty_status,
};
use crate::middleware::auth::require_auth;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/bilties", get(list_bilties).post(create_bilty))
        .route("/bilties/{id}", get(get_bilty).put(update_bilty).delete(delete_bilty))
        .route("/bilties/{id}/status", patch(update_bilty_status))
        .route("/bilties/{id}/billings", get(list_bilty_billings).post(create_bilty_billing))
        .route("/bilties/{id}/billings/preview", post(preview_bilty_billing))
        .layer(middleware::from_fn_with_state(state, require_auth))
}
