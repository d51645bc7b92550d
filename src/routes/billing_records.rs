use axum::{
    routing::{delete, get, patch},
    Router, middleware,
};
use crate::state::AppState;
use crate::handlers::billing::{
    create_billing_record, delete_billing_record, export_billing_records, list_billing_records,
    update_billing_status,
};
use crate::middleware::auth::require_auth;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/billing-records", get(list_billing_records).post(create_billing_record))
        .route("/billing-records/export", get(export_billing_records))
        .route("/billing-records/{id}", delete(delete_billing_record))
        .route("/billing-records/{id}/status", patch(update_billing_status))
        .layer(middleware::from_fn_with_state(state, require_auth))
}
