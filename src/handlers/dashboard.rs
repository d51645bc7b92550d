use axum::extract::{Extension, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::auth::session::{Module, Role, Session};
use crate::dtos::dashboard::DashboardStats;
use crate::error::AppError;
use crate::models::{BillingRecord, Bilty, Seller};
use crate::state::AppState;
use crate::store::DataStore;
use crate::workflow::log_failure;

pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<DashboardStats>, AppError> {
    session.authorize(Module::Dashboard)?;
    let stats = state.store.read().await.dashboard_stats(Utc::now(), state.config.local_offset);
    Ok(Json(stats))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadResponse {
    pub sellers: usize,
    pub bilties: usize,
    pub billing_records: usize,
}

/// Rebuilds the whole cache from the backend. The old cache stays in place if
/// loading fails.
pub async fn reload_store(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<ReloadResponse>, AppError> {
    if session.role != Role::Admin {
        return Err(AppError::forbidden("Only administrators can reload data"));
    }

    let fresh = DataStore::load(state.backend.as_ref())
        .await
        .map_err(log_failure("reload data store"))?;
    let response = ReloadResponse {
        sellers: fresh.all::<Seller>().len(),
        bilties: fresh.all::<Bilty>().len(),
        billing_records: fresh.all::<BillingRecord>().len(),
    };
    *state.store.write().await = fresh;

    tracing::info!(user_id = %session.user_id, "Data store reloaded");
    Ok(Json(response))
}
