use axum::extract::{Extension, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

use crate::auth::session::{Module, Session};
use crate::dtos::billing::{BillingListResponse, BillingQuery, CreateBillingRecordRequest, UpdateBillingStatusRequest};
use crate::error::AppError;
use crate::export::{billing_records_csv, export_filename};
use crate::models::BillingRecord;
use crate::state::AppState;
use crate::workflow::billing::{self, filter_records, summarize};

pub async fn list_billing_records(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<BillingQuery>,
) -> Result<Json<BillingListResponse>, AppError> {
    session.authorize(Module::Billing)?;

    let records = filter_records(&*state.store.read().await, &query);
    let summary = summarize(&records);
    Ok(Json(BillingListResponse { records, summary }))
}

pub async fn create_billing_record(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateBillingRecordRequest>,
) -> Result<(StatusCode, Json<BillingRecord>), AppError> {
    session.authorize(Module::Billing)?;
    let record = billing::create_billing_record(&state, req).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_billing_status(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(req): Json<UpdateBillingStatusRequest>,
) -> Result<Json<BillingRecord>, AppError> {
    session.authorize(Module::Billing)?;
    let record = billing::set_billing_status(&state, &id, req.status).await?;
    Ok(Json(record))
}

pub async fn delete_billing_record(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    session.authorize(Module::Billing)?;
    billing::delete_billing_record(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Same filters as the list, rendered as a CSV attachment.
pub async fn export_billing_records(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<BillingQuery>,
) -> Result<impl IntoResponse, AppError> {
    session.authorize_any(&[Module::Reports, Module::Billing])?;

    let csv = {
        let store = state.store.read().await;
        let records = filter_records(&store, &query);
        billing_records_csv(&store, &records)
    };
    let today = Utc::now().with_timezone(&state.config.local_offset).date_naive();
    let disposition = format!("attachment; filename=\"{}\"", export_filename(today));

    tracing::info!(bytes = csv.len(), "Billing records exported");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}
