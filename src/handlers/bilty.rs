use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::auth::session::{Module, Session};
use crate::dtos::billing::{BillingComputation, BillingSubmission};
use crate::dtos::bilty::{BiltyQuery, BiltyResponse, BiltySubmission, UpdateBiltyStatusRequest};
use crate::error::AppError;
use crate::models::{Bilty, BiltyBilling};
use crate::state::AppState;
use crate::store::DataStore;
use crate::validation::normalize_vehicle_number;
use crate::workflow::{billing, bilty};

fn respond(store: &DataStore, bilty: Bilty) -> BiltyResponse {
    BiltyResponse {
        remaining: bilty.remaining(),
        vehicle_no: store.vehicle_number(&bilty.vehicle_id).map(str::to_string),
        seller_name: store.seller_name(&bilty.seller_id).map(str::to_string),
        bilty,
    }
}

fn matches(store: &DataStore, bilty: &Bilty, term: &str, compact: &str) -> bool {
    term.is_empty()
        || bilty.bilty_number.to_lowercase().contains(term)
        || store
            .vehicle_number(&bilty.vehicle_id)
            .is_some_and(|v| v.to_lowercase().contains(compact))
        || store
            .seller_name(&bilty.seller_id)
            .is_some_and(|s| s.to_lowercase().contains(term))
}

pub async fn list_bilties(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<BiltyQuery>,
) -> Result<Json<Vec<BiltyResponse>>, AppError> {
    session.authorize_any(&[Module::Bilty, Module::Billing])?;

    let term = query.search.unwrap_or_default().trim().to_lowercase();
    let compact = normalize_vehicle_number(&term).to_lowercase();
    let store = state.store.read().await;
    let bilties = store
        .all::<Bilty>()
        .iter()
        .filter(|b| matches(&store, b, &term, &compact))
        .filter(|b| query.status.map_or(true, |status| b.status == status))
        .map(|b| respond(&store, b.clone()))
        .collect();
    Ok(Json(bilties))
}

pub async fn get_bilty(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<BiltyResponse>, AppError> {
    session.authorize_any(&[Module::Bilty, Module::Billing])?;

    let store = state.store.read().await;
    let bilty = store
        .get::<Bilty>(&id)
        .cloned()
        .ok_or_else(|| AppError::not_found("Bilty not found"))?;
    Ok(Json(respond(&store, bilty)))
}

pub async fn create_bilty(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(submission): Json<BiltySubmission>,
) -> Result<(StatusCode, Json<BiltyResponse>), AppError> {
    session.authorize(Module::Bilty)?;

    let created = bilty::create_bilty(&state, submission).await?;
    let store = state.store.read().await;
    Ok((StatusCode::CREATED, Json(respond(&store, created))))
}

pub async fn update_bilty(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(submission): Json<BiltySubmission>,
) -> Result<Json<BiltyResponse>, AppError> {
    session.authorize(Module::Bilty)?;

    let updated = bilty::update_bilty(&state, &id, submission).await?;
    let store = state.store.read().await;
    Ok(Json(respond(&store, updated)))
}

pub async fn update_bilty_status(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(req): Json<UpdateBiltyStatusRequest>,
) -> Result<Json<BiltyResponse>, AppError> {
    session.authorize(Module::Bilty)?;

    let updated = bilty::set_status(&state, &id, req.status).await?;
    let store = state.store.read().await;
    Ok(Json(respond(&store, updated)))
}

pub async fn delete_bilty(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    session.authorize(Module::Bilty)?;
    bilty::delete_bilty(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_bilty_billings(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<Vec<BiltyBilling>>, AppError> {
    session.authorize(Module::Billing)?;
    let billings = billing::list_bilty_billings(&state, &id).await?;
    Ok(Json(billings))
}

/// Computes the totals without persisting anything.
pub async fn preview_bilty_billing(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(submission): Json<BillingSubmission>,
) -> Result<Json<BillingComputation>, AppError> {
    session.authorize(Module::Billing)?;
    let computation = billing::preview_billing(&state, &id, &submission).await?;
    Ok(Json(computation))
}

pub async fn create_bilty_billing(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(submission): Json<BillingSubmission>,
) -> Result<(StatusCode, Json<BiltyBilling>), AppError> {
    session.authorize(Module::Billing)?;
    let created = billing::create_bilty_billing(&state, &id, submission).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
