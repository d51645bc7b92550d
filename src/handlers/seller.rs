use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::auth::session::{Module, Session};
use crate::dtos::seller::{CreateSellerRequest, SellerQuery, UpdateSellerRequest};
use crate::error::{AppError, FieldErrors};
use crate::models::Seller;
use crate::state::AppState;
use crate::validation::{normalize_mobile_number, validate_mobile_number};
use crate::workflow::log_failure;

fn check_required(errors: &mut FieldErrors, field: &str, value: Option<&str>, msg: &str) {
    if value.is_some_and(|v| v.trim().is_empty()) {
        errors.insert(field.to_string(), msg.to_string());
    }
}

fn validate(name: Option<&str>, shop_name: Option<&str>, address: Option<&str>, mobile: Option<&str>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_required(&mut errors, "name", name, "Name is required");
    check_required(&mut errors, "shopName", shop_name, "Shop name is required");
    check_required(&mut errors, "address", address, "Address is required");
    if let Some(Err(msg)) = mobile.map(validate_mobile_number) {
        errors.insert("mobileNumber".into(), msg.into());
    }
    errors
}

pub async fn list_sellers(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<SellerQuery>,
) -> Result<Json<Vec<Seller>>, AppError> {
    session.authorize_any(&[Module::Seller, Module::Bilty, Module::Billing])?;

    let term = query.search.unwrap_or_default().trim().to_lowercase();
    let store = state.store.read().await;
    let sellers = store
        .all::<Seller>()
        .iter()
        .filter(|s| {
            term.is_empty()
                || s.name.to_lowercase().contains(&term)
                || s.shop_name.to_lowercase().contains(&term)
                || s.mobile_number.contains(&term)
        })
        .cloned()
        .collect();
    Ok(Json(sellers))
}

pub async fn get_seller(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<Seller>, AppError> {
    session.authorize_any(&[Module::Seller, Module::Bilty, Module::Billing])?;
    let seller = state.store.read().await.get::<Seller>(&id).cloned();
    seller.map(Json).ok_or_else(|| AppError::not_found("Seller not found"))
}

pub async fn create_seller(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(mut req): Json<CreateSellerRequest>,
) -> Result<(StatusCode, Json<Seller>), AppError> {
    session.authorize(Module::Seller)?;

    let errors = validate(
        Some(req.name.as_str()),
        Some(req.shop_name.as_str()),
        Some(req.address.as_str()),
        Some(req.mobile_number.as_str()),
    );
    if !errors.is_empty() {
        return Err(AppError::fields(errors));
    }
    req.name = req.name.trim().to_string();
    req.mobile_number = normalize_mobile_number(&req.mobile_number);

    let seller = state.backend.create_seller(&req).await.map_err(log_failure("create seller"))?;
    state.store.write().await.insert(seller.clone());

    tracing::info!(seller_id = %seller.id, "Seller created");
    Ok((StatusCode::CREATED, Json(seller)))
}

pub async fn update_seller(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(mut req): Json<UpdateSellerRequest>,
) -> Result<Json<Seller>, AppError> {
    session.authorize(Module::Seller)?;

    let errors = validate(
        req.name.as_deref(),
        req.shop_name.as_deref(),
        req.address.as_deref(),
        req.mobile_number.as_deref(),
    );
    if !errors.is_empty() {
        return Err(AppError::fields(errors));
    }
    req.mobile_number = req.mobile_number.as_deref().map(normalize_mobile_number);

    let seller = state.backend.update_seller(&id, &req).await.map_err(log_failure("update seller"))?;
    state.store.write().await.replace(seller.clone());

    tracing::info!(seller_id = %id, "Seller updated");
    Ok(Json(seller))
}

/// Bilties keep pointing at a deleted seller; they show it as unresolved.
pub async fn delete_seller(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    session.authorize(Module::Seller)?;

    state.backend.delete_seller(&id).await.map_err(log_failure("delete seller"))?;
    state.store.write().await.remove::<Seller>(&id);

    tracing::info!(seller_id = %id, "Seller deleted");
    Ok(StatusCode::NO_CONTENT)
}
