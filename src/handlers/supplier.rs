use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::auth::session::{Module, Session};
use crate::dtos::supplier::{CreateSupplierRequest, UpdateSupplierRequest};
use crate::error::{AppError, FieldErrors};
use crate::models::Supplier;
use crate::state::AppState;
use crate::validation::{normalize_mobile_number, validate_mobile_number};
use crate::workflow::log_failure;

fn validate(name: Option<&str>, plant_name: Option<&str>, contact: Option<&str>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if name.is_some_and(|n| n.trim().is_empty()) {
        errors.insert("name".into(), "Name is required".into());
    }
    if plant_name.is_some_and(|p| p.trim().is_empty()) {
        errors.insert("plantName".into(), "Plant name is required".into());
    }
    if let Some(Err(msg)) = contact.map(validate_mobile_number) {
        errors.insert("contactNumber".into(), msg.into());
    }
    errors
}

pub async fn list_suppliers(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<Supplier>>, AppError> {
    session.authorize_any(&[Module::Supplier, Module::Dashboard])?;
    let suppliers = state.store.read().await.all::<Supplier>().to_vec();
    Ok(Json(suppliers))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<Supplier>, AppError> {
    session.authorize(Module::Supplier)?;
    let supplier = state.store.read().await.get::<Supplier>(&id).cloned();
    supplier.map(Json).ok_or_else(|| AppError::not_found("Supplier not found"))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(mut req): Json<CreateSupplierRequest>,
) -> Result<(StatusCode, Json<Supplier>), AppError> {
    session.authorize(Module::Supplier)?;

    let errors = validate(Some(req.name.as_str()), Some(req.plant_name.as_str()), Some(req.contact_number.as_str()));
    if !errors.is_empty() {
        return Err(AppError::fields(errors));
    }
    req.contact_number = normalize_mobile_number(&req.contact_number);
    if req.product_category.trim().is_empty() {
        req.product_category = "Tomato".to_string();
    }

    let supplier = state.backend.create_supplier(&req).await.map_err(log_failure("create supplier"))?;
    state.store.write().await.insert(supplier.clone());

    tracing::info!(supplier_id = %supplier.id, "Supplier created");
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(mut req): Json<UpdateSupplierRequest>,
) -> Result<Json<Supplier>, AppError> {
    session.authorize(Module::Supplier)?;

    let errors = validate(req.name.as_deref(), req.plant_name.as_deref(), req.contact_number.as_deref());
    if !errors.is_empty() {
        return Err(AppError::fields(errors));
    }
    req.contact_number = req.contact_number.as_deref().map(normalize_mobile_number);

    let supplier = state.backend.update_supplier(&id, &req).await.map_err(log_failure("update supplier"))?;
    state.store.write().await.replace(supplier.clone());

    tracing::info!(supplier_id = %id, "Supplier updated");
    Ok(Json(supplier))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    session.authorize(Module::Supplier)?;

    state.backend.delete_supplier(&id).await.map_err(log_failure("delete supplier"))?;
    state.store.write().await.remove::<Supplier>(&id);

    tracing::info!(supplier_id = %id, "Supplier deleted");
    Ok(StatusCode::NO_CONTENT)
}
