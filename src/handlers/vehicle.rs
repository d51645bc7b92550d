use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::auth::session::{Module, Session};
use crate::dtos::vehicle::{CreateVehicleRequest, UpdateVehicleRequest, VehicleQuery, VehicleResponse};
use crate::error::{AppError, FieldErrors};
use crate::models::Vehicle;
use crate::state::AppState;
use crate::validation::{normalize_mobile_number, normalize_vehicle_number, validate_mobile_number, validate_vehicle_number};
use crate::workflow::log_failure;

#[derive(Default)]
struct VehicleFields<'a> {
    transport_name: Option<&'a str>,
    driver_name: Option<&'a str>,
    vehicle_no: Option<&'a str>,
    driver_mobile: Option<&'a str>,
    transport_mobile: Option<&'a str>,
    quantity: Option<f64>,
    advance: Option<f64>,
}

fn validate(fields: VehicleFields<'_>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if fields.transport_name.is_some_and(|v| v.trim().is_empty()) {
        errors.insert("transportName".into(), "Transport name is required".into());
    }
    if fields.driver_name.is_some_and(|v| v.trim().is_empty()) {
        errors.insert("driverName".into(), "Driver name is required".into());
    }
    if let Some(Err(msg)) = fields.vehicle_no.map(validate_vehicle_number) {
        errors.insert("vehicleNo".into(), msg.into());
    }
    if let Some(Err(msg)) = fields.driver_mobile.map(validate_mobile_number) {
        errors.insert("driverMobile".into(), msg.into());
    }
    if let Some(Err(msg)) = fields.transport_mobile.map(validate_mobile_number) {
        errors.insert("transportMobile".into(), msg.into());
    }
    if fields.quantity.is_some_and(|q| q < 0.0) {
        errors.insert("quantity".into(), "Quantity cannot be negative".into());
    }
    if fields.advance.is_some_and(|a| a < 0.0) {
        errors.insert("advance".into(), "Advance cannot be negative".into());
    }
    errors
}

fn normalize_optional_mobile(mobile: Option<&str>) -> Option<String> {
    mobile.map(normalize_mobile_number).filter(|m| !m.is_empty())
}

/// Search covers number, driver, transport and product info.
pub async fn list_vehicles(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<VehicleQuery>,
) -> Result<Json<Vec<VehicleResponse>>, AppError> {
    session.authorize_any(&[Module::Vehicle, Module::Bilty, Module::Billing])?;

    let term = query.search.unwrap_or_default().trim().to_lowercase();
    let compact = normalize_vehicle_number(&term).to_lowercase();
    let store = state.store.read().await;
    let vehicles = store
        .all::<Vehicle>()
        .iter()
        .filter(|v| {
            term.is_empty()
                || v.vehicle_no.to_lowercase().contains(&compact)
                || v.driver_name.to_lowercase().contains(&term)
                || v.transport_name.to_lowercase().contains(&term)
                || v.product_info.to_lowercase().contains(&term)
        })
        .filter(|v| query.status.map_or(true, |status| v.status == status))
        .cloned()
        .map(VehicleResponse::from)
        .collect();
    Ok(Json(vehicles))
}

pub async fn get_vehicle(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<VehicleResponse>, AppError> {
    session.authorize_any(&[Module::Vehicle, Module::Bilty])?;
    let vehicle = state.store.read().await.get::<Vehicle>(&id).cloned();
    vehicle
        .map(|v| Json(VehicleResponse::from(v)))
        .ok_or_else(|| AppError::not_found("Vehicle not found"))
}

pub async fn create_vehicle(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(mut req): Json<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<VehicleResponse>), AppError> {
    session.authorize(Module::Vehicle)?;

    let mut errors = validate(VehicleFields {
        transport_name: Some(&req.transport_name),
        driver_name: Some(&req.driver_name),
        vehicle_no: Some(&req.vehicle_no),
        driver_mobile: Some(&req.driver_mobile),
        transport_mobile: req.transport_mobile.as_deref(),
        quantity: Some(req.quantity),
        advance: Some(req.advance),
    });
    if req.driver_mobile.trim().is_empty() {
        errors.insert("driverMobile".into(), "Driver mobile is required".into());
    }
    if !errors.is_empty() {
        return Err(AppError::fields(errors));
    }
    req.vehicle_no = normalize_vehicle_number(&req.vehicle_no);
    req.driver_mobile = normalize_mobile_number(&req.driver_mobile);
    req.transport_mobile = normalize_optional_mobile(req.transport_mobile.as_deref());

    let vehicle = state.backend.create_vehicle(&req).await.map_err(log_failure("create vehicle"))?;
    state.store.write().await.insert(vehicle.clone());

    tracing::info!(vehicle_id = %vehicle.id, vehicle_no = %vehicle.vehicle_no, "Vehicle created");
    Ok((StatusCode::CREATED, Json(vehicle.into())))
}

pub async fn update_vehicle(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(mut req): Json<UpdateVehicleRequest>,
) -> Result<Json<VehicleResponse>, AppError> {
    session.authorize(Module::Vehicle)?;

    let errors = validate(VehicleFields {
        transport_name: req.transport_name.as_deref(),
        driver_name: req.driver_name.as_deref(),
        vehicle_no: req.vehicle_no.as_deref(),
        driver_mobile: req.driver_mobile.as_deref(),
        transport_mobile: req.transport_mobile.as_ref().and_then(|m| m.as_deref()),
        quantity: req.quantity,
        advance: req.advance,
    });
    if !errors.is_empty() {
        return Err(AppError::fields(errors));
    }
    req.vehicle_no = req.vehicle_no.as_deref().map(normalize_vehicle_number);
    req.driver_mobile = req.driver_mobile.as_deref().map(normalize_mobile_number);
    req.transport_mobile = req
        .transport_mobile
        .take()
        .map(|m| normalize_optional_mobile(m.as_deref()));

    let vehicle = state.backend.update_vehicle(&id, &req).await.map_err(log_failure("update vehicle"))?;
    state.store.write().await.replace(vehicle.clone());

    tracing::info!(vehicle_id = %id, "Vehicle updated");
    Ok(Json(vehicle.into()))
}

/// Refused while any bilty still references the vehicle.
pub async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    session.authorize(Module::Vehicle)?;

    state.backend.delete_vehicle(&id).await.map_err(log_failure("delete vehicle"))?;
    state.store.write().await.remove::<Vehicle>(&id);

    tracing::info!(vehicle_id = %id, "Vehicle deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_only_checks_supplied_fields() {
        assert!(validate(VehicleFields::default()).is_empty());

        let errors = validate(VehicleFields {
            vehicle_no: Some("XX"),
            advance: Some(-1.0),
            ..Default::default()
        });
        assert_eq!(errors.len(), 2);
        assert!(errors.contains_key("vehicleNo"));
        assert!(errors.contains_key("advance"));
    }

    #[test]
    fn blank_transport_mobile_is_cleared() {
        assert_eq!(normalize_optional_mobile(Some("")), None);
        assert_eq!(normalize_optional_mobile(Some("+91 98765 43210")).as_deref(), Some("9876543210"));
    }
}
