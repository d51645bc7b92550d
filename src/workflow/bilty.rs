//! Bilty create, edit, delete and status changes.
//!
//! Every write resolves the referenced vehicle first (updating the one with the
//! same normalized number or creating a new Active one), then persists the
//! bilty. A resolved vehicle is cached as soon as its write succeeds; the
//! bilty itself is cached only once every remote call has succeeded.

use chrono::Utc;

use super::log_failure;
use crate::backend::{Backend, BiltyChanges, NewBilty, NewProductDetail, BILLED_LINES};
use crate::bilty_number::generate_bilty_number;
use crate::conversion::{crates_bags, total_crates_bags};
use crate::dtos::bilty::{BiltySubmission, ProductLineInput, TransportDetails};
use crate::dtos::vehicle::{CreateVehicleRequest, UpdateVehicleRequest};
use crate::error::{AppError, FieldErrors};
use crate::models::{Bilty, BiltyHeader, BiltyStatus, ProductDetail, Seller, Vehicle, VehicleStatus};
use crate::state::AppState;
use crate::validation::{
    normalize_mobile_number, normalize_vehicle_number, validate_mobile_number, validate_vehicle_number,
};

/// Attempts at drawing an unused bilty number before giving up.
pub const MAX_NUMBER_ATTEMPTS: usize = 5;

/// Field-keyed validation of the bilty form. An empty map means valid.
///
/// Product lines are required on create; on edit `None` keeps the stored ones.
pub fn validate_submission(submission: &BiltySubmission, creating: bool, seller_known: bool) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let mut fail = |field: &str, msg: &str| {
        errors.insert(field.to_string(), msg.to_string());
    };

    if submission.seller_id.trim().is_empty() {
        fail("sellerId", "Please select a seller");
    } else if !seller_known {
        fail("sellerId", "Selected seller does not exist");
    }

    let transport = &submission.transport;
    if transport.transport_name.trim().is_empty() {
        fail("transportName", "Transport name is required");
    }
    if transport.driver_name.trim().is_empty() {
        fail("driverName", "Driver name is required");
    }
    if transport.driver_mobile.trim().is_empty() {
        fail("driverMobile", "Driver mobile is required");
    } else if let Err(msg) = validate_mobile_number(&transport.driver_mobile) {
        fail("driverMobile", msg);
    }
    if let Err(msg) = validate_vehicle_number(&transport.vehicle_no) {
        fail("vehicleNo", msg);
    }
    if let Err(msg) = validate_mobile_number(&transport.transport_mobile) {
        fail("transportMobile", msg);
    }

    if submission.delivery_address.trim().is_empty() {
        fail("deliveryAddress", "Delivery address is required");
    }

    if submission.rent <= 0.0 {
        fail("rent", "Rent must be greater than 0");
    }
    if submission.advance < 0.0 {
        fail("advance", "Advance cannot be negative");
    } else if submission.advance > submission.rent {
        fail("advance", "Advance cannot be greater than rent");
    }
    if submission.driver_tips < 0.0 {
        fail("driverTips", "Driver tips cannot be negative");
    }

    match &submission.product_details {
        Some(lines) if lines.is_empty() => fail("productDetails", "Add at least one product"),
        None if creating => fail("productDetails", "Add at least one product"),
        Some(lines) => {
            for (i, line) in lines.iter().enumerate() {
                if line.product_name.trim().is_empty() {
                    fail(&format!("product_{i}_name"), "Product name is required");
                }
                if line.unit_type.trim().is_empty() {
                    fail(&format!("product_{i}_unitType"), "Unit type is required");
                }
                if line.quantity <= 0.0 {
                    fail(&format!("product_{i}_quantity"), "Quantity must be greater than 0");
                }
            }
        }
        None => {}
    }

    errors
}

fn new_lines(inputs: &[ProductLineInput]) -> Vec<NewProductDetail> {
    inputs
        .iter()
        .map(|line| NewProductDetail {
            product_name: line.product_name.trim().to_string(),
            unit_type: line.unit_type.trim().to_string(),
            quantity: line.quantity,
            total_crates_bags: crates_bags(line.quantity, &line.unit_type),
            remarks: line.remarks.clone(),
        })
        .collect()
}

/// What a bilty writes onto the vehicle it travels with.
struct VehicleLoad<'a> {
    product_name: &'a str,
    quantity: f64,
    advance: f64,
}

/// Updates the vehicle with the same normalized number, or creates an Active
/// one, and caches the result. A later failure leaves the vehicle cached so a
/// resubmission finds it by number.
async fn resolve_vehicle(
    state: &AppState,
    transport: &TransportDetails,
    load: VehicleLoad<'_>,
) -> Result<Vehicle, AppError> {
    let vehicle_no = normalize_vehicle_number(&transport.vehicle_no);
    let driver_mobile = normalize_mobile_number(&transport.driver_mobile);
    let transport_mobile = Some(normalize_mobile_number(&transport.transport_mobile)).filter(|m| !m.is_empty());
    let product_info = format!("{} Transport", load.product_name);

    let existing = state.store.read().await.vehicle_by_number(&vehicle_no).map(|v| v.id.clone());
    let vehicle = match existing {
        Some(id) => {
            let changes = UpdateVehicleRequest {
                transport_name: Some(transport.transport_name.trim().to_string()),
                driver_name: Some(transport.driver_name.trim().to_string()),
                vehicle_no: Some(vehicle_no),
                driver_mobile: Some(driver_mobile),
                transport_mobile: Some(transport_mobile),
                date_time: Some(Utc::now()),
                product_info: Some(product_info),
                quantity: Some(load.quantity),
                advance: Some(load.advance),
                status: Some(VehicleStatus::Active),
            };
            state.backend.update_vehicle(&id, &changes).await?
        }
        None => {
            let vehicle = CreateVehicleRequest {
                transport_name: transport.transport_name.trim().to_string(),
                driver_name: transport.driver_name.trim().to_string(),
                vehicle_no,
                driver_mobile,
                transport_mobile,
                date_time: Some(Utc::now()),
                product_info,
                quantity: load.quantity,
                advance: load.advance,
                status: VehicleStatus::Active,
            };
            state.backend.create_vehicle(&vehicle).await?
        }
    };
    state.store.write().await.replace(vehicle.clone());
    Ok(vehicle)
}

/// Inserts header and lines, drawing a new number from `next_number` whenever
/// the backend reports the current one as taken.
pub(crate) async fn insert_with_fresh_number(
    backend: &dyn Backend,
    mut bilty: NewBilty,
    lines: &[NewProductDetail],
    mut next_number: impl FnMut() -> String,
) -> Result<(BiltyHeader, Vec<ProductDetail>), AppError> {
    let mut attempt = 1;
    loop {
        bilty.bilty_number = next_number();
        match backend.create_bilty(&bilty, lines).await {
            Err(AppError::Conflict(msg)) if attempt < MAX_NUMBER_ATTEMPTS => {
                tracing::warn!(bilty_number = %bilty.bilty_number, attempt, %msg, "Bilty number taken, drawing again");
                attempt += 1;
            }
            result => return result,
        }
    }
}

pub async fn create_bilty(state: &AppState, mut submission: BiltySubmission) -> Result<Bilty, AppError> {
    let seller = state.store.read().await.get::<Seller>(&submission.seller_id).cloned();
    if submission.delivery_address.trim().is_empty() {
        if let Some(seller) = &seller {
            submission.delivery_address = seller.address.clone();
        }
    }

    let errors = validate_submission(&submission, true, seller.is_some());
    if !errors.is_empty() {
        return Err(AppError::fields(errors));
    }

    let inputs = submission.product_details.as_deref().unwrap_or_default();
    let lines = new_lines(inputs);
    let load = VehicleLoad {
        product_name: lines.first().map_or("Tomato", |l| l.product_name.as_str()),
        quantity: inputs.iter().map(|l| l.quantity).sum(),
        advance: submission.advance,
    };
    let vehicle = resolve_vehicle(state, &submission.transport, load)
        .await
        .map_err(log_failure("resolve vehicle"))?;

    let header = NewBilty {
        bilty_number: String::new(),
        seller_id: submission.seller_id.clone(),
        vehicle_id: vehicle.id.clone(),
        delivery_address: submission.delivery_address.trim().to_string(),
        rent: submission.rent,
        advance: submission.advance,
        driver_tips: submission.driver_tips,
        total_crates_bags: total_crates_bags(lines.iter().map(|l| l.total_crates_bags)),
        status: submission.status,
    };
    let (header, details) = insert_with_fresh_number(state.backend.as_ref(), header, &lines, generate_bilty_number)
        .await
        .map_err(log_failure("create bilty"))?;
    let bilty = Bilty::assemble(header, details);

    state.store.write().await.insert(bilty.clone());

    tracing::info!(bilty_number = %bilty.bilty_number, lines = bilty.product_details.len(), "Bilty created");
    Ok(bilty)
}

/// Header overwrite plus, when lines are submitted, a replace-all of the
/// product lines. The cached bilty is rebuilt from the lines read back.
pub async fn update_bilty(state: &AppState, id: &str, mut submission: BiltySubmission) -> Result<Bilty, AppError> {
    let (existing, seller) = {
        let store = state.store.read().await;
        (store.get::<Bilty>(id).cloned(), store.get::<Seller>(&submission.seller_id).cloned())
    };
    let existing = existing.ok_or_else(|| AppError::not_found("Bilty not found"))?;
    if submission.delivery_address.trim().is_empty() {
        if let Some(seller) = &seller {
            submission.delivery_address = seller.address.clone();
        }
    }

    let errors = validate_submission(&submission, false, seller.is_some());
    if !errors.is_empty() {
        return Err(AppError::fields(errors));
    }

    let replacement = submission.product_details.as_deref().map(new_lines);
    if replacement.is_some() {
        let billings = state
            .backend
            .list_bilty_billings(id)
            .await
            .map_err(log_failure("check bilty billing"))?;
        if !billings.is_empty() {
            tracing::warn!(bilty_id = %id, billings = billings.len(), "Refusing to replace lines of a billed bilty");
            return Err(AppError::conflict(BILLED_LINES));
        }
    }
    let load = match (&submission.product_details, &replacement) {
        (Some(inputs), Some(lines)) => VehicleLoad {
            product_name: lines.first().map_or("Tomato", |l| l.product_name.as_str()),
            quantity: inputs.iter().map(|l| l.quantity).sum(),
            advance: submission.advance,
        },
        _ => VehicleLoad {
            product_name: existing.product.name.as_str(),
            quantity: existing.product.quantity,
            advance: submission.advance,
        },
    };
    let vehicle = resolve_vehicle(state, &submission.transport, load)
        .await
        .map_err(log_failure("resolve vehicle"))?;

    let changes = BiltyChanges {
        seller_id: submission.seller_id.clone(),
        vehicle_id: vehicle.id.clone(),
        delivery_address: submission.delivery_address.trim().to_string(),
        rent: submission.rent,
        advance: submission.advance,
        driver_tips: submission.driver_tips,
        status: submission.status,
        total_crates_bags: replacement
            .as_ref()
            .map(|lines| total_crates_bags(lines.iter().map(|l| l.total_crates_bags))),
    };
    let header = state
        .backend
        .update_bilty(id, &changes)
        .await
        .map_err(log_failure("update bilty"))?;
    if let Some(lines) = &replacement {
        state
            .backend
            .replace_product_details(id, lines)
            .await
            .map_err(log_failure("replace product lines"))?;
    }
    let details = state
        .backend
        .list_product_details(id)
        .await
        .map_err(log_failure("reload product lines"))?;
    let bilty = Bilty::assemble(header, details);

    state.store.write().await.replace(bilty.clone());

    tracing::info!(bilty_number = %bilty.bilty_number, replaced_lines = replacement.is_some(), "Bilty updated");
    Ok(bilty)
}

/// Removes the bilty with its lines and billing, then drops it from the cache.
pub async fn delete_bilty(state: &AppState, id: &str) -> Result<(), AppError> {
    state
        .backend
        .delete_bilty(id)
        .await
        .map_err(log_failure("delete bilty"))?;
    state.store.write().await.remove::<Bilty>(id);
    tracing::info!(bilty_id = %id, "Bilty deleted");
    Ok(())
}

pub async fn set_status(state: &AppState, id: &str, status: BiltyStatus) -> Result<Bilty, AppError> {
    let header = state
        .backend
        .set_bilty_status(id, status)
        .await
        .map_err(log_failure("set bilty status"))?;

    let cached = state.store.read().await.get::<Bilty>(id).map(|b| b.product_details.clone());
    let details = match cached {
        Some(details) => details,
        None => state
            .backend
            .list_product_details(id)
            .await
            .map_err(log_failure("reload product lines"))?,
    };
    let bilty = Bilty::assemble(header, details);
    state.store.write().await.replace(bilty.clone());

    tracing::info!(bilty_number = %bilty.bilty_number, status = %status, "Bilty status changed");
    Ok(bilty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn submission() -> BiltySubmission {
        BiltySubmission {
            seller_id: "s1".into(),
            transport: TransportDetails {
                transport_name: "Shree Transport".into(),
                driver_name: "Ramesh".into(),
                vehicle_no: "MH 12 AB 1234".into(),
                driver_mobile: "9876543210".into(),
                transport_mobile: String::new(),
            },
            delivery_address: "APMC Vashi".into(),
            rent: 12_000.0,
            advance: 5_000.0,
            driver_tips: 200.0,
            status: BiltyStatus::Pending,
            product_details: Some(vec![ProductLineInput {
                product_name: "Tomato".into(),
                unit_type: "kg".into(),
                quantity: 500.0,
                remarks: String::new(),
            }]),
        }
    }

    #[test]
    fn valid_submission_has_no_errors() {
        assert!(validate_submission(&submission(), true, true).is_empty());
    }

    #[test]
    fn errors_are_keyed_by_field() {
        let mut bad = submission();
        bad.seller_id = String::new();
        bad.transport.vehicle_no = "MH1AB1234".into();
        bad.transport.transport_mobile = "12345".into();
        bad.advance = 20_000.0;
        bad.driver_tips = -1.0;
        bad.product_details = Some(vec![ProductLineInput {
            product_name: " ".into(),
            unit_type: String::new(),
            quantity: 0.0,
            remarks: String::new(),
        }]);

        let errors = validate_submission(&bad, true, false);
        assert_eq!(errors.get("sellerId").map(String::as_str), Some("Please select a seller"));
        assert_eq!(
            errors.get("vehicleNo").map(String::as_str),
            Some(crate::validation::VEHICLE_NUMBER_FORMAT)
        );
        assert!(errors.contains_key("transportMobile"));
        assert_eq!(errors.get("advance").map(String::as_str), Some("Advance cannot be greater than rent"));
        assert!(errors.contains_key("driverTips"));
        assert!(errors.contains_key("product_0_name"));
        assert!(errors.contains_key("product_0_unitType"));
        assert!(errors.contains_key("product_0_quantity"));
    }

    #[test]
    fn unknown_seller_and_missing_lines() {
        let mut bad = submission();
        bad.product_details = None;
        let errors = validate_submission(&bad, true, false);
        assert_eq!(errors.get("sellerId").map(String::as_str), Some("Selected seller does not exist"));
        assert!(errors.contains_key("productDetails"));

        assert!(validate_submission(&bad, false, true).is_empty());
    }

    #[test]
    fn rent_must_be_positive() {
        let mut bad = submission();
        bad.rent = 0.0;
        bad.advance = 0.0;
        let errors = validate_submission(&bad, true, true);
        assert_eq!(errors.get("rent").map(String::as_str), Some("Rent must be greater than 0"));
        assert!(!errors.contains_key("advance"));
    }

    fn new_bilty(vehicle_id: &str) -> NewBilty {
        NewBilty {
            bilty_number: String::new(),
            seller_id: "s1".into(),
            vehicle_id: vehicle_id.into(),
            delivery_address: "APMC Vashi".into(),
            rent: 1_000.0,
            advance: 0.0,
            driver_tips: 0.0,
            total_crates_bags: 0.0,
            status: BiltyStatus::Pending,
        }
    }

    async fn backend_with_vehicle() -> (MemoryBackend, String) {
        let backend = MemoryBackend::new();
        let vehicle = backend
            .create_vehicle(&CreateVehicleRequest {
                transport_name: "Shree Transport".into(),
                driver_name: "Ramesh".into(),
                vehicle_no: "MH12AB1234".into(),
                driver_mobile: "9876543210".into(),
                transport_mobile: None,
                date_time: None,
                product_info: String::new(),
                quantity: 0.0,
                advance: 0.0,
                status: VehicleStatus::Active,
            })
            .await
            .expect("vehicle");
        (backend, vehicle.id)
    }

    #[tokio::test]
    async fn taken_numbers_are_redrawn() {
        let (backend, vehicle_id) = backend_with_vehicle().await;
        backend.create_bilty(&NewBilty { bilty_number: "BLT00000001".into(), ..new_bilty(&vehicle_id) }, &[])
            .await
            .expect("first bilty");

        let mut numbers = ["BLT00000001", "BLT00000001", "BLT00000002"].into_iter();
        let (header, _) = insert_with_fresh_number(&backend, new_bilty(&vehicle_id), &[], || {
            numbers.next().unwrap_or("BLT99999999").to_string()
        })
        .await
        .expect("redrawn");
        assert_eq!(header.bilty_number, "BLT00000002");
    }

    #[tokio::test]
    async fn redraws_stop_after_the_attempt_limit() {
        let (backend, vehicle_id) = backend_with_vehicle().await;
        backend.create_bilty(&NewBilty { bilty_number: "BLT00000001".into(), ..new_bilty(&vehicle_id) }, &[])
            .await
            .expect("first bilty");

        let mut draws = 0;
        let result = insert_with_fresh_number(&backend, new_bilty(&vehicle_id), &[], || {
            draws += 1;
            "BLT00000001".to_string()
        })
        .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(draws, MAX_NUMBER_ATTEMPTS);
    }
}
