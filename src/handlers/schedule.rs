use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::auth::session::{Module, Session};
use crate::dtos::schedule::{CreateScheduleRequest, UpdateScheduleRequest};
use crate::error::{AppError, FieldErrors};
use crate::models::schedule::final_payment;
use crate::models::Schedule;
use crate::state::AppState;
use crate::workflow::log_failure;

#[derive(Default)]
struct ScheduleFields<'a> {
    driver_id: Option<&'a str>,
    in_time: Option<&'a str>,
    out_time: Option<&'a str>,
    operating_days: Option<i32>,
    tax_deduction: Option<f64>,
    final_payment: Option<f64>,
}

fn validate(fields: ScheduleFields<'_>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if fields.driver_id.is_some_and(|d| d.trim().is_empty()) {
        errors.insert("driverId".into(), "Driver ID is required".into());
    }
    if fields.in_time.is_some_and(|t| t.trim().is_empty()) {
        errors.insert("inTime".into(), "In time is required".into());
    }
    if fields.out_time.is_some_and(|t| t.trim().is_empty()) {
        errors.insert("outTime".into(), "Out time is required".into());
    }
    if fields.operating_days.is_some_and(|d| !(0..=31).contains(&d)) {
        errors.insert("operatingDays".into(), "Operating days must be between 0 and 31".into());
    }
    if fields.tax_deduction.is_some_and(|t| t < 0.0) {
        errors.insert("taxDeduction".into(), "Tax deduction cannot be negative".into());
    }
    if fields.final_payment.is_some_and(|p| p < 0.0) {
        errors.insert("finalPayment".into(), "Final payment cannot be negative".into());
    }
    errors
}

pub async fn list_schedules(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<Schedule>>, AppError> {
    session.authorize(Module::Schedule)?;
    let schedules = state.store.read().await.all::<Schedule>().to_vec();
    Ok(Json(schedules))
}

pub async fn get_schedule(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<Schedule>, AppError> {
    session.authorize(Module::Schedule)?;
    let schedule = state.store.read().await.get::<Schedule>(&id).cloned();
    schedule.map(Json).ok_or_else(|| AppError::not_found("Schedule not found"))
}

pub async fn create_schedule(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<Schedule>), AppError> {
    session.authorize(Module::Schedule)?;

    let errors = validate(ScheduleFields {
        driver_id: Some(&req.driver_id),
        in_time: Some(&req.in_time),
        out_time: Some(&req.out_time),
        operating_days: Some(req.operating_days),
        tax_deduction: Some(req.tax_deduction),
        final_payment: None,
    });
    if !errors.is_empty() {
        return Err(AppError::fields(errors));
    }

    let payment = final_payment(req.operating_days, req.tax_deduction);
    let schedule = state
        .backend
        .create_schedule(&req, payment)
        .await
        .map_err(log_failure("create schedule"))?;
    state.store.write().await.insert(schedule.clone());

    tracing::info!(schedule_id = %schedule.id, driver_id = %schedule.driver_id, final_payment = payment, "Schedule created");
    Ok((StatusCode::CREATED, Json(schedule)))
}

/// The final payment is taken as sent; it is never recomputed here.
pub async fn update_schedule(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(req): Json<UpdateScheduleRequest>,
) -> Result<Json<Schedule>, AppError> {
    session.authorize(Module::Schedule)?;

    let errors = validate(ScheduleFields {
        driver_id: req.driver_id.as_deref(),
        in_time: req.in_time.as_deref(),
        out_time: req.out_time.as_deref(),
        operating_days: req.operating_days,
        tax_deduction: req.tax_deduction,
        final_payment: req.final_payment,
    });
    if !errors.is_empty() {
        return Err(AppError::fields(errors));
    }

    let schedule = state
        .backend
        .update_schedule(&id, &req)
        .await
        .map_err(log_failure("update schedule"))?;
    state.store.write().await.replace(schedule.clone());

    tracing::info!(schedule_id = %id, "Schedule updated");
    Ok(Json(schedule))
}

pub async fn delete_schedule(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    session.authorize(Module::Schedule)?;

    state.backend.delete_schedule(&id).await.map_err(log_failure("delete schedule"))?;
    state.store.write().await.remove::<Schedule>(&id);

    tracing::info!(schedule_id = %id, "Schedule deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operating_days_are_bounded() {
        let check = |days| {
            validate(ScheduleFields { operating_days: Some(days), ..Default::default() })
                .contains_key("operatingDays")
        };
        assert!(!check(0));
        assert!(!check(31));
        assert!(check(32));
        assert!(check(-1));
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let errors = validate(ScheduleFields {
            driver_id: Some(""),
            tax_deduction: Some(-5.0),
            final_payment: Some(-1.0),
            ..Default::default()
        });
        assert_eq!(errors.len(), 3);
    }
}
