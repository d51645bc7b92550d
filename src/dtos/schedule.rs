use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::Shift;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    #[serde(default)]
    pub shift: Shift,
    pub in_time: String,
    pub out_time: String,
    pub driver_id: String,
    pub operating_days: i32,
    #[serde(default)]
    pub tax_deduction: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScheduleRequest {
    pub shift: Option<Shift>,
    pub in_time: Option<String>,
    pub out_time: Option<String>,
    pub driver_id: Option<String>,
    pub operating_days: Option<i32>,
    pub tax_deduction: Option<f64>,
    pub final_payment: Option<f64>,
    pub date: Option<NaiveDate>,
}
