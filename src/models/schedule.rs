use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Base pay per operating day used when a schedule is first created.
pub const DAILY_RATE: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr)]
pub enum Shift {
    #[default]
    Morning,
    Evening,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: String,
    pub shift: Shift,
    pub in_time: String,
    pub out_time: String,
    pub driver_id: String,
    pub operating_days: i32,
    pub tax_deduction: f64,
    pub final_payment: f64,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// `max(0, days × 500 − tax)`. Applied on create only; updates keep whatever
/// final payment the caller sends.
pub fn final_payment(operating_days: i32, tax_deduction: f64) -> f64 {
    (f64::from(operating_days) * DAILY_RATE - tax_deduction).max(0.0)
}
