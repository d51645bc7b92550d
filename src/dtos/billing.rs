use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{BillingRecord, BillingStatus};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillingRecordRequest {
    pub vehicle_no: String,
    pub date: NaiveDate,
    pub amount: f64,
    pub seller_id: String,
    #[serde(default)]
    pub advance: f64,
    #[serde(default)]
    pub status: BillingStatus,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBillingStatusRequest {
    pub status: BillingStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillingQuery {
    pub search: Option<String>,
    pub status: Option<BillingStatus>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingSummary {
    pub total_amount: f64,
    pub total_advance: f64,
    pub total_net: f64,
    pub pending_amount: f64,
    pub overdue_amount: f64,
}

#[derive(Debug, Serialize)]
pub struct BillingListResponse {
    pub records: Vec<BillingRecord>,
    pub summary: BillingSummary,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinePrice {
    pub product_detail_id: String,
    pub sold_price: f64,
}

/// Per-bilty billing form: a sold price for each product line plus deductions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingSubmission {
    #[serde(default)]
    pub prices: Vec<LinePrice>,
    #[serde(default)]
    pub commission: f64,
    #[serde(default)]
    pub driver_paid: f64,
    pub billing_date: Option<NaiveDate>,
    #[serde(default)]
    pub remark: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedLine {
    pub product_detail_id: String,
    pub product_name: String,
    pub quantity: f64,
    pub unit_type: String,
    pub total_crates_bags: f64,
    pub sold_price: f64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingComputation {
    pub lines: Vec<PricedLine>,
    pub gross_total: f64,
    pub commission: f64,
    pub driver_paid: f64,
    /// May be negative; never clamped.
    pub net_total: f64,
}
