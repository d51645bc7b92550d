use serde::{Deserialize, Serialize};

use crate::models::{Bilty, BiltyStatus};

/// Transport block of the bilty form. Drives the implicit vehicle upsert.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportDetails {
    pub transport_name: String,
    pub driver_name: String,
    pub vehicle_no: String,
    pub driver_mobile: String,
    #[serde(default)]
    pub transport_mobile: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductLineInput {
    pub product_name: String,
    pub unit_type: String,
    pub quantity: f64,
    #[serde(default)]
    pub remarks: String,
}

/// Create and edit share one form. On edit, `product_details: None` keeps the
/// stored lines; `Some` replaces all of them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiltySubmission {
    pub seller_id: String,
    pub transport: TransportDetails,
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default)]
    pub rent: f64,
    #[serde(default)]
    pub advance: f64,
    #[serde(default)]
    pub driver_tips: f64,
    #[serde(default)]
    pub status: BiltyStatus,
    pub product_details: Option<Vec<ProductLineInput>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBiltyStatusRequest {
    pub status: BiltyStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct BiltyQuery {
    pub search: Option<String>,
    pub status: Option<BiltyStatus>,
}

/// A cached bilty with the fields resolved for display. Missing sellers or
/// vehicles render as `null` rather than failing the request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BiltyResponse {
    #[serde(flatten)]
    pub bilty: Bilty,
    pub remaining: f64,
    pub vehicle_no: Option<String>,
    pub seller_name: Option<String>,
}
