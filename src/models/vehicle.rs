use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr)]
pub enum VehicleStatus {
    #[default]
    Active,
    Idle,
    Maintenance,
}

/// `vehicle_no` is always the normalized registration number and is unique.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    pub transport_name: String,
    pub driver_name: String,
    pub vehicle_no: String,
    pub driver_mobile: String,
    pub transport_mobile: Option<String>,
    pub date_time: DateTime<Utc>,
    pub product_info: String,
    pub quantity: f64,
    pub advance: f64,
    pub status: VehicleStatus,
    pub created_at: DateTime<Utc>,
}
