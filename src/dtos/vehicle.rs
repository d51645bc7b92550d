use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Vehicle, VehicleStatus};
use crate::validation::format_vehicle_number;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleRequest {
    pub transport_name: String,
    pub driver_name: String,
    pub vehicle_no: String,
    pub driver_mobile: String,
    pub transport_mobile: Option<String>,
    pub date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub product_info: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub advance: f64,
    #[serde(default)]
    pub status: VehicleStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleRequest {
    pub transport_name: Option<String>,
    pub driver_name: Option<String>,
    pub vehicle_no: Option<String>,
    pub driver_mobile: Option<String>,
    pub transport_mobile: Option<Option<String>>, // Some(Some(m)) set, Some(None) clear, None ignore
    pub date_time: Option<DateTime<Utc>>,
    pub product_info: Option<String>,
    pub quantity: Option<f64>,
    pub advance: Option<f64>,
    pub status: Option<VehicleStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VehicleQuery {
    pub search: Option<String>,
    pub status: Option<VehicleStatus>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleResponse {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub vehicle_no_display: String,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        let vehicle_no_display = format_vehicle_number(&vehicle.vehicle_no);
        VehicleResponse { vehicle, vehicle_no_display }
    }
}
