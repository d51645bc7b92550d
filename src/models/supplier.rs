use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub contact_number: String,
    pub address: String,
    pub product_category: String,
    pub plant_name: String,
    pub created_at: DateTime<Utc>,
}
