use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    pub id: String,
    pub name: String,
    pub mobile_number: String,
    pub address: String,
    pub shop_name: String,
    pub created_at: DateTime<Utc>,
}
