use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_bilties_today: usize,
    pub total_vehicles_active: usize,
    pub total_advance_paid: f64,
    /// Supplier name -> share of all bilties, in percent.
    pub supplier_dispatch_percentage: BTreeMap<String, f64>,
    pub net_outstanding: f64,
}
