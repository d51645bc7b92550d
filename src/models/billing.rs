use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr)]
pub enum BillingStatus {
    Paid,
    #[default]
    Pending,
    Overdue,
}

impl BillingStatus {
    /// Counted towards the dashboard's net outstanding.
    pub fn is_outstanding(self) -> bool {
        matches!(self, BillingStatus::Pending | BillingStatus::Overdue)
    }
}

/// Summary billing, one row per vehicle and date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingRecord {
    pub id: String,
    pub vehicle_no: String,
    pub date: NaiveDate,
    pub amount: f64,
    pub seller_id: String,
    pub advance: f64,
    pub net_amount: f64,
    pub status: BillingStatus,
    pub created_at: DateTime<Utc>,
}

/// Fixed at creation; later edits to amount or advance do not touch it.
pub fn net_amount(amount: f64, advance: f64) -> f64 {
    (amount - advance).max(0.0)
}

/// Per-bilty billing header priced line by line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BiltyBilling {
    pub id: String,
    pub bilty_id: String,
    pub commission: f64,
    pub driver_paid: f64,
    pub net_total: f64,
    pub billing_date: NaiveDate,
    pub remark: String,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<BillingLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingLine {
    pub id: String,
    pub billing_id: String,
    pub product_detail_id: String,
    pub sold_price: f64,
    pub total_amount: f64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_amount_never_goes_negative() {
        assert_eq!(net_amount(10_000.0, 2_500.0), 7_500.0);
        assert_eq!(net_amount(1_000.0, 1_500.0), 0.0);
    }

    #[test]
    fn only_pending_and_overdue_are_outstanding() {
        assert!(BillingStatus::Pending.is_outstanding());
        assert!(BillingStatus::Overdue.is_outstanding());
        assert!(!BillingStatus::Paid.is_outstanding());
    }
}
