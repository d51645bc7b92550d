use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::conversion::total_crates_bags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr)]
pub enum BiltyStatus {
    #[default]
    Pending,
    #[serde(rename = "In Transit")]
    #[strum(serialize = "In Transit")]
    InTransit,
    Delivered,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    pub id: String,
    pub bilty_id: String,
    pub product_name: String,
    pub unit_type: String,
    pub quantity: f64,
    pub total_crates_bags: f64,
    pub remarks: String,
    pub created_at: DateTime<Utc>,
}

/// One-line summary shown in bilty lists. `plant` is never populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub plant: String,
}

impl ProductSummary {
    pub fn from_lines(lines: &[ProductDetail]) -> Self {
        let first = lines.first();
        ProductSummary {
            name: first.map_or_else(|| "Tomato".to_string(), |l| l.product_name.clone()),
            quantity: lines.iter().map(|l| l.quantity).sum(),
            unit: first.map_or_else(|| "kg".to_string(), |l| l.unit_type.clone()),
            plant: String::new(),
        }
    }
}

/// A bilty row as persisted, without its product lines.
#[derive(Debug, Clone, PartialEq)]
pub struct BiltyHeader {
    pub id: String,
    pub bilty_number: String,
    pub seller_id: String,
    pub vehicle_id: String,
    pub delivery_address: String,
    pub rent: f64,
    pub advance: f64,
    pub driver_tips: f64,
    pub total_crates_bags: f64,
    pub status: BiltyStatus,
    pub created_at: DateTime<Utc>,
}

/// A bilty decorated with its product lines, as cached and served.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bilty {
    pub id: String,
    pub bilty_number: String,
    pub seller_id: String,
    pub vehicle_id: String,
    pub delivery_address: String,
    pub rent: f64,
    pub advance: f64,
    pub driver_tips: f64,
    pub total_crates_bags: f64,
    pub status: BiltyStatus,
    pub created_at: DateTime<Utc>,
    pub product_details: Vec<ProductDetail>,
    pub product: ProductSummary,
}

impl Bilty {
    /// The aggregate always follows the lines it is assembled with.
    pub fn assemble(header: BiltyHeader, product_details: Vec<ProductDetail>) -> Self {
        let product = ProductSummary::from_lines(&product_details);
        Bilty {
            id: header.id,
            bilty_number: header.bilty_number,
            seller_id: header.seller_id,
            vehicle_id: header.vehicle_id,
            delivery_address: header.delivery_address,
            rent: header.rent,
            advance: header.advance,
            driver_tips: header.driver_tips,
            total_crates_bags: total_crates_bags(product_details.iter().map(|l| l.total_crates_bags)),
            status: header.status,
            created_at: header.created_at,
            product_details,
            product,
        }
    }

    pub fn remaining(&self) -> f64 {
        remaining(self.rent, self.advance)
    }
}

/// Freight still owed to the driver. Displayed, never persisted.
pub fn remaining(rent: f64, advance: f64) -> f64 {
    (rent - advance).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, unit: &str, quantity: f64, crates: f64) -> ProductDetail {
        ProductDetail {
            id: format!("pd-{name}-{quantity}"),
            bilty_id: "b1".into(),
            product_name: name.into(),
            unit_type: unit.into(),
            quantity,
            total_crates_bags: crates,
            remarks: String::new(),
            created_at: Utc::now(),
        }
    }

    fn header() -> BiltyHeader {
        BiltyHeader {
            id: "b1".into(),
            bilty_number: "BLT12345601".into(),
            seller_id: "s1".into(),
            vehicle_id: "v1".into(),
            delivery_address: "APMC Vashi".into(),
            rent: 12_000.0,
            advance: 5_000.0,
            driver_tips: 200.0,
            total_crates_bags: 999.0,
            status: BiltyStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn remaining_is_rent_minus_advance_floored() {
        assert_eq!(remaining(12_000.0, 5_000.0), 7_000.0);
        assert_eq!(remaining(1_000.0, 1_500.0), 0.0);
    }

    #[test]
    fn assemble_derives_aggregate_and_summary_from_lines() {
        let bilty = Bilty::assemble(
            header(),
            vec![line("Tomato", "crate", 10.0, 10.0), line("Onion", "bag", 15.0, 15.0)],
        );
        assert_eq!(bilty.total_crates_bags, 25.0);
        assert_eq!(bilty.product.name, "Tomato");
        assert_eq!(bilty.product.quantity, 25.0);
        assert_eq!(bilty.product.unit, "crate");
        assert_eq!(bilty.product.plant, "");
        assert_eq!(bilty.remaining(), 7_000.0);
    }

    #[test]
    fn summary_defaults_without_lines() {
        let bilty = Bilty::assemble(header(), Vec::new());
        assert_eq!(bilty.total_crates_bags, 0.0);
        assert_eq!(bilty.product.name, "Tomato");
        assert_eq!(bilty.product.unit, "kg");
    }

    #[test]
    fn status_uses_display_strings() {
        assert_eq!(BiltyStatus::InTransit.as_ref(), "In Transit");
        assert_eq!("In Transit".parse::<BiltyStatus>().ok(), Some(BiltyStatus::InTransit));
        assert_eq!(serde_json::to_string(&BiltyStatus::InTransit).ok().as_deref(), Some("\"In Transit\""));
    }
}
