//! Per-bilty billing priced line by line, and the summary billing records.

use chrono::Utc;

use super::log_failure;
use crate::backend::{NewBillingLine, NewBiltyBilling};
use crate::conversion::round2;
use crate::dtos::billing::{
    BillingComputation, BillingQuery, BillingSubmission, BillingSummary, CreateBillingRecordRequest, PricedLine,
};
use crate::error::{AppError, FieldErrors};
use crate::models::billing::net_amount;
use crate::models::{BillingRecord, BillingStatus, Bilty, BiltyBilling, ProductDetail, Seller};
use crate::state::AppState;
use crate::store::DataStore;
use crate::validation::{normalize_vehicle_number, validate_vehicle_number};

pub const MISSING_PRICE: &str = "Please enter sold price for all products";
pub const NEGATIVE_DEDUCTION: &str = "Commission and driver payment cannot be negative";

/// Prices every product line of a bilty. Line totals are crate/bag
/// denominated: `sold_price × total_crates_bags`, never the raw quantity.
/// The net total may be negative.
pub fn compute_billing(lines: &[ProductDetail], submission: &BillingSubmission) -> Result<BillingComputation, AppError> {
    if lines.is_empty() {
        return Err(AppError::validation("Bilty has no product lines to bill"));
    }
    if let Some(stray) = submission
        .prices
        .iter()
        .find(|p| !lines.iter().any(|l| l.id == p.product_detail_id))
    {
        return Err(AppError::validation(format!(
            "Product line {} does not belong to this bilty",
            stray.product_detail_id
        )));
    }
    if submission.commission < 0.0 || submission.driver_paid < 0.0 {
        return Err(AppError::validation(NEGATIVE_DEDUCTION));
    }

    let mut priced = Vec::with_capacity(lines.len());
    for line in lines {
        let sold_price = submission
            .prices
            .iter()
            .find(|p| p.product_detail_id == line.id)
            .map(|p| p.sold_price)
            .filter(|price| *price > 0.0)
            .ok_or_else(|| AppError::validation(MISSING_PRICE))?;
        priced.push(PricedLine {
            product_detail_id: line.id.clone(),
            product_name: line.product_name.clone(),
            quantity: line.quantity,
            unit_type: line.unit_type.clone(),
            total_crates_bags: line.total_crates_bags,
            sold_price,
            total_amount: round2(sold_price * line.total_crates_bags),
        });
    }

    let gross_total = round2(priced.iter().map(|l| l.total_amount).sum());
    let net_total = round2(gross_total - submission.commission - submission.driver_paid);

    Ok(BillingComputation {
        lines: priced,
        gross_total,
        commission: submission.commission,
        driver_paid: submission.driver_paid,
        net_total,
    })
}

async fn cached_lines(state: &AppState, bilty_id: &str) -> Result<Vec<ProductDetail>, AppError> {
    state
        .store
        .read()
        .await
        .get::<Bilty>(bilty_id)
        .map(|b| b.product_details.clone())
        .ok_or_else(|| AppError::not_found("Bilty not found"))
}

pub async fn preview_billing(
    state: &AppState,
    bilty_id: &str,
    submission: &BillingSubmission,
) -> Result<BillingComputation, AppError> {
    let lines = cached_lines(state, bilty_id).await?;
    compute_billing(&lines, submission)
}

/// Persists one header and one line per product line. Create-only.
pub async fn create_bilty_billing(
    state: &AppState,
    bilty_id: &str,
    submission: BillingSubmission,
) -> Result<BiltyBilling, AppError> {
    let lines = cached_lines(state, bilty_id).await?;
    let computation = compute_billing(&lines, &submission)?;

    let billing_date = submission
        .billing_date
        .unwrap_or_else(|| Utc::now().with_timezone(&state.config.local_offset).date_naive());
    let header = NewBiltyBilling {
        bilty_id: bilty_id.to_string(),
        commission: computation.commission,
        driver_paid: computation.driver_paid,
        net_total: computation.net_total,
        billing_date,
        remark: submission.remark.trim().to_string(),
    };
    let billing_lines: Vec<NewBillingLine> = computation
        .lines
        .iter()
        .map(|l| NewBillingLine {
            product_detail_id: l.product_detail_id.clone(),
            sold_price: l.sold_price,
            total_amount: l.total_amount,
        })
        .collect();

    let billing = state
        .backend
        .create_bilty_billing(&header, &billing_lines)
        .await
        .map_err(log_failure("create bilty billing"))?;

    tracing::info!(bilty_id = %bilty_id, billing_id = %billing.id, net_total = billing.net_total, "Billing recorded");
    Ok(billing)
}

pub async fn list_bilty_billings(state: &AppState, bilty_id: &str) -> Result<Vec<BiltyBilling>, AppError> {
    if state.store.read().await.get::<Bilty>(bilty_id).is_none() {
        return Err(AppError::not_found("Bilty not found"));
    }
    state
        .backend
        .list_bilty_billings(bilty_id)
        .await
        .map_err(log_failure("list bilty billings"))
}

pub fn validate_billing_record(req: &CreateBillingRecordRequest) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if let Err(msg) = validate_vehicle_number(&req.vehicle_no) {
        errors.insert("vehicleNo".into(), msg.into());
    }
    if req.seller_id.trim().is_empty() {
        errors.insert("sellerId".into(), "Please select a seller".into());
    }
    if req.amount <= 0.0 {
        errors.insert("amount".into(), "Amount must be greater than 0".into());
    }
    if req.advance < 0.0 {
        errors.insert("advance".into(), "Advance cannot be negative".into());
    }
    errors
}

/// The net amount is fixed here and never recomputed.
pub async fn create_billing_record(
    state: &AppState,
    mut req: CreateBillingRecordRequest,
) -> Result<BillingRecord, AppError> {
    let errors = validate_billing_record(&req);
    if !errors.is_empty() {
        return Err(AppError::fields(errors));
    }
    req.vehicle_no = normalize_vehicle_number(&req.vehicle_no);

    let record = state
        .backend
        .create_billing_record(&req, net_amount(req.amount, req.advance))
        .await
        .map_err(log_failure("create billing record"))?;
    state.store.write().await.insert(record.clone());

    tracing::info!(record_id = %record.id, vehicle_no = %record.vehicle_no, "Billing record created");
    Ok(record)
}

/// Any status may follow any other.
pub async fn set_billing_status(state: &AppState, id: &str, status: BillingStatus) -> Result<BillingRecord, AppError> {
    let record = state
        .backend
        .set_billing_status(id, status)
        .await
        .map_err(log_failure("set billing status"))?;
    state.store.write().await.replace(record.clone());
    tracing::info!(record_id = %id, status = %status, "Billing status changed");
    Ok(record)
}

pub async fn delete_billing_record(state: &AppState, id: &str) -> Result<(), AppError> {
    state
        .backend
        .delete_billing_record(id)
        .await
        .map_err(log_failure("delete billing record"))?;
    state.store.write().await.remove::<BillingRecord>(id);
    tracing::info!(record_id = %id, "Billing record deleted");
    Ok(())
}

/// Search matches vehicle number, seller name or shop name, case-insensitively.
pub fn filter_records(store: &DataStore, query: &BillingQuery) -> Vec<BillingRecord> {
    let term = query.search.as_deref().unwrap_or("").trim().to_lowercase();
    store
        .all::<BillingRecord>()
        .iter()
        .filter(|record| {
            if term.is_empty() {
                return true;
            }
            let seller = store.get::<Seller>(&record.seller_id);
            record.vehicle_no.to_lowercase().contains(&term)
                || seller.is_some_and(|s| s.name.to_lowercase().contains(&term))
                || seller.is_some_and(|s| s.shop_name.to_lowercase().contains(&term))
        })
        .filter(|record| query.status.map_or(true, |status| record.status == status))
        .filter(|record| query.date.map_or(true, |date| record.date == date))
        .cloned()
        .collect()
}

pub fn summarize(records: &[BillingRecord]) -> BillingSummary {
    let net_where = |status: BillingStatus| -> f64 {
        records.iter().filter(|r| r.status == status).map(|r| r.net_amount).sum()
    };
    BillingSummary {
        total_amount: records.iter().map(|r| r.amount).sum(),
        total_advance: records.iter().map(|r| r.advance).sum(),
        total_net: records.iter().map(|r| r.net_amount).sum(),
        pending_amount: net_where(BillingStatus::Pending),
        overdue_amount: net_where(BillingStatus::Overdue),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::dtos::billing::LinePrice;

    fn line(id: &str, unit: &str, quantity: f64, crates: f64) -> ProductDetail {
        ProductDetail {
            id: id.into(),
            bilty_id: "b1".into(),
            product_name: "Tomato".into(),
            unit_type: unit.into(),
            quantity,
            total_crates_bags: crates,
            remarks: String::new(),
            created_at: Utc::now(),
        }
    }

    fn price(id: &str, sold_price: f64) -> LinePrice {
        LinePrice { product_detail_id: id.into(), sold_price }
    }

    #[test]
    fn totals_use_crates_not_raw_quantity() {
        let lines = [line("pd1", "kg", 500.0, 10.0), line("pd2", "crate", 15.0, 15.0)];
        let submission = BillingSubmission {
            prices: vec![price("pd1", 250.0), price("pd2", 100.0)],
            commission: 300.0,
            driver_paid: 200.0,
            ..Default::default()
        };
        let computed = compute_billing(&lines, &submission).expect("valid billing");
        assert_eq!(computed.lines[0].total_amount, 2_500.0);
        assert_eq!(computed.lines[1].total_amount, 1_500.0);
        assert_eq!(computed.gross_total, 4_000.0);
        assert_eq!(computed.net_total, 3_500.0);
    }

    #[test]
    fn net_total_may_go_negative() {
        let lines = [line("pd1", "crate", 2.0, 2.0)];
        let submission = BillingSubmission {
            prices: vec![price("pd1", 10.0)],
            commission: 50.0,
            driver_paid: 0.0,
            ..Default::default()
        };
        assert_eq!(compute_billing(&lines, &submission).expect("valid").net_total, -30.0);
    }

    #[test]
    fn every_line_needs_a_positive_price() {
        let lines = [line("pd1", "crate", 2.0, 2.0), line("pd2", "crate", 3.0, 3.0)];
        let missing = BillingSubmission { prices: vec![price("pd1", 10.0)], ..Default::default() };
        assert!(matches!(
            compute_billing(&lines, &missing),
            Err(AppError::ValidationError(msg)) if msg == MISSING_PRICE
        ));

        let zero = BillingSubmission { prices: vec![price("pd1", 10.0), price("pd2", 0.0)], ..Default::default() };
        assert!(compute_billing(&lines, &zero).is_err());
    }

    #[test]
    fn deductions_cannot_be_negative() {
        let lines = [line("pd1", "crate", 2.0, 2.0)];
        let submission = BillingSubmission { prices: vec![price("pd1", 10.0)], commission: -1.0, ..Default::default() };
        assert!(matches!(
            compute_billing(&lines, &submission),
            Err(AppError::ValidationError(msg)) if msg == NEGATIVE_DEDUCTION
        ));
    }

    #[test]
    fn prices_for_foreign_lines_are_rejected() {
        let lines = [line("pd1", "crate", 2.0, 2.0)];
        let submission = BillingSubmission { prices: vec![price("pd1", 10.0), price("other", 5.0)], ..Default::default() };
        assert!(compute_billing(&lines, &submission).is_err());
    }

    fn record(amount: f64, advance: f64, status: BillingStatus) -> BillingRecord {
        BillingRecord {
            id: format!("r-{amount}"),
            vehicle_no: "MH12AB1234".into(),
            date: NaiveDate::from_ymd_opt(2026, 10, 16).expect("date"),
            amount,
            seller_id: "s1".into(),
            advance,
            net_amount: net_amount(amount, advance),
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn summary_splits_outstanding_by_status() {
        let records = [
            record(5_000.0, 1_000.0, BillingStatus::Pending),
            record(3_000.0, 0.0, BillingStatus::Overdue),
            record(2_000.0, 500.0, BillingStatus::Paid),
        ];
        let summary = summarize(&records);
        assert_eq!(summary.total_amount, 10_000.0);
        assert_eq!(summary.total_advance, 1_500.0);
        assert_eq!(summary.total_net, 8_500.0);
        assert_eq!(summary.pending_amount, 4_000.0);
        assert_eq!(summary.overdue_amount, 3_000.0);
    }

    #[test]
    fn billing_record_fields_are_checked() {
        let req = CreateBillingRecordRequest {
            vehicle_no: "bad".into(),
            date: NaiveDate::from_ymd_opt(2026, 10, 16).expect("date"),
            amount: 0.0,
            seller_id: String::new(),
            advance: -5.0,
            status: BillingStatus::Pending,
        };
        let errors = validate_billing_record(&req);
        assert_eq!(errors.len(), 4);
    }
}
