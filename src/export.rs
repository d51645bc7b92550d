//! CSV rendering of the filtered billing record list.

use chrono::NaiveDate;

use crate::models::{BillingRecord, Seller};
use crate::store::DataStore;

pub const HEADERS: [&str; 7] = ["Vehicle No", "Date", "Seller", "Amount", "Advance", "Net Amount", "Status"];

/// `6 Oct 2026`.
pub fn display_date(date: NaiveDate) -> String {
    date.format("%-d %b %Y").to_string()
}

pub fn export_filename(today: NaiveDate) -> String {
    format!("billing-records-{}.csv", today.format("%Y-%m-%d"))
}

fn field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn row<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| field(v.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Header row plus one row per record. Sellers that no longer exist render
/// as an empty cell.
pub fn billing_records_csv(store: &DataStore, records: &[BillingRecord]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(row(HEADERS));
    for record in records {
        let seller = store
            .get::<Seller>(&record.seller_id)
            .map(|s| s.name.clone())
            .unwrap_or_default();
        lines.push(row([
            record.vehicle_no.clone(),
            display_date(record.date),
            seller,
            record.amount.to_string(),
            record.advance.to_string(),
            record.net_amount.to_string(),
            record.status.to_string(),
        ]));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::BillingStatus;

    fn record(seller_id: &str) -> BillingRecord {
        BillingRecord {
            id: "r1".into(),
            vehicle_no: "MH12AB1234".into(),
            date: NaiveDate::from_ymd_opt(2026, 10, 6).expect("date"),
            amount: 5_000.0,
            seller_id: seller_id.into(),
            advance: 1_250.5,
            net_amount: 3_749.5,
            status: BillingStatus::Overdue,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn dates_and_filenames() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).expect("date");
        assert_eq!(display_date(date), "16 Oct 2026");
        assert_eq!(display_date(NaiveDate::from_ymd_opt(2026, 3, 5).expect("date")), "5 Mar 2026");
        assert_eq!(export_filename(date), "billing-records-2026-10-16.csv");
    }

    #[test]
    fn fields_with_separators_are_quoted() {
        assert_eq!(field("plain"), "plain");
        assert_eq!(field("Patil, Sons"), "\"Patil, Sons\"");
        assert_eq!(field("the \"best\""), "\"the \"\"best\"\"\"");
    }

    #[test]
    fn unknown_sellers_render_blank() {
        let csv = billing_records_csv(&DataStore::default(), &[record("gone")]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Vehicle No,Date,Seller,Amount,Advance,Net Amount,Status"));
        assert_eq!(lines.next(), Some("MH12AB1234,6 Oct 2026,,5000,1250.5,3749.5,Overdue"));
        assert_eq!(lines.next(), None);
    }
}
