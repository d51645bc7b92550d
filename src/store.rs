//! Process-wide cache of every entity the screens list, loaded once at startup
//! and patched after each successful write.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use futures::future::try_join_all;

use crate::backend::Backend;
use crate::dtos::dashboard::DashboardStats;
use crate::error::AppError;
use crate::models::{Bilty, BillingRecord, Schedule, Seller, Supplier, Vehicle, VehicleStatus};
use crate::validation::normalize_vehicle_number;

#[derive(Debug, Clone, Default)]
pub struct DataStore {
    sellers: Vec<Seller>,
    suppliers: Vec<Supplier>,
    vehicles: Vec<Vehicle>,
    bilties: Vec<Bilty>,
    schedules: Vec<Schedule>,
    billing_records: Vec<BillingRecord>,
}

/// An entity kept in [`DataStore`]: where its list lives and how new rows are
/// placed in it.
pub trait Cached: Clone + Sized {
    fn id(&self) -> &str;
    fn list(store: &DataStore) -> &Vec<Self>;
    fn list_mut(store: &mut DataStore) -> &mut Vec<Self>;

    /// Newest-first lists take new rows at the head.
    fn place(list: &mut Vec<Self>, item: Self) {
        list.insert(0, item);
    }
}

macro_rules! cached {
    ($ty:ty, $field:ident) => {
        impl Cached for $ty {
            fn id(&self) -> &str {
                &self.id
            }
            fn list(store: &DataStore) -> &Vec<Self> {
                &store.$field
            }
            fn list_mut(store: &mut DataStore) -> &mut Vec<Self> {
                &mut store.$field
            }
        }
    };
}

cached!(Seller, sellers);
cached!(Supplier, suppliers);
cached!(Bilty, bilties);
cached!(BillingRecord, billing_records);

impl Cached for Vehicle {
    fn id(&self) -> &str {
        &self.id
    }
    fn list(store: &DataStore) -> &Vec<Self> {
        &store.vehicles
    }
    fn list_mut(store: &mut DataStore) -> &mut Vec<Self> {
        &mut store.vehicles
    }
    fn place(list: &mut Vec<Self>, item: Self) {
        list.push(item);
    }
}

impl Cached for Schedule {
    fn id(&self) -> &str {
        &self.id
    }
    fn list(store: &DataStore) -> &Vec<Self> {
        &store.schedules
    }
    fn list_mut(store: &mut DataStore) -> &mut Vec<Self> {
        &mut store.schedules
    }
    fn place(list: &mut Vec<Self>, item: Self) {
        list.insert(0, item);
        list.sort_by(|a, b| b.date.cmp(&a.date));
    }
}

impl DataStore {
    /// Fetches every table concurrently, then each bilty's product lines with
    /// one call per bilty.
    pub async fn load(backend: &dyn Backend) -> Result<Self, AppError> {
        let (sellers, suppliers, headers, vehicles, schedules, billing_records) = tokio::try_join!(
            backend.list_sellers(),
            backend.list_suppliers(),
            backend.list_bilties(),
            backend.list_vehicles(),
            backend.list_schedules(),
            backend.list_billing_records(),
        )?;

        let lines = try_join_all(headers.iter().map(|h| backend.list_product_details(&h.id))).await?;
        let bilties = headers
            .into_iter()
            .zip(lines)
            .map(|(header, lines)| Bilty::assemble(header, lines))
            .collect::<Vec<_>>();

        tracing::info!(
            sellers = sellers.len(),
            suppliers = suppliers.len(),
            bilties = bilties.len(),
            vehicles = vehicles.len(),
            "Data store loaded"
        );

        Ok(DataStore { sellers, suppliers, vehicles, bilties, schedules, billing_records })
    }

    pub fn all<T: Cached>(&self) -> &[T] {
        T::list(self)
    }

    pub fn get<T: Cached>(&self, id: &str) -> Option<&T> {
        T::list(self).iter().find(|item| item.id() == id)
    }

    pub fn insert<T: Cached>(&mut self, item: T) {
        T::place(T::list_mut(self), item);
    }

    /// Replaces the row with the same id in place. A row that is not cached yet
    /// is inserted instead.
    pub fn replace<T: Cached>(&mut self, item: T) {
        let list = T::list_mut(self);
        match list.iter().position(|existing| existing.id() == item.id()) {
            Some(index) => list[index] = item,
            None => T::place(list, item),
        }
    }

    pub fn remove<T: Cached>(&mut self, id: &str) -> Option<T> {
        let list = T::list_mut(self);
        let index = list.iter().position(|item| item.id() == id)?;
        Some(list.remove(index))
    }

    pub fn vehicle_by_number(&self, vehicle_no: &str) -> Option<&Vehicle> {
        let wanted = normalize_vehicle_number(vehicle_no);
        self.vehicles
            .iter()
            .find(|v| normalize_vehicle_number(&v.vehicle_no) == wanted)
    }

    pub fn seller_name(&self, seller_id: &str) -> Option<&str> {
        self.get::<Seller>(seller_id).map(|s| s.name.as_str())
    }

    pub fn vehicle_number(&self, vehicle_id: &str) -> Option<&str> {
        self.get::<Vehicle>(vehicle_id).map(|v| v.vehicle_no.as_str())
    }

    /// "Today" is the calendar date of `now` at `offset`.
    pub fn dashboard_stats(&self, now: DateTime<Utc>, offset: FixedOffset) -> DashboardStats {
        let today = now.with_timezone(&offset).date_naive();

        let total_bilties_today = self
            .bilties
            .iter()
            .filter(|b| b.created_at.with_timezone(&offset).date_naive() == today)
            .count();
        let total_vehicles_active = self
            .vehicles
            .iter()
            .filter(|v| v.status == VehicleStatus::Active)
            .count();
        let total_advance_paid: f64 = self.bilties.iter().map(|b| b.advance).sum();

        // Bilty summaries never carry a plant, so this only matches suppliers
        // whose plant name is empty.
        let mut supplier_dispatch_percentage = BTreeMap::new();
        for supplier in &self.suppliers {
            let share = if self.bilties.is_empty() {
                0.0
            } else {
                let matched = self
                    .bilties
                    .iter()
                    .filter(|b| b.product.plant == supplier.plant_name)
                    .count();
                matched as f64 / self.bilties.len() as f64 * 100.0
            };
            supplier_dispatch_percentage.insert(supplier.name.clone(), share);
        }

        let net_outstanding: f64 = self
            .billing_records
            .iter()
            .filter(|r| r.status.is_outstanding())
            .map(|r| r.net_amount)
            .sum();

        DashboardStats {
            total_bilties_today,
            total_vehicles_active,
            total_advance_paid,
            supplier_dispatch_percentage,
            net_outstanding,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};

    use super::*;
    use crate::backend::{MemoryBackend, NewBilty, NewProductDetail};
    use crate::config::ist;
    use crate::dtos::billing::CreateBillingRecordRequest;
    use crate::dtos::supplier::CreateSupplierRequest;
    use crate::dtos::vehicle::CreateVehicleRequest;
    use crate::models::{BillingStatus, BiltyStatus, Shift};

    fn vehicle(number: &str, status: VehicleStatus) -> CreateVehicleRequest {
        CreateVehicleRequest {
            transport_name: "Shree Transport".into(),
            driver_name: "Ramesh".into(),
            vehicle_no: number.into(),
            driver_mobile: "9876543210".into(),
            transport_mobile: None,
            date_time: None,
            product_info: String::new(),
            quantity: 0.0,
            advance: 0.0,
            status,
        }
    }

    fn new_bilty(number: &str, vehicle_id: &str, advance: f64) -> NewBilty {
        NewBilty {
            bilty_number: number.into(),
            seller_id: "s1".into(),
            vehicle_id: vehicle_id.into(),
            delivery_address: "APMC Vashi".into(),
            rent: 10_000.0,
            advance,
            driver_tips: 0.0,
            total_crates_bags: 0.0,
            status: BiltyStatus::Pending,
        }
    }

    fn line(name: &str, crates: f64) -> NewProductDetail {
        NewProductDetail {
            product_name: name.into(),
            unit_type: "crate".into(),
            quantity: crates,
            total_crates_bags: crates,
            remarks: String::new(),
        }
    }

    async fn seeded() -> MemoryBackend {
        let backend = MemoryBackend::new();
        let active = backend.create_vehicle(&vehicle("MH12AB1234", VehicleStatus::Active)).await.expect("vehicle");
        backend.create_vehicle(&vehicle("MH14CD5678", VehicleStatus::Idle)).await.expect("vehicle");
        backend
            .create_bilty(&new_bilty("BLT00000101", &active.id, 2_000.0), &[line("Tomato", 10.0), line("Onion", 5.0)])
            .await
            .expect("bilty");
        backend
            .create_bilty(&new_bilty("BLT00000202", &active.id, 500.0), &[line("Tomato", 3.0)])
            .await
            .expect("bilty");
        backend
            .create_supplier(&CreateSupplierRequest {
                name: "Green Farms".into(),
                contact_number: String::new(),
                address: "Nashik".into(),
                product_category: "Tomato".into(),
                plant_name: "Nashik Plant".into(),
            })
            .await
            .expect("supplier");
        for (amount, advance, status) in [
            (5_000.0, 1_000.0, BillingStatus::Pending),
            (3_000.0, 0.0, BillingStatus::Overdue),
            (9_000.0, 0.0, BillingStatus::Paid),
        ] {
            backend
                .create_billing_record(
                    &CreateBillingRecordRequest {
                        vehicle_no: "MH12AB1234".into(),
                        date: NaiveDate::from_ymd_opt(2026, 10, 16).expect("date"),
                        amount,
                        seller_id: "s1".into(),
                        advance,
                        status,
                    },
                    crate::models::billing::net_amount(amount, advance),
                )
                .await
                .expect("record");
        }
        backend
    }

    #[tokio::test]
    async fn load_decorates_bilties_with_their_lines() {
        let backend = seeded().await;
        let store = DataStore::load(&backend).await.expect("load");

        let bilties = store.all::<Bilty>();
        assert_eq!(bilties.len(), 2);
        assert_eq!(bilties[0].bilty_number, "BLT00000202");
        assert_eq!(bilties[1].product_details.len(), 2);
        assert_eq!(bilties[1].total_crates_bags, 15.0);
        assert_eq!(bilties[1].product.name, "Tomato");
    }

    #[tokio::test]
    async fn load_fails_when_any_table_fails() {
        let backend = seeded().await;
        backend.fail_next("list_product_details").await;
        assert!(DataStore::load(&backend).await.is_err());
    }

    #[tokio::test]
    async fn dashboard_aggregates_the_cache() {
        let backend = seeded().await;
        let store = DataStore::load(&backend).await.expect("load");

        let stats = store.dashboard_stats(Utc::now(), ist());
        assert_eq!(stats.total_bilties_today, 2);
        assert_eq!(stats.total_vehicles_active, 1);
        assert_eq!(stats.total_advance_paid, 2_500.0);
        assert_eq!(stats.net_outstanding, 7_000.0);
        assert_eq!(stats.supplier_dispatch_percentage.get("Green Farms"), Some(&0.0));
    }

    #[tokio::test]
    async fn today_is_a_calendar_day_at_the_configured_offset() {
        let backend = seeded().await;
        let store = DataStore::load(&backend).await.expect("load");

        let tomorrow = Utc::now() + chrono::Duration::days(1);
        assert_eq!(store.dashboard_stats(tomorrow, ist()).total_bilties_today, 0);
    }

    #[test]
    fn empty_store_has_zero_stats() {
        let stats = DataStore::default().dashboard_stats(Utc.with_ymd_and_hms(2026, 10, 16, 6, 0, 0).unwrap(), ist());
        assert_eq!(stats.total_bilties_today, 0);
        assert_eq!(stats.total_advance_paid, 0.0);
        assert!(stats.supplier_dispatch_percentage.is_empty());
    }

    #[tokio::test]
    async fn patches_follow_list_ordering() {
        let backend = seeded().await;
        let mut store = DataStore::load(&backend).await.expect("load");

        let added = backend.create_vehicle(&vehicle("KA01EF9012", VehicleStatus::Active)).await.expect("vehicle");
        store.insert(added.clone());
        assert_eq!(store.all::<Vehicle>().last().map(|v| v.id.as_str()), Some(added.id.as_str()));

        let mut renamed = added.clone();
        renamed.driver_name = "Suresh".into();
        store.replace(renamed);
        assert_eq!(store.get::<Vehicle>(&added.id).map(|v| v.driver_name.as_str()), Some("Suresh"));
        assert_eq!(store.all::<Vehicle>().len(), 3);

        assert!(store.remove::<Vehicle>(&added.id).is_some());
        assert!(store.remove::<Vehicle>(&added.id).is_none());

        let early = Schedule {
            id: "sc1".into(),
            shift: Shift::Morning,
            in_time: "06:00".into(),
            out_time: "14:00".into(),
            driver_id: "d1".into(),
            operating_days: 20,
            tax_deduction: 0.0,
            final_payment: 10_000.0,
            date: NaiveDate::from_ymd_opt(2026, 9, 1).expect("date"),
            created_at: Utc::now(),
        };
        let late = Schedule { id: "sc2".into(), date: NaiveDate::from_ymd_opt(2026, 10, 1).expect("date"), ..early.clone() };
        store.insert(late);
        store.insert(early);
        let ids: Vec<&str> = store.all::<Schedule>().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["sc2", "sc1"]);
    }

    #[tokio::test]
    async fn vehicles_are_found_by_any_spacing_of_their_number() {
        let backend = seeded().await;
        let store = DataStore::load(&backend).await.expect("load");
        assert!(store.vehicle_by_number("mh 12 ab 1234").is_some());
        assert!(store.vehicle_by_number("MH99ZZ0000").is_none());
    }
}
