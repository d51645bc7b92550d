use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Backend, BILLED_LINES, BiltyChanges, NewBillingLine, NewBilty, NewBiltyBilling, NewProductDetail};
use crate::dtos::billing::CreateBillingRecordRequest;
use crate::dtos::schedule::{CreateScheduleRequest, UpdateScheduleRequest};
use crate::dtos::seller::{CreateSellerRequest, UpdateSellerRequest};
use crate::dtos::supplier::{CreateSupplierRequest, UpdateSupplierRequest};
use crate::dtos::vehicle::{CreateVehicleRequest, UpdateVehicleRequest};
use crate::error::AppError;
use crate::models::{
    BillingLine, BillingRecord, BillingStatus, BiltyBilling, BiltyHeader, BiltyStatus, ProductDetail, Schedule,
    Seller, Supplier, Vehicle,
};

#[derive(Default)]
struct Tables {
    sellers: Vec<Seller>,
    suppliers: Vec<Supplier>,
    vehicles: Vec<Vehicle>,
    bilties: Vec<BiltyHeader>,
    product_details: Vec<ProductDetail>,
    schedules: Vec<Schedule>,
    billing_records: Vec<BillingRecord>,
    bilty_billings: Vec<BiltyBilling>,
    billing_lines: Vec<BillingLine>,
}

/// Process-local tables with the same ordering, uniqueness and cascade rules
/// as the Postgres schema.
#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
    failure: Mutex<Option<String>>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn newest_first<T: Clone>(rows: &[T]) -> Vec<T> {
    rows.iter().rev().cloned().collect()
}

fn find_mut<'a, T>(rows: &'a mut [T], id: &str, key: impl Fn(&T) -> &str, what: &str) -> Result<&'a mut T, AppError> {
    rows.iter_mut()
        .find(|r| key(r) == id)
        .ok_or_else(|| AppError::not_found(format!("{what} not found")))
}

fn remove_by_id<T>(rows: &mut Vec<T>, id: &str, key: impl Fn(&T) -> &str, what: &str) -> Result<(), AppError> {
    let before = rows.len();
    rows.retain(|r| key(r) != id);
    if rows.len() == before {
        return Err(AppError::not_found(format!("{what} not found")));
    }
    Ok(())
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call of `operation` (a [`Backend`] method name) fail
    /// with an internal error. Lets callers exercise their failure paths.
    pub async fn fail_next(&self, operation: &str) {
        *self.failure.lock().await = Some(operation.to_string());
    }

    async fn check(&self, operation: &str) -> Result<(), AppError> {
        let mut failure = self.failure.lock().await;
        if failure.as_deref() == Some(operation) {
            *failure = None;
            return Err(AppError::internal(format!("{operation} failed")));
        }
        Ok(())
    }

    fn insert_lines(tables: &mut Tables, bilty_id: &str, lines: &[NewProductDetail]) -> Vec<ProductDetail> {
        let now = Utc::now();
        let inserted: Vec<ProductDetail> = lines
            .iter()
            .map(|l| ProductDetail {
                id: new_id(),
                bilty_id: bilty_id.to_string(),
                product_name: l.product_name.clone(),
                unit_type: l.unit_type.clone(),
                quantity: l.quantity,
                total_crates_bags: l.total_crates_bags,
                remarks: l.remarks.clone(),
                created_at: now,
            })
            .collect();
        tables.product_details.extend(inserted.iter().cloned());
        inserted
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn list_sellers(&self) -> Result<Vec<Seller>, AppError> {
        self.check("list_sellers").await?;
        Ok(newest_first(&self.tables.lock().await.sellers))
    }

    async fn create_seller(&self, req: &CreateSellerRequest) -> Result<Seller, AppError> {
        self.check("create_seller").await?;
        let seller = Seller {
            id: new_id(),
            name: req.name.clone(),
            mobile_number: req.mobile_number.clone(),
            address: req.address.clone(),
            shop_name: req.shop_name.clone(),
            created_at: Utc::now(),
        };
        self.tables.lock().await.sellers.push(seller.clone());
        Ok(seller)
    }

    async fn update_seller(&self, id: &str, req: &UpdateSellerRequest) -> Result<Seller, AppError> {
        self.check("update_seller").await?;
        let mut tables = self.tables.lock().await;
        let seller = find_mut(&mut tables.sellers, id, |s| s.id.as_str(), "Seller")?;
        if let Some(name) = &req.name {
            seller.name = name.clone();
        }
        if let Some(mobile) = &req.mobile_number {
            seller.mobile_number = mobile.clone();
        }
        if let Some(address) = &req.address {
            seller.address = address.clone();
        }
        if let Some(shop) = &req.shop_name {
            seller.shop_name = shop.clone();
        }
        Ok(seller.clone())
    }

    async fn delete_seller(&self, id: &str) -> Result<(), AppError> {
        self.check("delete_seller").await?;
        remove_by_id(&mut self.tables.lock().await.sellers, id, |s| s.id.as_str(), "Seller")
    }

    async fn list_suppliers(&self) -> Result<Vec<Supplier>, AppError> {
        self.check("list_suppliers").await?;
        Ok(newest_first(&self.tables.lock().await.suppliers))
    }

    async fn create_supplier(&self, req: &CreateSupplierRequest) -> Result<Supplier, AppError> {
        self.check("create_supplier").await?;
        let supplier = Supplier {
            id: new_id(),
            name: req.name.clone(),
            contact_number: req.contact_number.clone(),
            address: req.address.clone(),
            product_category: req.product_category.clone(),
            plant_name: req.plant_name.clone(),
            created_at: Utc::now(),
        };
        self.tables.lock().await.suppliers.push(supplier.clone());
        Ok(supplier)
    }

    async fn update_supplier(&self, id: &str, req: &UpdateSupplierRequest) -> Result<Supplier, AppError> {
        self.check("update_supplier").await?;
        let mut tables = self.tables.lock().await;
        let supplier = find_mut(&mut tables.suppliers, id, |s| s.id.as_str(), "Supplier")?;
        if let Some(name) = &req.name {
            supplier.name = name.clone();
        }
        if let Some(contact) = &req.contact_number {
            supplier.contact_number = contact.clone();
        }
        if let Some(address) = &req.address {
            supplier.address = address.clone();
        }
        if let Some(category) = &req.product_category {
            supplier.product_category = category.clone();
        }
        if let Some(plant) = &req.plant_name {
            supplier.plant_name = plant.clone();
        }
        Ok(supplier.clone())
    }

    async fn delete_supplier(&self, id: &str) -> Result<(), AppError> {
        self.check("delete_supplier").await?;
        remove_by_id(&mut self.tables.lock().await.suppliers, id, |s| s.id.as_str(), "Supplier")
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, AppError> {
        self.check("list_vehicles").await?;
        Ok(self.tables.lock().await.vehicles.clone())
    }

    async fn create_vehicle(&self, req: &CreateVehicleRequest) -> Result<Vehicle, AppError> {
        self.check("create_vehicle").await?;
        let mut tables = self.tables.lock().await;
        if tables.vehicles.iter().any(|v| v.vehicle_no == req.vehicle_no) {
            return Err(AppError::conflict("Vehicle number already exists"));
        }
        let now = Utc::now();
        let vehicle = Vehicle {
            id: new_id(),
            transport_name: req.transport_name.clone(),
            driver_name: req.driver_name.clone(),
            vehicle_no: req.vehicle_no.clone(),
            driver_mobile: req.driver_mobile.clone(),
            transport_mobile: req.transport_mobile.clone(),
            date_time: req.date_time.unwrap_or(now),
            product_info: req.product_info.clone(),
            quantity: req.quantity,
            advance: req.advance,
            status: req.status,
            created_at: now,
        };
        tables.vehicles.push(vehicle.clone());
        Ok(vehicle)
    }

    async fn update_vehicle(&self, id: &str, req: &UpdateVehicleRequest) -> Result<Vehicle, AppError> {
        self.check("update_vehicle").await?;
        let mut tables = self.tables.lock().await;
        if let Some(number) = &req.vehicle_no {
            if tables.vehicles.iter().any(|v| v.id != id && &v.vehicle_no == number) {
                return Err(AppError::conflict("Vehicle number already exists"));
            }
        }
        let vehicle = find_mut(&mut tables.vehicles, id, |v| v.id.as_str(), "Vehicle")?;
        if let Some(v) = &req.transport_name {
            vehicle.transport_name = v.clone();
        }
        if let Some(v) = &req.driver_name {
            vehicle.driver_name = v.clone();
        }
        if let Some(v) = &req.vehicle_no {
            vehicle.vehicle_no = v.clone();
        }
        if let Some(v) = &req.driver_mobile {
            vehicle.driver_mobile = v.clone();
        }
        if let Some(v) = &req.transport_mobile {
            vehicle.transport_mobile = v.clone();
        }
        if let Some(v) = req.date_time {
            vehicle.date_time = v;
        }
        if let Some(v) = &req.product_info {
            vehicle.product_info = v.clone();
        }
        if let Some(v) = req.quantity {
            vehicle.quantity = v;
        }
        if let Some(v) = req.advance {
            vehicle.advance = v;
        }
        if let Some(v) = req.status {
            vehicle.status = v;
        }
        Ok(vehicle.clone())
    }

    async fn delete_vehicle(&self, id: &str) -> Result<(), AppError> {
        self.check("delete_vehicle").await?;
        let mut tables = self.tables.lock().await;
        if tables.bilties.iter().any(|b| b.vehicle_id == id) {
            return Err(AppError::conflict("Cannot delete vehicle referenced by bilties"));
        }
        remove_by_id(&mut tables.vehicles, id, |v| v.id.as_str(), "Vehicle")
    }

    async fn list_bilties(&self) -> Result<Vec<BiltyHeader>, AppError> {
        self.check("list_bilties").await?;
        Ok(newest_first(&self.tables.lock().await.bilties))
    }

    async fn create_bilty(
        &self,
        bilty: &NewBilty,
        lines: &[NewProductDetail],
    ) -> Result<(BiltyHeader, Vec<ProductDetail>), AppError> {
        self.check("create_bilty").await?;
        let mut tables = self.tables.lock().await;
        if tables.bilties.iter().any(|b| b.bilty_number == bilty.bilty_number) {
            return Err(AppError::conflict("Bilty number already exists"));
        }
        if !tables.vehicles.iter().any(|v| v.id == bilty.vehicle_id) {
            return Err(AppError::validation("Invalid vehicle_id"));
        }
        let header = BiltyHeader {
            id: new_id(),
            bilty_number: bilty.bilty_number.clone(),
            seller_id: bilty.seller_id.clone(),
            vehicle_id: bilty.vehicle_id.clone(),
            delivery_address: bilty.delivery_address.clone(),
            rent: bilty.rent,
            advance: bilty.advance,
            driver_tips: bilty.driver_tips,
            total_crates_bags: bilty.total_crates_bags,
            status: bilty.status,
            created_at: Utc::now(),
        };
        tables.bilties.push(header.clone());
        let inserted = Self::insert_lines(&mut tables, &header.id, lines);
        Ok((header, inserted))
    }

    async fn update_bilty(&self, id: &str, changes: &BiltyChanges) -> Result<BiltyHeader, AppError> {
        self.check("update_bilty").await?;
        let mut tables = self.tables.lock().await;
        if !tables.vehicles.iter().any(|v| v.id == changes.vehicle_id) {
            return Err(AppError::validation("Invalid vehicle_id"));
        }
        let header = find_mut(&mut tables.bilties, id, |b| b.id.as_str(), "Bilty")?;
        header.seller_id = changes.seller_id.clone();
        header.vehicle_id = changes.vehicle_id.clone();
        header.delivery_address = changes.delivery_address.clone();
        header.rent = changes.rent;
        header.advance = changes.advance;
        header.driver_tips = changes.driver_tips;
        header.status = changes.status;
        if let Some(total) = changes.total_crates_bags {
            header.total_crates_bags = total;
        }
        Ok(header.clone())
    }

    async fn set_bilty_status(&self, id: &str, status: BiltyStatus) -> Result<BiltyHeader, AppError> {
        self.check("set_bilty_status").await?;
        let mut tables = self.tables.lock().await;
        let header = find_mut(&mut tables.bilties, id, |b| b.id.as_str(), "Bilty")?;
        header.status = status;
        Ok(header.clone())
    }

    async fn delete_bilty(&self, id: &str) -> Result<(), AppError> {
        self.check("delete_bilty").await?;
        let mut tables = self.tables.lock().await;
        if !tables.bilties.iter().any(|b| b.id == id) {
            return Err(AppError::not_found("Bilty not found"));
        }
        let billing_ids: Vec<String> = tables
            .bilty_billings
            .iter()
            .filter(|b| b.bilty_id == id)
            .map(|b| b.id.clone())
            .collect();
        tables.billing_lines.retain(|l| !billing_ids.contains(&l.billing_id));
        tables.bilty_billings.retain(|b| b.bilty_id != id);
        tables.product_details.retain(|pd| pd.bilty_id != id);
        tables.bilties.retain(|b| b.id != id);
        Ok(())
    }

    async fn list_product_details(&self, bilty_id: &str) -> Result<Vec<ProductDetail>, AppError> {
        self.check("list_product_details").await?;
        let tables = self.tables.lock().await;
        Ok(tables.product_details.iter().filter(|pd| pd.bilty_id == bilty_id).cloned().collect())
    }

    async fn replace_product_details(
        &self,
        bilty_id: &str,
        lines: &[NewProductDetail],
    ) -> Result<Vec<ProductDetail>, AppError> {
        self.check("replace_product_details").await?;
        let mut tables = self.tables.lock().await;
        if !tables.bilties.iter().any(|b| b.id == bilty_id) {
            return Err(AppError::not_found("Bilty not found"));
        }
        let billed = tables.billing_lines.iter().any(|l| {
            tables
                .product_details
                .iter()
                .any(|pd| pd.id == l.product_detail_id && pd.bilty_id == bilty_id)
        });
        if billed {
            return Err(AppError::conflict(BILLED_LINES));
        }
        tables.product_details.retain(|pd| pd.bilty_id != bilty_id);
        Ok(Self::insert_lines(&mut tables, bilty_id, lines))
    }

    async fn list_schedules(&self) -> Result<Vec<Schedule>, AppError> {
        self.check("list_schedules").await?;
        let mut schedules = newest_first(&self.tables.lock().await.schedules);
        schedules.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(schedules)
    }

    async fn create_schedule(&self, req: &CreateScheduleRequest, final_payment: f64) -> Result<Schedule, AppError> {
        self.check("create_schedule").await?;
        let schedule = Schedule {
            id: new_id(),
            shift: req.shift,
            in_time: req.in_time.clone(),
            out_time: req.out_time.clone(),
            driver_id: req.driver_id.clone(),
            operating_days: req.operating_days,
            tax_deduction: req.tax_deduction,
            final_payment,
            date: req.date,
            created_at: Utc::now(),
        };
        self.tables.lock().await.schedules.push(schedule.clone());
        Ok(schedule)
    }

    async fn update_schedule(&self, id: &str, req: &UpdateScheduleRequest) -> Result<Schedule, AppError> {
        self.check("update_schedule").await?;
        let mut tables = self.tables.lock().await;
        let schedule = find_mut(&mut tables.schedules, id, |s| s.id.as_str(), "Schedule")?;
        if let Some(v) = req.shift {
            schedule.shift = v;
        }
        if let Some(v) = &req.in_time {
            schedule.in_time = v.clone();
        }
        if let Some(v) = &req.out_time {
            schedule.out_time = v.clone();
        }
        if let Some(v) = &req.driver_id {
            schedule.driver_id = v.clone();
        }
        if let Some(v) = req.operating_days {
            schedule.operating_days = v;
        }
        if let Some(v) = req.tax_deduction {
            schedule.tax_deduction = v;
        }
        if let Some(v) = req.final_payment {
            schedule.final_payment = v;
        }
        if let Some(v) = req.date {
            schedule.date = v;
        }
        Ok(schedule.clone())
    }

    async fn delete_schedule(&self, id: &str) -> Result<(), AppError> {
        self.check("delete_schedule").await?;
        remove_by_id(&mut self.tables.lock().await.schedules, id, |s| s.id.as_str(), "Schedule")
    }

    async fn list_billing_records(&self) -> Result<Vec<BillingRecord>, AppError> {
        self.check("list_billing_records").await?;
        Ok(newest_first(&self.tables.lock().await.billing_records))
    }

    async fn create_billing_record(
        &self,
        req: &CreateBillingRecordRequest,
        net_amount: f64,
    ) -> Result<BillingRecord, AppError> {
        self.check("create_billing_record").await?;
        let record = BillingRecord {
            id: new_id(),
            vehicle_no: req.vehicle_no.clone(),
            date: req.date,
            amount: req.amount,
            seller_id: req.seller_id.clone(),
            advance: req.advance,
            net_amount,
            status: req.status,
            created_at: Utc::now(),
        };
        self.tables.lock().await.billing_records.push(record.clone());
        Ok(record)
    }

    async fn set_billing_status(&self, id: &str, status: BillingStatus) -> Result<BillingRecord, AppError> {
        self.check("set_billing_status").await?;
        let mut tables = self.tables.lock().await;
        let record = find_mut(&mut tables.billing_records, id, |r| r.id.as_str(), "Billing record")?;
        record.status = status;
        Ok(record.clone())
    }

    async fn delete_billing_record(&self, id: &str) -> Result<(), AppError> {
        self.check("delete_billing_record").await?;
        remove_by_id(&mut self.tables.lock().await.billing_records, id, |r| r.id.as_str(), "Billing record")
    }

    async fn list_bilty_billings(&self, bilty_id: &str) -> Result<Vec<BiltyBilling>, AppError> {
        self.check("list_bilty_billings").await?;
        let tables = self.tables.lock().await;
        Ok(tables
            .bilty_billings
            .iter()
            .rev()
            .filter(|b| b.bilty_id == bilty_id)
            .map(|b| BiltyBilling {
                lines: tables.billing_lines.iter().filter(|l| l.billing_id == b.id).cloned().collect(),
                ..b.clone()
            })
            .collect())
    }

    async fn create_bilty_billing(
        &self,
        billing: &NewBiltyBilling,
        lines: &[NewBillingLine],
    ) -> Result<BiltyBilling, AppError> {
        self.check("create_bilty_billing").await?;
        let mut tables = self.tables.lock().await;
        if !tables.bilties.iter().any(|b| b.id == billing.bilty_id) {
            return Err(AppError::validation("Invalid bilty_id"));
        }
        if let Some(missing) = lines
            .iter()
            .find(|l| !tables.product_details.iter().any(|pd| pd.id == l.product_detail_id))
        {
            return Err(AppError::validation(format!("Invalid product_detail_id {}", missing.product_detail_id)));
        }

        let now = Utc::now();
        let id = new_id();
        let inserted: Vec<BillingLine> = lines
            .iter()
            .map(|l| BillingLine {
                id: new_id(),
                billing_id: id.clone(),
                product_detail_id: l.product_detail_id.clone(),
                sold_price: l.sold_price,
                total_amount: l.total_amount,
                created_at: now,
            })
            .collect();
        let header = BiltyBilling {
            id,
            bilty_id: billing.bilty_id.clone(),
            commission: billing.commission,
            driver_paid: billing.driver_paid,
            net_total: billing.net_total,
            billing_date: billing.billing_date,
            remark: billing.remark.clone(),
            created_at: now,
            lines: Vec::new(),
        };
        tables.bilty_billings.push(header.clone());
        tables.billing_lines.extend(inserted.iter().cloned());
        Ok(BiltyBilling { lines: inserted, ..header })
    }
}
