//! Table-scoped create/read/update/delete calls against the remote store.
//!
//! Handlers and workflows only ever talk to [`Backend`]; [`PgBackend`] is the
//! production implementation and [`MemoryBackend`] backs demos and tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::dtos::billing::CreateBillingRecordRequest;
use crate::dtos::schedule::{CreateScheduleRequest, UpdateScheduleRequest};
use crate::dtos::seller::{CreateSellerRequest, UpdateSellerRequest};
use crate::dtos::supplier::{CreateSupplierRequest, UpdateSupplierRequest};
use crate::dtos::vehicle::{CreateVehicleRequest, UpdateVehicleRequest};
use crate::error::AppError;
use crate::models::{
    BillingRecord, BillingStatus, BiltyBilling, BiltyHeader, BiltyStatus, ProductDetail, Schedule, Seller,
    Supplier, Vehicle,
};

pub use memory::MemoryBackend;
pub use postgres::PgBackend;

/// Product lines that a billing line points at cannot be replaced.
pub const BILLED_LINES: &str = "Cannot replace product lines of a billed bilty";

#[derive(Debug, Clone, PartialEq)]
pub struct NewBilty {
    pub bilty_number: String,
    pub seller_id: String,
    pub vehicle_id: String,
    pub delivery_address: String,
    pub rent: f64,
    pub advance: f64,
    pub driver_tips: f64,
    pub total_crates_bags: f64,
    pub status: BiltyStatus,
}

/// Header overwrite from the edit form. The aggregate is only rewritten when
/// the lines were replaced in the same submission.
#[derive(Debug, Clone, PartialEq)]
pub struct BiltyChanges {
    pub seller_id: String,
    pub vehicle_id: String,
    pub delivery_address: String,
    pub rent: f64,
    pub advance: f64,
    pub driver_tips: f64,
    pub status: BiltyStatus,
    pub total_crates_bags: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProductDetail {
    pub product_name: String,
    pub unit_type: String,
    pub quantity: f64,
    pub total_crates_bags: f64,
    pub remarks: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBiltyBilling {
    pub bilty_id: String,
    pub commission: f64,
    pub driver_paid: f64,
    pub net_total: f64,
    pub billing_date: NaiveDate,
    pub remark: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBillingLine {
    pub product_detail_id: String,
    pub sold_price: f64,
    pub total_amount: f64,
}

#[async_trait]
pub trait Backend: Send + Sync {
    // sellers, newest first
    async fn list_sellers(&self) -> Result<Vec<Seller>, AppError>;
    async fn create_seller(&self, req: &CreateSellerRequest) -> Result<Seller, AppError>;
    async fn update_seller(&self, id: &str, req: &UpdateSellerRequest) -> Result<Seller, AppError>;
    async fn delete_seller(&self, id: &str) -> Result<(), AppError>;

    // suppliers, newest first
    async fn list_suppliers(&self) -> Result<Vec<Supplier>, AppError>;
    async fn create_supplier(&self, req: &CreateSupplierRequest) -> Result<Supplier, AppError>;
    async fn update_supplier(&self, id: &str, req: &UpdateSupplierRequest) -> Result<Supplier, AppError>;
    async fn delete_supplier(&self, id: &str) -> Result<(), AppError>;

    // vehicles, in insertion order; vehicle_no is unique
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, AppError>;
    async fn create_vehicle(&self, req: &CreateVehicleRequest) -> Result<Vehicle, AppError>;
    async fn update_vehicle(&self, id: &str, req: &UpdateVehicleRequest) -> Result<Vehicle, AppError>;
    async fn delete_vehicle(&self, id: &str) -> Result<(), AppError>;

    // bilties, newest first; bilty_number is unique
    async fn list_bilties(&self) -> Result<Vec<BiltyHeader>, AppError>;
    /// Header and lines are written together.
    async fn create_bilty(
        &self,
        bilty: &NewBilty,
        lines: &[NewProductDetail],
    ) -> Result<(BiltyHeader, Vec<ProductDetail>), AppError>;
    async fn update_bilty(&self, id: &str, changes: &BiltyChanges) -> Result<BiltyHeader, AppError>;
    async fn set_bilty_status(&self, id: &str, status: BiltyStatus) -> Result<BiltyHeader, AppError>;
    /// Removes the bilty with its product lines, billing headers and billing lines.
    async fn delete_bilty(&self, id: &str) -> Result<(), AppError>;

    // product details, oldest first
    async fn list_product_details(&self, bilty_id: &str) -> Result<Vec<ProductDetail>, AppError>;
    /// Deletes every line of the bilty and inserts `lines` in their place.
    async fn replace_product_details(
        &self,
        bilty_id: &str,
        lines: &[NewProductDetail],
    ) -> Result<Vec<ProductDetail>, AppError>;

    // schedules, latest date first
    async fn list_schedules(&self) -> Result<Vec<Schedule>, AppError>;
    async fn create_schedule(&self, req: &CreateScheduleRequest, final_payment: f64) -> Result<Schedule, AppError>;
    async fn update_schedule(&self, id: &str, req: &UpdateScheduleRequest) -> Result<Schedule, AppError>;
    async fn delete_schedule(&self, id: &str) -> Result<(), AppError>;

    // summary billing records, newest first
    async fn list_billing_records(&self) -> Result<Vec<BillingRecord>, AppError>;
    async fn create_billing_record(
        &self,
        req: &CreateBillingRecordRequest,
        net_amount: f64,
    ) -> Result<BillingRecord, AppError>;
    async fn set_billing_status(&self, id: &str, status: BillingStatus) -> Result<BillingRecord, AppError>;
    async fn delete_billing_record(&self, id: &str) -> Result<(), AppError>;

    // per-bilty billing, newest first, lines oldest first
    async fn list_bilty_billings(&self, bilty_id: &str) -> Result<Vec<BiltyBilling>, AppError>;
    /// Header and lines are written together.
    async fn create_bilty_billing(
        &self,
        billing: &NewBiltyBilling,
        lines: &[NewBillingLine],
    ) -> Result<BiltyBilling, AppError>;
}
