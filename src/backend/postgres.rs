use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

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

#[derive(Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    pub fn new(pool: PgPool) -> Self {
        PgBackend { pool }
    }
}

// Rows carry the table's snake_case columns; conversion into models happens here
// and nowhere else.

#[derive(FromRow)]
struct SellerRow {
    id: String,
    name: String,
    mobile_number: String,
    address: String,
    shop_name: String,
    created_at: DateTime<Utc>,
}

impl From<SellerRow> for Seller {
    fn from(r: SellerRow) -> Self {
        Seller {
            id: r.id,
            name: r.name,
            mobile_number: r.mobile_number,
            address: r.address,
            shop_name: r.shop_name,
            created_at: r.created_at,
        }
    }
}

#[derive(FromRow)]
struct SupplierRow {
    id: String,
    name: String,
    contact_number: String,
    address: String,
    product_category: String,
    plant_name: String,
    created_at: DateTime<Utc>,
}

impl From<SupplierRow> for Supplier {
    fn from(r: SupplierRow) -> Self {
        Supplier {
            id: r.id,
            name: r.name,
            contact_number: r.contact_number,
            address: r.address,
            product_category: r.product_category,
            plant_name: r.plant_name,
            created_at: r.created_at,
        }
    }
}

#[derive(FromRow)]
struct VehicleRow {
    id: String,
    transport_name: String,
    driver_name: String,
    vehicle_no: String,
    driver_mobile: String,
    transport_mobile: Option<String>,
    date_time: DateTime<Utc>,
    product_info: String,
    quantity: f64,
    advance: f64,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<VehicleRow> for Vehicle {
    type Error = AppError;

    fn try_from(r: VehicleRow) -> Result<Self, AppError> {
        Ok(Vehicle {
            status: parse_status(&r.status)?,
            id: r.id,
            transport_name: r.transport_name,
            driver_name: r.driver_name,
            vehicle_no: r.vehicle_no,
            driver_mobile: r.driver_mobile,
            transport_mobile: r.transport_mobile,
            date_time: r.date_time,
            product_info: r.product_info,
            quantity: r.quantity,
            advance: r.advance,
            created_at: r.created_at,
        })
    }
}

#[derive(FromRow)]
struct BiltyRow {
    id: String,
    bilty_number: String,
    seller_id: String,
    vehicle_id: String,
    delivery_address: String,
    rent: f64,
    advance: f64,
    driver_tips: f64,
    total_crates_bags: f64,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BiltyRow> for BiltyHeader {
    type Error = AppError;

    fn try_from(r: BiltyRow) -> Result<Self, AppError> {
        Ok(BiltyHeader {
            status: parse_status(&r.status)?,
            id: r.id,
            bilty_number: r.bilty_number,
            seller_id: r.seller_id,
            vehicle_id: r.vehicle_id,
            delivery_address: r.delivery_address,
            rent: r.rent,
            advance: r.advance,
            driver_tips: r.driver_tips,
            total_crates_bags: r.total_crates_bags,
            created_at: r.created_at,
        })
    }
}

#[derive(FromRow)]
struct ProductDetailRow {
    id: String,
    bilty_id: String,
    product_name: String,
    unit_type: String,
    quantity: f64,
    total_crates_bags: f64,
    remarks: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ProductDetailRow> for ProductDetail {
    fn from(r: ProductDetailRow) -> Self {
        ProductDetail {
            id: r.id,
            bilty_id: r.bilty_id,
            product_name: r.product_name,
            unit_type: r.unit_type,
            quantity: r.quantity,
            total_crates_bags: r.total_crates_bags,
            remarks: r.remarks.unwrap_or_default(),
            created_at: r.created_at,
        }
    }
}

#[derive(FromRow)]
struct ScheduleRow {
    id: String,
    shift: String,
    in_time: String,
    out_time: String,
    driver_id: String,
    operating_days: i32,
    tax_deduction: f64,
    final_payment: f64,
    date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl TryFrom<ScheduleRow> for Schedule {
    type Error = AppError;

    fn try_from(r: ScheduleRow) -> Result<Self, AppError> {
        Ok(Schedule {
            shift: parse_status(&r.shift)?,
            id: r.id,
            in_time: r.in_time,
            out_time: r.out_time,
            driver_id: r.driver_id,
            operating_days: r.operating_days,
            tax_deduction: r.tax_deduction,
            final_payment: r.final_payment,
            date: r.date,
            created_at: r.created_at,
        })
    }
}

#[derive(FromRow)]
struct BillingRecordRow {
    id: String,
    vehicle_no: String,
    date: NaiveDate,
    amount: f64,
    seller_id: String,
    advance: f64,
    net_amount: f64,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BillingRecordRow> for BillingRecord {
    type Error = AppError;

    fn try_from(r: BillingRecordRow) -> Result<Self, AppError> {
        Ok(BillingRecord {
            status: parse_status(&r.status)?,
            id: r.id,
            vehicle_no: r.vehicle_no,
            date: r.date,
            amount: r.amount,
            seller_id: r.seller_id,
            advance: r.advance,
            net_amount: r.net_amount,
            created_at: r.created_at,
        })
    }
}

#[derive(FromRow)]
struct BiltyBillingRow {
    id: String,
    bilty_id: String,
    commission: f64,
    driver_paid: f64,
    net_total: f64,
    billing_date: NaiveDate,
    remark: Option<String>,
    created_at: DateTime<Utc>,
}

impl BiltyBillingRow {
    fn with_lines(self, lines: Vec<BillingLine>) -> BiltyBilling {
        BiltyBilling {
            id: self.id,
            bilty_id: self.bilty_id,
            commission: self.commission,
            driver_paid: self.driver_paid,
            net_total: self.net_total,
            billing_date: self.billing_date,
            remark: self.remark.unwrap_or_default(),
            created_at: self.created_at,
            lines,
        }
    }
}

#[derive(FromRow)]
struct BillingLineRow {
    id: String,
    billing_id: String,
    product_detail_id: String,
    sold_price: f64,
    total_amount: f64,
    created_at: DateTime<Utc>,
}

impl From<BillingLineRow> for BillingLine {
    fn from(r: BillingLineRow) -> Self {
        BillingLine {
            id: r.id,
            billing_id: r.billing_id,
            product_detail_id: r.product_detail_id,
            sold_price: r.sold_price,
            total_amount: r.total_amount,
            created_at: r.created_at,
        }
    }
}

fn parse_status<T: FromStr>(raw: &str) -> Result<T, AppError> {
    raw.parse::<T>()
        .map_err(|_| AppError::internal(format!("Unexpected status value in database: {raw}")))
}

fn collect<R, M>(rows: Vec<R>) -> Result<Vec<M>, AppError>
where
    M: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(M::try_from).collect()
}

/// Unique and foreign-key violations become caller errors; anything else is a
/// database failure.
fn write_error(e: sqlx::Error, unique: &str) -> AppError {
    if let Some(db) = e.as_database_error() {
        if db.code().as_deref() == Some("23505") {
            return AppError::conflict(unique);
        }
        if db.code().as_deref() == Some("23503") {
            return AppError::validation(format!("Invalid reference ({})", db.constraint().unwrap_or("foreign key")));
        }
    }
    AppError::db(e)
}

/// A foreign-key violation on delete means other rows still point here.
fn delete_error(e: sqlx::Error, in_use: &str) -> AppError {
    if let Some(db) = e.as_database_error() {
        if db.code().as_deref() == Some("23503") {
            return AppError::conflict(in_use);
        }
    }
    AppError::db(e)
}

fn require_deleted(rows_affected: u64, what: &str) -> Result<(), AppError> {
    if rows_affected == 0 {
        return Err(AppError::not_found(format!("{what} not found")));
    }
    Ok(())
}

const SELLER_COLUMNS: &str = "id, name, mobile_number, address, shop_name, created_at";
const SUPPLIER_COLUMNS: &str = "id, name, contact_number, address, product_category, plant_name, created_at";
const VEHICLE_COLUMNS: &str = "id, transport_name, driver_name, vehicle_no, driver_mobile, transport_mobile, \
    date_time, product_info, quantity, advance, status, created_at";
const BILTY_COLUMNS: &str = "id, bilty_number, seller_id, vehicle_id, delivery_address, rent, advance, \
    driver_tips, total_crates_bags, status, created_at";
const PRODUCT_DETAIL_COLUMNS: &str =
    "id, bilty_id, product_name, unit_type, quantity, total_crates_bags, remarks, created_at";
const SCHEDULE_COLUMNS: &str = "id, shift, in_time, out_time, driver_id, operating_days, tax_deduction, \
    final_payment, date, created_at";
const BILLING_RECORD_COLUMNS: &str = "id, vehicle_no, date, amount, seller_id, advance, net_amount, status, created_at";
const BILTY_BILLING_COLUMNS: &str = "id, bilty_id, commission, driver_paid, net_total, billing_date, remark, created_at";
const BILLING_LINE_COLUMNS: &str = "id, billing_id, product_detail_id, sold_price, total_amount, created_at";

async fn insert_product_details(
    tx: &mut Transaction<'_, Postgres>,
    bilty_id: &str,
    lines: &[NewProductDetail],
) -> Result<Vec<ProductDetail>, AppError> {
    let mut out = Vec::with_capacity(lines.len());
    for (position, line) in lines.iter().enumerate() {
        let row = sqlx::query_as::<_, ProductDetailRow>(&format!(
            "INSERT INTO product_details (bilty_id, position, product_name, unit_type, quantity, total_crates_bags, remarks)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {PRODUCT_DETAIL_COLUMNS}"
        ))
        .bind(bilty_id)
        .bind(position as i32)
        .bind(&line.product_name)
        .bind(&line.unit_type)
        .bind(line.quantity)
        .bind(line.total_crates_bags)
        .bind(&line.remarks)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| write_error(e, "Product line already exists"))?;
        out.push(row.into());
    }
    Ok(out)
}

#[async_trait]
impl Backend for PgBackend {
    async fn list_sellers(&self) -> Result<Vec<Seller>, AppError> {
        let rows = sqlx::query_as::<_, SellerRow>(&format!(
            "SELECT {SELLER_COLUMNS} FROM sellers ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Seller::from).collect())
    }

    async fn create_seller(&self, req: &CreateSellerRequest) -> Result<Seller, AppError> {
        let row = sqlx::query_as::<_, SellerRow>(&format!(
            "INSERT INTO sellers (name, mobile_number, address, shop_name)
             VALUES ($1, $2, $3, $4)
             RETURNING {SELLER_COLUMNS}"
        ))
        .bind(&req.name)
        .bind(&req.mobile_number)
        .bind(&req.address)
        .bind(&req.shop_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, "Seller already exists"))?;
        Ok(row.into())
    }

    async fn update_seller(&self, id: &str, req: &UpdateSellerRequest) -> Result<Seller, AppError> {
        let row = sqlx::query_as::<_, SellerRow>(&format!(
            "UPDATE sellers SET
                name = COALESCE($2, name),
                mobile_number = COALESCE($3, mobile_number),
                address = COALESCE($4, address),
                shop_name = COALESCE($5, shop_name),
                updated_at = now()
             WHERE id = $1
             RETURNING {SELLER_COLUMNS}"
        ))
        .bind(id)
        .bind(&req.name)
        .bind(&req.mobile_number)
        .bind(&req.address)
        .bind(&req.shop_name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Seller not found"))?;
        Ok(row.into())
    }

    async fn delete_seller(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM sellers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        require_deleted(result.rows_affected(), "Seller")
    }

    async fn list_suppliers(&self) -> Result<Vec<Supplier>, AppError> {
        let rows = sqlx::query_as::<_, SupplierRow>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Supplier::from).collect())
    }

    async fn create_supplier(&self, req: &CreateSupplierRequest) -> Result<Supplier, AppError> {
        let row = sqlx::query_as::<_, SupplierRow>(&format!(
            "INSERT INTO suppliers (name, contact_number, address, product_category, plant_name)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {SUPPLIER_COLUMNS}"
        ))
        .bind(&req.name)
        .bind(&req.contact_number)
        .bind(&req.address)
        .bind(&req.product_category)
        .bind(&req.plant_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, "Supplier already exists"))?;
        Ok(row.into())
    }

    async fn update_supplier(&self, id: &str, req: &UpdateSupplierRequest) -> Result<Supplier, AppError> {
        let row = sqlx::query_as::<_, SupplierRow>(&format!(
            "UPDATE suppliers SET
                name = COALESCE($2, name),
                contact_number = COALESCE($3, contact_number),
                address = COALESCE($4, address),
                product_category = COALESCE($5, product_category),
                plant_name = COALESCE($6, plant_name),
                updated_at = now()
             WHERE id = $1
             RETURNING {SUPPLIER_COLUMNS}"
        ))
        .bind(id)
        .bind(&req.name)
        .bind(&req.contact_number)
        .bind(&req.address)
        .bind(&req.product_category)
        .bind(&req.plant_name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Supplier not found"))?;
        Ok(row.into())
    }

    async fn delete_supplier(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        require_deleted(result.rows_affected(), "Supplier")
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, AppError> {
        let rows = sqlx::query_as::<_, VehicleRow>(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn create_vehicle(&self, req: &CreateVehicleRequest) -> Result<Vehicle, AppError> {
        let row = sqlx::query_as::<_, VehicleRow>(&format!(
            "INSERT INTO vehicles (transport_name, driver_name, vehicle_no, driver_mobile, transport_mobile,
                date_time, product_info, quantity, advance, status)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, now()), $7, $8, $9, $10)
             RETURNING {VEHICLE_COLUMNS}"
        ))
        .bind(&req.transport_name)
        .bind(&req.driver_name)
        .bind(&req.vehicle_no)
        .bind(&req.driver_mobile)
        .bind(&req.transport_mobile)
        .bind(req.date_time)
        .bind(&req.product_info)
        .bind(req.quantity)
        .bind(req.advance)
        .bind(req.status.as_ref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, "Vehicle number already exists"))?;
        row.try_into()
    }

    async fn update_vehicle(&self, id: &str, req: &UpdateVehicleRequest) -> Result<Vehicle, AppError> {
        let row = sqlx::query_as::<_, VehicleRow>(&format!(
            "UPDATE vehicles SET
                transport_name = COALESCE($2, transport_name),
                driver_name = COALESCE($3, driver_name),
                vehicle_no = COALESCE($4, vehicle_no),
                driver_mobile = COALESCE($5, driver_mobile),
                transport_mobile = CASE WHEN $6 THEN $7 ELSE transport_mobile END,
                date_time = COALESCE($8, date_time),
                product_info = COALESCE($9, product_info),
                quantity = COALESCE($10, quantity),
                advance = COALESCE($11, advance),
                status = COALESCE($12, status),
                updated_at = now()
             WHERE id = $1
             RETURNING {VEHICLE_COLUMNS}"
        ))
        .bind(id)
        .bind(&req.transport_name)
        .bind(&req.driver_name)
        .bind(&req.vehicle_no)
        .bind(&req.driver_mobile)
        .bind(req.transport_mobile.is_some())
        .bind(req.transport_mobile.clone().flatten())
        .bind(req.date_time)
        .bind(&req.product_info)
        .bind(req.quantity)
        .bind(req.advance)
        .bind(req.status.map(|s| s.as_ref().to_string()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error(e, "Vehicle number already exists"))?
        .ok_or_else(|| AppError::not_found("Vehicle not found"))?;
        row.try_into()
    }

    async fn delete_vehicle(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| delete_error(e, "Cannot delete vehicle referenced by bilties"))?;
        require_deleted(result.rows_affected(), "Vehicle")
    }

    async fn list_bilties(&self) -> Result<Vec<BiltyHeader>, AppError> {
        let rows = sqlx::query_as::<_, BiltyRow>(&format!(
            "SELECT {BILTY_COLUMNS} FROM bilties ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn create_bilty(
        &self,
        bilty: &NewBilty,
        lines: &[NewProductDetail],
    ) -> Result<(BiltyHeader, Vec<ProductDetail>), AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, BiltyRow>(&format!(
            "INSERT INTO bilties (bilty_number, seller_id, vehicle_id, delivery_address, rent, advance,
                driver_tips, total_crates_bags, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {BILTY_COLUMNS}"
        ))
        .bind(&bilty.bilty_number)
        .bind(&bilty.seller_id)
        .bind(&bilty.vehicle_id)
        .bind(&bilty.delivery_address)
        .bind(bilty.rent)
        .bind(bilty.advance)
        .bind(bilty.driver_tips)
        .bind(bilty.total_crates_bags)
        .bind(bilty.status.as_ref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error(e, "Bilty number already exists"))?;

        let header: BiltyHeader = row.try_into()?;
        let inserted = insert_product_details(&mut tx, &header.id, lines).await?;

        tx.commit().await?;
        Ok((header, inserted))
    }

    async fn update_bilty(&self, id: &str, changes: &BiltyChanges) -> Result<BiltyHeader, AppError> {
        let row = sqlx::query_as::<_, BiltyRow>(&format!(
            "UPDATE bilties SET
                seller_id = $2,
                vehicle_id = $3,
                delivery_address = $4,
                rent = $5,
                advance = $6,
                driver_tips = $7,
                status = $8,
                total_crates_bags = COALESCE($9, total_crates_bags),
                updated_at = now()
             WHERE id = $1
             RETURNING {BILTY_COLUMNS}"
        ))
        .bind(id)
        .bind(&changes.seller_id)
        .bind(&changes.vehicle_id)
        .bind(&changes.delivery_address)
        .bind(changes.rent)
        .bind(changes.advance)
        .bind(changes.driver_tips)
        .bind(changes.status.as_ref())
        .bind(changes.total_crates_bags)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error(e, "Bilty number already exists"))?
        .ok_or_else(|| AppError::not_found("Bilty not found"))?;
        row.try_into()
    }

    async fn set_bilty_status(&self, id: &str, status: BiltyStatus) -> Result<BiltyHeader, AppError> {
        let row = sqlx::query_as::<_, BiltyRow>(&format!(
            "UPDATE bilties SET status = $2, updated_at = now() WHERE id = $1 RETURNING {BILTY_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_ref())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Bilty not found"))?;
        row.try_into()
    }

    async fn delete_bilty(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM billing_lines WHERE billing_id IN (SELECT id FROM bilty_billings WHERE bilty_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM bilty_billings WHERE bilty_id = $1").bind(id).execute(&mut *tx).await?;
        sqlx::query("DELETE FROM product_details WHERE bilty_id = $1").bind(id).execute(&mut *tx).await?;
        let res = sqlx::query("DELETE FROM bilties WHERE id = $1").bind(id).execute(&mut *tx).await?;

        if res.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::not_found("Bilty not found"));
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list_product_details(&self, bilty_id: &str) -> Result<Vec<ProductDetail>, AppError> {
        let rows = sqlx::query_as::<_, ProductDetailRow>(&format!(
            "SELECT {PRODUCT_DETAIL_COLUMNS} FROM product_details WHERE bilty_id = $1 ORDER BY position ASC, created_at ASC"
        ))
        .bind(bilty_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ProductDetail::from).collect())
    }

    async fn replace_product_details(
        &self,
        bilty_id: &str,
        lines: &[NewProductDetail],
    ) -> Result<Vec<ProductDetail>, AppError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM bilties WHERE id = $1)")
            .bind(bilty_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(AppError::not_found("Bilty not found"));
        }

        sqlx::query("DELETE FROM product_details WHERE bilty_id = $1")
            .bind(bilty_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| delete_error(e, BILLED_LINES))?;
        let inserted = insert_product_details(&mut tx, bilty_id, lines).await?;

        tx.commit().await?;
        Ok(inserted)
    }

    async fn list_schedules(&self) -> Result<Vec<Schedule>, AppError> {
        let rows = sqlx::query_as::<_, ScheduleRow>(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM schedules ORDER BY date DESC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn create_schedule(&self, req: &CreateScheduleRequest, final_payment: f64) -> Result<Schedule, AppError> {
        let row = sqlx::query_as::<_, ScheduleRow>(&format!(
            "INSERT INTO schedules (shift, in_time, out_time, driver_id, operating_days, tax_deduction, final_payment, date)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {SCHEDULE_COLUMNS}"
        ))
        .bind(req.shift.as_ref())
        .bind(&req.in_time)
        .bind(&req.out_time)
        .bind(&req.driver_id)
        .bind(req.operating_days)
        .bind(req.tax_deduction)
        .bind(final_payment)
        .bind(req.date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, "Schedule already exists"))?;
        row.try_into()
    }

    async fn update_schedule(&self, id: &str, req: &UpdateScheduleRequest) -> Result<Schedule, AppError> {
        let row = sqlx::query_as::<_, ScheduleRow>(&format!(
            "UPDATE schedules SET
                shift = COALESCE($2, shift),
                in_time = COALESCE($3, in_time),
                out_time = COALESCE($4, out_time),
                driver_id = COALESCE($5, driver_id),
                operating_days = COALESCE($6, operating_days),
                tax_deduction = COALESCE($7, tax_deduction),
                final_payment = COALESCE($8, final_payment),
                date = COALESCE($9, date),
                updated_at = now()
             WHERE id = $1
             RETURNING {SCHEDULE_COLUMNS}"
        ))
        .bind(id)
        .bind(req.shift.map(|s| s.as_ref().to_string()))
        .bind(&req.in_time)
        .bind(&req.out_time)
        .bind(&req.driver_id)
        .bind(req.operating_days)
        .bind(req.tax_deduction)
        .bind(req.final_payment)
        .bind(req.date)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Schedule not found"))?;
        row.try_into()
    }

    async fn delete_schedule(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        require_deleted(result.rows_affected(), "Schedule")
    }

    async fn list_billing_records(&self) -> Result<Vec<BillingRecord>, AppError> {
        let rows = sqlx::query_as::<_, BillingRecordRow>(&format!(
            "SELECT {BILLING_RECORD_COLUMNS} FROM billing_records ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn create_billing_record(
        &self,
        req: &CreateBillingRecordRequest,
        net_amount: f64,
    ) -> Result<BillingRecord, AppError> {
        let row = sqlx::query_as::<_, BillingRecordRow>(&format!(
            "INSERT INTO billing_records (vehicle_no, date, amount, seller_id, advance, net_amount, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {BILLING_RECORD_COLUMNS}"
        ))
        .bind(&req.vehicle_no)
        .bind(req.date)
        .bind(req.amount)
        .bind(&req.seller_id)
        .bind(req.advance)
        .bind(net_amount)
        .bind(req.status.as_ref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, "Billing record already exists"))?;
        row.try_into()
    }

    async fn set_billing_status(&self, id: &str, status: BillingStatus) -> Result<BillingRecord, AppError> {
        let row = sqlx::query_as::<_, BillingRecordRow>(&format!(
            "UPDATE billing_records SET status = $2, updated_at = now() WHERE id = $1 RETURNING {BILLING_RECORD_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_ref())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Billing record not found"))?;
        row.try_into()
    }

    async fn delete_billing_record(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM billing_records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        require_deleted(result.rows_affected(), "Billing record")
    }

    async fn list_bilty_billings(&self, bilty_id: &str) -> Result<Vec<BiltyBilling>, AppError> {
        let headers = sqlx::query_as::<_, BiltyBillingRow>(&format!(
            "SELECT {BILTY_BILLING_COLUMNS} FROM bilty_billings WHERE bilty_id = $1 ORDER BY created_at DESC"
        ))
        .bind(bilty_id)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(headers.len());
        for header in headers {
            let lines = sqlx::query_as::<_, BillingLineRow>(&format!(
                "SELECT {BILLING_LINE_COLUMNS} FROM billing_lines WHERE billing_id = $1 ORDER BY position ASC"
            ))
            .bind(&header.id)
            .fetch_all(&self.pool)
            .await?;
            out.push(header.with_lines(lines.into_iter().map(BillingLine::from).collect()));
        }
        Ok(out)
    }

    async fn create_bilty_billing(
        &self,
        billing: &NewBiltyBilling,
        lines: &[NewBillingLine],
    ) -> Result<BiltyBilling, AppError> {
        let mut tx = self.pool.begin().await?;

        let header = sqlx::query_as::<_, BiltyBillingRow>(&format!(
            "INSERT INTO bilty_billings (bilty_id, commission, driver_paid, net_total, billing_date, remark)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {BILTY_BILLING_COLUMNS}"
        ))
        .bind(&billing.bilty_id)
        .bind(billing.commission)
        .bind(billing.driver_paid)
        .bind(billing.net_total)
        .bind(billing.billing_date)
        .bind(&billing.remark)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error(e, "Billing record already exists"))?;

        let mut inserted = Vec::with_capacity(lines.len());
        for (position, line) in lines.iter().enumerate() {
            let row = sqlx::query_as::<_, BillingLineRow>(&format!(
                "INSERT INTO billing_lines (billing_id, position, product_detail_id, sold_price, total_amount)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING {BILLING_LINE_COLUMNS}"
            ))
            .bind(&header.id)
            .bind(position as i32)
            .bind(&line.product_detail_id)
            .bind(line.sold_price)
            .bind(line.total_amount)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| write_error(e, "Billing line already exists"))?;
            inserted.push(BillingLine::from(row));
        }

        tx.commit().await?;
        Ok(header.with_lines(inserted))
    }
}
