pub mod seller;
pub mod supplier;
pub mod vehicle;
pub mod bilty;
pub mod billing;
pub mod schedule;

pub use seller::Seller;
pub use supplier::Supplier;
pub use vehicle::{Vehicle, VehicleStatus};
pub use bilty::{Bilty, BiltyHeader, BiltyStatus, ProductDetail, ProductSummary};
pub use billing::{BillingLine, BillingRecord, BillingStatus, BiltyBilling};
pub use schedule::{Schedule, Shift};
