pub mod billing;
pub mod bilty;
pub mod dashboard;
pub mod schedule;
pub mod seller;
pub mod supplier;
pub mod user;
pub mod vehicle;
