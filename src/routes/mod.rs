pub mod billing_records;
pub mod bilties;
pub mod dashboard;
pub mod schedules;
pub mod sellers;
pub mod suppliers;
pub mod users;
pub mod vehicles;

use axum::Router;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(users::routes(state.clone()))
        .merge(dashboard::routes(state.clone()))
        .merge(sellers::routes(state.clone()))
        .merge(suppliers::routes(state.clone()))
        .merge(vehicles::routes(state.clone()))
        .merge(bilties::routes(state.clone()))
        .merge(schedules::routes(state.clone()))
        .merge(billing_records::routes(state))
}
