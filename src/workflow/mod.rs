//! Multi-step writes that span several tables and the cache.

pub mod billing;
pub mod bilty;

use crate::error::AppError;

/// Logs a failed remote call and hands the error back unchanged.
pub(crate) fn log_failure(operation: &'static str) -> impl Fn(AppError) -> AppError {
    move |e| {
        if e.is_backend_failure() {
            tracing::error!(operation, error = %e, "Backend call failed");
        } else {
            tracing::warn!(operation, error = %e, "Operation rejected");
        }
        e
    }
}
