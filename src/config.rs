use std::net::IpAddr;
use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};

use crate::error::AppError;

const DEV_JWT_SECRET: &str = "bilty-desk-development-secret";

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` runs against the in-memory backend.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Apply pending migrations at startup.
    pub auto_migrate: bool,
    pub host: IpAddr,
    pub port: u16,
    pub jwt_secret: String,
    pub user_directory: Option<PathBuf>,
    /// Offset used to decide which bilties count as created "today".
    pub local_offset: FixedOffset,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = std::env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty());

        let host_str = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let host: IpAddr = host_str.parse().unwrap_or_else(|_| {
            tracing::warn!(host = %host_str, "Invalid HOST, falling back to 127.0.0.1");
            IpAddr::from([127, 0, 0, 1])
        });
        let port = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()).unwrap_or(3000);
        let db_max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(5);
        let auto_migrate = std::env::var("AUTO_MIGRATE")
            .map(|v| !matches!(v.trim().to_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        let jwt_secret = match (std::env::var("JWT_SECRET"), &database_url) {
            (Ok(secret), _) if !secret.is_empty() => secret,
            (_, Some(_)) => return Err(AppError::internal("JWT_SECRET must be set when DATABASE_URL is configured")),
            (_, None) => {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let offset_minutes = std::env::var("DASHBOARD_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(330);
        let local_offset = offset_from_minutes(offset_minutes)?;

        Ok(Config {
            database_url,
            db_max_connections,
            auto_migrate,
            host,
            port,
            jwt_secret,
            user_directory: std::env::var("USER_DIRECTORY").ok().map(PathBuf::from),
            local_offset,
        })
    }

    /// In-memory backend, development secret, IST. Used by tests and demos.
    pub fn in_memory() -> Self {
        Config {
            database_url: None,
            db_max_connections: 1,
            auto_migrate: false,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            user_directory: None,
            local_offset: ist(),
        }
    }
}

/// UTC+05:30.
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(330 * 60).unwrap_or_else(|| Utc.fix())
}

fn offset_from_minutes(minutes: i32) -> Result<FixedOffset, AppError> {
    FixedOffset::east_opt(minutes * 60)
        .ok_or_else(|| AppError::internal(format!("DASHBOARD_UTC_OFFSET_MINUTES out of range: {minutes}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_range_checked() {
        assert_eq!(offset_from_minutes(330).ok().map(|o| o.local_minus_utc()), Some(19_800));
        assert!(offset_from_minutes(24 * 60).is_err());
    }
}
