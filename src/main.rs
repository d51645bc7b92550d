use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use bilty_desk::auth::session::UserDirectory;
use bilty_desk::backend::memory::MemoryBackend;
use bilty_desk::backend::postgres::PgBackend;
use bilty_desk::backend::Backend;
use bilty_desk::config::Config;
use bilty_desk::state::AppState;
use bilty_desk::store::DataStore;
use bilty_desk::{build_app, database};

#[tokio::main]
async fn main() {
    // Load environment variables before the filter reads RUST_LOG
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return;
        }
    };

    let backend: Arc<dyn Backend> = match &config.database_url {
        Some(url) => {
            let pool = match database::create_pool(url, config.db_max_connections).await {
                Ok(p) => p,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create database pool");
                    return;
                }
            };
            if config.auto_migrate {
                if let Err(e) = database::run_migrations(&pool).await {
                    tracing::error!(error = %e, "Failed to run migrations");
                    return;
                }
                tracing::info!("Migrations applied");
            }
            Arc::new(PgBackend::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, data lives in memory and is lost on exit");
            Arc::new(MemoryBackend::new())
        }
    };

    let users = match &config.user_directory {
        Some(path) => match UserDirectory::from_file(path) {
            Ok(u) => u,
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "Failed to read user directory");
                return;
            }
        },
        None => UserDirectory::default(),
    };
    tracing::info!(users = users.len(), "User directory ready");

    let store = match DataStore::load(backend.as_ref()).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load data");
            return;
        }
    };

    let host = config.host;
    let base_port = config.port;
    let app = build_app(AppState::new(backend, store, config, users));

    // Try base_port..base_port+20 to avoid crash when address is in use
    let listener = {
        let mut bound = None;
        for offset in 0u16..=20 {
            let port = base_port.saturating_add(offset);
            let addr = SocketAddr::from((host, port));
            match TcpListener::bind(addr).await {
                Ok(l) => { bound = Some((l, addr)); break; }
                Err(e) => {
                    if offset == 0 { tracing::warn!(%addr, error=%e, "Port in use, trying next"); }
                }
            }
        }
        match bound {
            Some((l, addr)) => {
                tracing::info!("Server running on {}{}", addr, bilty_desk::BASE_PATH);
                l
            }
            None => {
                tracing::error!("Failed to bind to any port starting at {} on {}", base_port, host);
                return;
            }
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error=%e, "Server error");
    }
}
