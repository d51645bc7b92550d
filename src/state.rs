use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::session::UserDirectory;
use crate::backend::Backend;
use crate::config::Config;
use crate::store::DataStore;

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub store: Arc<RwLock<DataStore>>,
    pub config: Arc<Config>,
    pub users: Arc<UserDirectory>,
}

impl AppState {
    pub fn new(backend: Arc<dyn Backend>, store: DataStore, config: Config, users: UserDirectory) -> Self {
        Self {
            backend,
            store: Arc::new(RwLock::new(store)),
            config: Arc::new(config),
            users: Arc::new(users),
        }
    }
}
