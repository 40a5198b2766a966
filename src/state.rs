//! Shared application state for all routes.

use crate::config::AppConfig;
use crate::store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        AppState {
            store,
            config: Arc::new(config),
        }
    }
}
