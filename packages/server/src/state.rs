use std::sync::Arc;

use artifact::{ProjectStore, RepositoryDispatcher};

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ProjectStore>,
    pub dispatcher: RepositoryDispatcher,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn ProjectStore>) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: RepositoryDispatcher::new(store.clone()),
            store,
        }
    }
}
