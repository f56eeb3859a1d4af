use std::sync::Arc;

use crate::admission::AdmissionService;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub pool: reviewhub_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Bus for events committed by request handlers.
    pub event_bus: Arc<reviewhub_events::EventBus>,
    pub admission: AdmissionService,
}

impl AppState {
    pub fn new(
        pool: reviewhub_db::DbPool,
        config: Arc<ServerConfig>,
        event_bus: Arc<reviewhub_events::EventBus>,
    ) -> Self {
        let admission =
            AdmissionService::new(pool.clone(), Arc::clone(&event_bus), config.admission.clone());
        Self {
            pool,
            config,
            event_bus,
            admission,
        }
    }
}
