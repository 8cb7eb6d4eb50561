use crate::config::Config;
use crate::events::service::EventsService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub service: EventsService,
    pub config: Config,
}
