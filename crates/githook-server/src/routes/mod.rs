pub mod health;
pub mod hooks;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::processor::EventProcessor;

pub struct InnerAppState {
    pub processor: EventProcessor,
}

pub type AppState = Arc<InnerAppState>;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(hooks::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
