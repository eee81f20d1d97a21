pub mod config;
pub mod processor;
pub mod resolver;
mod routes;

#[cfg(test)]
mod test_helpers;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;

pub use processor::{EventProcessor, ProcessError, ProcessingSummary, ProcessorSettings};
pub use routes::{AppState, InnerAppState};

/// Router serving the webhook endpoints for `processor`.
pub fn app(processor: EventProcessor) -> Router {
    routes::build_router(Arc::new(InnerAppState { processor }))
}

pub async fn serve(listener: TcpListener, processor: EventProcessor) -> Result<()> {
    axum::serve(listener, app(processor)).await?;
    Ok(())
}
