use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use githook_server::config::{verify_default_user, ServerConfig};
use githook_server::EventProcessor;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::parse();
    let settings = config.processor_settings()?;
    let tracker = config.build_tracker()?;
    info!("tracker: {}", config.youtrack_url);
    info!("reference pattern: {}", settings.pattern.as_str());
    verify_default_user(&tracker, &settings.default_user).await?;
    info!("default user: {}", settings.default_user);

    let processor = EventProcessor::new(Arc::new(tracker), Arc::new(settings));

    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("githook-server listening on http://{addr}");

    githook_server::serve(listener, processor).await
}
