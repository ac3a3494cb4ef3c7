mod clock;
mod config;
mod engine;
mod history;
mod limiter;
mod requester;
mod store;
mod transport;
mod types;


use std::sync::Arc;

use anyhow::Result;

use crate::clock::SystemClock;
use crate::config::Config;
use crate::engine::Engine;
use crate::requester::HttpRequester;
use crate::transport::{Transport, http::HttpTransport};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration from environment variables and CLI arguments
    let config = Config::from_env_and_args()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("loadsurge={}", config.log_level).parse()?)
                .add_directive(format!("loadsurge_server={}", config.log_level).parse()?),
        )
        .init();

    let clock: Arc<dyn clock::Clock> = Arc::new(SystemClock);
    let requester = Arc::new(HttpRequester::new(Arc::clone(&clock))?);
    let engine = Engine::new(requester, clock);

    tracing::info!("Starting HTTP transport on {}:{}", config.host, config.port);
    let transport = HttpTransport::new(&config.host, config.port);
    transport.start(engine).await
}
