//! `actionstage gateway` — Start the HTTP API server.

use std::sync::Arc;

use actionstage_config::AppConfig;
use actionstage_core::event::EventBus;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    if !config.has_api_key() {
        warn!("No model API key configured; /GetTodos calls will fail until one is set");
    }

    let event_bus = Arc::new(EventBus::default());
    let mut events = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => debug!(?event, "Domain event"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event log fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    println!("actionstage gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Provider:  {} ({})", config.default_provider, config.default_model);

    actionstage_gateway::start(config, event_bus).await?;

    Ok(())
}
