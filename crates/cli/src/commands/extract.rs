//! `actionstage extract` — run the extraction loop once, offline from HTTP.

use std::path::Path;
use std::sync::Arc;

use actionstage_config::AppConfig;
use actionstage_core::event::EventBus;
use actionstage_gateway::GatewayState;
use actionstage_gateway::todos::parse_request;
use chrono::Utc;

pub async fn run(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let raw = std::fs::read(file).map_err(|e| format!("Failed to read {}: {e}", file.display()))?;
    let request = parse_request(&raw)?;

    let state = GatewayState::from_config(&config, Arc::new(EventBus::default()))?;
    let outcome = state
        .extractor
        .run_all(&request.transcript, &request.attention_indices, Utc::now())
        .await;

    for failure in &outcome.failures {
        eprintln!("  [index {}] {}", failure.attention_index, failure.error);
    }
    println!("{}", serde_json::to_string_pretty(&outcome.actions)?);

    if outcome.is_total_failure() {
        return Err("Every attention index failed".into());
    }
    Ok(())
}
