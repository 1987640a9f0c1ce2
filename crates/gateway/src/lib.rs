//! HTTP gateway for actionstage.
//!
//! Exposes the proposal lifecycle (`/actions`), transcript extraction
//! (`/GetTodos`) and a health check. Built on Axum.

pub mod actions;
pub mod error;
pub mod todos;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, header};
use axum::response::Json;
use axum::routing::{get, post, put};
use axum::Router;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use actionstage_adapters::{Capabilities, Dispatcher};
use actionstage_agent::ExtractionLoop;
use actionstage_config::AppConfig;
use actionstage_core::event::EventBus;
use actionstage_core::proposal::ProposalStore;
use actionstage_store::InMemoryProposalStore;
use actionstage_tools::Stager;

pub use error::ApiError;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub store: Arc<dyn ProposalStore>,
    pub dispatcher: Dispatcher,
    pub extractor: Arc<ExtractionLoop>,
    pub event_bus: Arc<EventBus>,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    /// Wire store, adapters, tools and the extraction loop from config.
    pub fn from_config(config: &AppConfig, event_bus: Arc<EventBus>) -> Result<Self, GatewayError> {
        let router = actionstage_providers::build_from_config(config);
        let provider = router
            .default()
            .ok_or_else(|| GatewayError::NoProvider(config.default_provider.clone()))?;

        let capabilities = Capabilities::from_config(&config.adapters);
        for (capability, backend) in capabilities.describe() {
            info!(capability, backend, "Capability ready");
        }

        let store: Arc<dyn ProposalStore> = Arc::new(InMemoryProposalStore::new());
        let stager = Stager::new(store.clone(), capabilities.clone()).with_events(event_bus.clone());
        let tools = Arc::new(actionstage_tools::default_registry(stager, &config.agent.time_zone));
        let extractor = ExtractionLoop::from_config(config, provider, tools, event_bus.clone());

        Ok(Self::new(store, capabilities, extractor, event_bus))
    }

    pub fn new(
        store: Arc<dyn ProposalStore>,
        capabilities: Capabilities,
        extractor: ExtractionLoop,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            store,
            dispatcher: Dispatcher::new(capabilities),
            extractor: Arc::new(extractor),
            event_bus,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("no model provider named '{0}' is configured")]
    NoProvider(String),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/actions", post(actions::propose).get(actions::list))
        .route("/actions/{id}", put(actions::update).delete(actions::dismiss))
        .route("/actions/{id}/execute", post(actions::execute))
        .route("/GetTodos", post(todos::get_todos))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig, event_bus: Arc<EventBus>) -> Result<(), GatewayError> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = Arc::new(GatewayState::from_config(&config, event_bus)?);
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
