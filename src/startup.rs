use crate::{
    config::Config,
    domain::{Picker, ThreadRngPicker},
    errors::AppError,
    resolver::Resolver,
    sources::build_sources,
    AppState,
};
use std::sync::Arc;
use tracing;

/// Builds the shared upstream HTTP client.
pub fn create_http_client(config: &Config) -> Result<reqwest::Client, AppError> {
    tracing::info!(
        timeout_secs = config.upstream_timeout.as_secs(),
        user_agent = %config.user_agent,
        "Startup: Building upstream HTTP client"
    );
    reqwest::Client::builder()
        .timeout(config.upstream_timeout)
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| AppError::InitError(format!("Failed to build HTTP client: {}", e)))
}

/// Wires the configured source chain into the application state.
pub fn init_state(config: &Config) -> Result<Arc<AppState>, AppError> {
    init_state_with_picker(config, Arc::new(ThreadRngPicker))
}

pub fn init_state_with_picker(
    config: &Config,
    picker: Arc<dyn Picker>,
) -> Result<Arc<AppState>, AppError> {
    if config.sources.is_empty() {
        return Err(AppError::InitError("No meme sources configured".into()));
    }
    let http = create_http_client(config)?;
    let sources = build_sources(&config.sources, http, picker);
    tracing::info!("Startup: {} meme sources ready.", sources.len());
    Ok(Arc::new(AppState {
        resolver: Resolver::new(sources),
    }))
}
