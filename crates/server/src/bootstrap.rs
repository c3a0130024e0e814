use std::sync::Arc;
use std::time::Duration;

use garden_agent::llm::{provider_from_config, ExternalServiceError};
use garden_agent::runtime::AdvisorRuntime;
use garden_core::advisor::catalog::{Catalog, CatalogError};
use garden_core::config::AppConfig;
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub runtime: Arc<AdvisorRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("catalog could not be loaded: {0}")]
    Catalog(#[from] CatalogError),
    #[error("personalization provider could not be built: {0}")]
    Provider(#[from] ExternalServiceError),
}

/// Builds the runtime from an already loaded config. Logging must be
/// initialized first so the bootstrap events are recorded.
pub fn bootstrap(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let catalog = Catalog::load_or_builtin(config.catalog.path.as_deref())?;
    info!(
        event_name = "system.bootstrap.catalog_loaded",
        correlation_id = "bootstrap",
        items = catalog.len(),
        source = config.catalog.path.as_deref().map_or("builtin".to_string(), |path| path.display().to_string()),
        "item catalog loaded"
    );

    let provider = provider_from_config(&config.llm)?;
    info!(
        event_name = "system.bootstrap.provider_selected",
        correlation_id = "bootstrap",
        provider = provider.name(),
        status = ?provider.status(),
        "personalization provider selected"
    );

    let runtime = AdvisorRuntime::new(
        Arc::new(catalog),
        provider,
        Duration::from_secs(config.llm.timeout_secs),
    );

    Ok(Application { config, runtime: Arc::new(runtime) })
}
