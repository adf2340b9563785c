use std::sync::Arc;

use boa_client::{ClientError, HttpRequestSource};
use boa_core::config::{AppConfig, ConfigError, LoadOptions};
use boa_core::{DomainError, MediaResolver, RequestSource};
use thiserror::Error;
use tracing::info;

use crate::demo;

pub struct Application {
    pub config: AppConfig,
    pub source: Arc<dyn RequestSource>,
    pub media: MediaResolver,
    pub source_mode: &'static str,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("backend client setup failed: {0}")]
    Client(#[from] ClientError),
    #[error("demo data could not be seeded: {0}")]
    DemoSeed(#[from] DomainError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        demo_mode = config.server.demo_mode,
        "starting application bootstrap"
    );

    let (source, source_mode): (Arc<dyn RequestSource>, &'static str) = if config.server.demo_mode {
        (Arc::new(demo::seeded_source().await?), "demo")
    } else {
        (Arc::new(HttpRequestSource::from_config(&config.backend)?), "http")
    };
    info!(
        event_name = "system.bootstrap.source_ready",
        correlation_id = "bootstrap",
        source_mode,
        requests_url = %config.backend.requests_url(),
        "request source initialized"
    );

    let media = MediaResolver::new(config.backend.media_base_url.clone());

    Ok(Application { config, source, media, source_mode })
}
