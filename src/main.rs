use stockist_sync::{config::AppConfig, webhook_service::WebhookService};
use tracing::{info, debug, error};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env()
            .add_directive("stockist_sync=debug".parse()?)
            .add_directive("hyper=info".parse()?)
            .add_directive("reqwest=info".parse()?))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting stockist sync service");

    let config = AppConfig::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    debug!("Configuration: repo={}, path={}, branch={}, default_country={}",
        config.github.repository,
        config.github.path,
        config.github.branch,
        config.default_country
    );

    let service = WebhookService::from_config(&config)?;
    info!("Webhook service initialized successfully");

    service.run().await
}
