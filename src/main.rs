//! hubbot - multi-tenant chat bot.

use hubbot::config::{Config, Credentials, validate};
use hubbot::extensions;
use hubbot::gateway::WsConnection;
use hubbot::hub::Hub;
use hubbot::storage::{ConfigStorage, JsonFileStorage};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "hubbot.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        eprintln!("Failed to load config {}: {}", config_path, e);
        e
    })?;

    hubbot::telemetry::init_logging(&config.logging);

    if let Err(errors) = validate(&config, extensions::KNOWN) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "{} configuration error(s) in {}",
            errors.len(),
            config_path
        ));
    }

    let credentials = Credentials::load(&config.connection.credentials).map_err(|e| {
        error!(path = %config.connection.credentials, error = %e, "Failed to load credentials");
        e
    })?;

    info!(url = %config.connection.url, "Starting hubbot");

    hubbot::metrics::init();
    if let Some(port) = config.metrics.port.filter(|&p| p != 0) {
        tokio::spawn(hubbot::http::run_http_server(port));
    }

    let storage: Arc<dyn ConfigStorage> = Arc::new(JsonFileStorage::new(&config.storage.path));
    let connection = Arc::new(WsConnection::new(
        config.connection.url.clone(),
        credentials,
        config.connection.request_timeout(),
    ));

    let hub = Hub::new(connection, config.hub.drain_timeout());
    for extension in extensions::build_enabled(&config, storage)? {
        hub.attach(extension);
    }
    if hub.extensions().is_empty() {
        warn!("No extensions enabled");
    }

    let handle = hub.handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received ctrl-c, shutting down");
                handle.stop();
            }
            Err(e) => warn!(error = %e, "Unable to listen for ctrl-c"),
        }
    });

    hub.run().await?;
    info!("Shutdown complete");
    Ok(())
}
