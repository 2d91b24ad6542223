//! Service entry-point: loads settings, wires adapters and serves the webhook.

mod server;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use acrostic::inbound::http::health::HealthState;
use acrostic::settings::AppSettings;

use server::{ServerConfig, build_http_state, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().map_err(|e| {
        error!(error = %e, "failed to load configuration");
        std::io::Error::other(format!("failed to load configuration: {e}"))
    })?;
    let service = settings.resolve().map_err(|e| {
        error!(error = %e, "invalid configuration");
        std::io::Error::other(e)
    })?;

    let bind_addr = service.bind_addr;
    let http_state = build_http_state(service).inspect_err(|e| {
        error!(error = %e, "failed to wire adapters");
    })?;

    let health_state = web::Data::new(HealthState::new());
    let config = ServerConfig::new(bind_addr, http_state);
    info!(bind_addr = %config.bind_addr(), "starting webhook server");
    let server = create_server(health_state.clone(), config)?;
    let result = server.await;
    health_state.mark_unhealthy();
    result
}

#[cfg(test)]
mod tests;
