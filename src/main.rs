use anyhow::{Context, Result};
use kommo_bridge::config::{AppConfig, LogFormat, LoggingConfig};
use kommo_bridge::routes::configure_routes;
use kommo_bridge::state::AppState;
use tracing_subscriber::EnvFilter;

fn init_logging(config: &LoggingConfig) {
    // RUST_LOG, when set, takes precedence over LOG_LEVEL
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match config.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    init_logging(&config.logging);

    let state = AppState::from_config(&config).context("failed to build HTTP clients")?;
    let routes = configure_routes(state);
    let addr = config.server.socket_addr();

    tracing::info!(
        %addr,
        model = %config.openai.model,
        crm_url = %config.kommo.api_url,
        payload_format = %config.kommo.payload_format,
        dispatch_mode = ?config.bot.dispatch_mode,
        "starting kommo bridge"
    );
    warp::serve(routes).run(addr).await;

    Ok(())
}
