use anyhow::Context;

use orderdesk_api::app::{build_app, services::build_services};
use orderdesk_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env().context("invalid configuration")?;
    orderdesk_observability::init(config.log_format);

    let services = build_services(&config).await?;
    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        store = config.store_backend(),
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
