use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uncmorfi_api::{
    app, config::Config, services::fetcher::HttpFetcher, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let fetcher = HttpFetcher::new(config.upstream.timeout)?;
    info!(
        "Upstream: menu={} data={} servings={} (timeout {:?}, {} concurrent account fetches)",
        config.upstream.menu_url,
        config.upstream.data_url,
        config.upstream.servings_url,
        config.upstream.timeout,
        config.upstream.user_fetch_concurrency
    );

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config, Arc::new(fetcher));

    info!("UNCmorfi API listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
