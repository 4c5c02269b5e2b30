mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use vitrine_scraper::{ExtractionPipeline, ScraperConfig};

use crate::{
    api::{build_app, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = vitrine_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pipeline = build_pipeline(ScraperConfig::from_app_config(&config))?;
    if !pipeline.has_renderer() {
        tracing::info!("built without the headless feature; /api/scrape-headless will answer 500");
    }

    let auth = AuthState::from_config(&config);
    let app = build_app(
        AppState {
            pipeline: Arc::new(pipeline),
        },
        auth,
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "vitrine-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[cfg(feature = "headless")]
fn build_pipeline(config: ScraperConfig) -> anyhow::Result<ExtractionPipeline> {
    let renderer = Arc::new(vitrine_scraper::ChromiumRenderer::new(&config));
    Ok(ExtractionPipeline::new(config)?.with_renderer(renderer))
}

#[cfg(not(feature = "headless"))]
fn build_pipeline(config: ScraperConfig) -> anyhow::Result<ExtractionPipeline> {
    Ok(ExtractionPipeline::new(config)?)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, draining in-flight requests");
}
