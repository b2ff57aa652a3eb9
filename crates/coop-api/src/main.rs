//! # coop-api: Binary Entry Point
//!
//! Parses configuration, connects the optional database, chooses the
//! footstep sink and serves the API.

use anyhow::Context;
use clap::Parser;
use coop_api::config::AppConfig;
use coop_api::footstep::{Footsteps, MemoryFootsteps, PgFootsteps};
use coop_api::state::AppState;
use metrics_exporter_prometheus::PrometheusBuilder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    if config.auth_secret.is_none() {
        tracing::warn!("AUTH_SECRET is not set; bearer token secrets are not checked");
    }

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;

    // Absent DATABASE_URL means in-memory only.
    let db_pool = coop_api::db::init_pool(config.database_url.as_deref())
        .await
        .context("database initialization failed")?;

    let footsteps = match &db_pool {
        Some(pool) => Footsteps::new(PgFootsteps::new(pool.clone())),
        None => Footsteps::new(MemoryFootsteps::new()),
    };

    let port = config.port;
    let seed_demo = config.seed_demo;
    let state = AppState::with_config(config, footsteps, db_pool);

    state
        .hydrate_from_db()
        .await
        .context("database hydration failed")?;

    if seed_demo {
        coop_api::seed::seed_demo(&state)
            .await
            .map_err(|e| anyhow::anyhow!("demo seeding failed: {e}"))?;
    }

    let app = coop_api::app(state).merge(coop_api::middleware::metrics::router(prometheus));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Cooperative API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
