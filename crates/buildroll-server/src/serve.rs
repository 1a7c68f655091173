use crate::config::BuildrollConfig;
use crate::http::{create_router, AppState};
use anyhow::Context;
use axum::http::Method;
use buildroll_core::{Scheduler, REFRESH_TASK};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

pub async fn run(config: BuildrollConfig) -> anyhow::Result<()> {
    info!("Starting buildroll server v{}", env!("CARGO_PKG_VERSION"));
    info!("HTTP: {}", config.server.http_addr);
    info!("Catalog: {}", config.catalog.base_url);

    // Malformed configuration is the only fatal startup condition.
    let service = Arc::new(config.build_service()?);
    let schedule = config.schedule()?;

    if config.schedule.run_on_startup {
        info!("Warming catalog caches...");
        let summary = service.refresh_all().await;
        if summary.is_success() {
            info!("Catalog caches ready ({})", summary);
        } else {
            warn!(
                "Startup refresh incomplete ({}); empty caches will populate on first request",
                summary
            );
        }
    }

    let scheduler = Scheduler::new();
    scheduler.register(REFRESH_TASK, schedule, service.clone().refresh_task())?;
    scheduler.start_all()?;
    info!("Catalog refresh scheduled {}", schedule);

    let state = AppState {
        service: service.clone(),
        start_time: std::time::Instant::now(),
    };
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST]);
    let app = create_router(state).layer(cors);

    let addr = config.server.http_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP server on {}", addr))?;

    info!("buildroll server ready");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Shutdown signal received, waiting for in-flight refresh...");
    scheduler.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
