mod core;

use std::path::Path;

use axum::extract::Request;
use axum::ServiceExt;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::config::{Args, ServiceConfig};
use crate::core::http;
use crate::core::registry::{create_registry, CounterRegistry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_command_line_args();
    let config = ServiceConfig::try_from(args)?;

    // dropping the guard flushes and stops the log writer
    let _guard = init_tracing(config.log_dir.as_deref())?;

    let registry = create_registry(config.data_dir.as_deref())?;

    run_http_server(&config, registry).await?;

    Ok(())
}

fn parse_command_line_args() -> Args {
    Args::parse()
}

fn init_tracing(log_dir: Option<&Path>) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    let app_name = concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION")).to_string();
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;

    let (non_blocking, guard) = match log_dir {
        Some(dir) => tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "trace.log")),
        None => tracing_appender::non_blocking(std::io::stdout()),
    };

    let bunyan_formatting_layer = BunyanFormattingLayer::new(app_name, non_blocking);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(bunyan_formatting_layer)
        .try_init()?;

    Ok(guard)
}

async fn run_http_server(config: &ServiceConfig, registry: CounterRegistry) -> Result<(), Box<dyn std::error::Error>> {
    let app = http::router(registry.clone(), &config.base_path, &config.counter_name);

    let listener = TcpListener::bind(config.address).await?;
    info!(
        address = %config.address,
        base_path = %config.base_path,
        counter = %config.counter_name,
        "Server listening"
    );

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(counters = ?registry.names(), "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, draining in-flight requests"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
