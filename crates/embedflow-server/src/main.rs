//! EmbedFlow server binary: wires the providers, starts the chunk queue
//! consumer pool and the scheduler timer, and exposes the HTTP surface
//! (status query, terminate, manual tick, callbacks, health).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use embedflow_domain::ports::services::SchedulerInterface;
use embedflow_infrastructure::config::ConfigLoader;
use embedflow_infrastructure::logging::init_tracing;
use embedflow_infrastructure::runtime::{run_consumer_pool, run_scheduler_loop};
use embedflow_infrastructure::AppContext;
use tokio_util::sync::CancellationToken;
use tracing::info;

mod routes;

/// EmbedFlow - document embedding pipeline and scheduled-task core.
#[derive(Parser)]
#[command(name = "embedflow-server", version, about)]
struct Cli {
    /// Path to the configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run consumers, scheduler, and the HTTP surface (default)
    Serve,
    /// Run one scheduler tick and print the report
    Tick,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path);
    }
    let config = loader.load().context("configuration load failed")?;
    init_tracing(&config.logging);

    let context = Arc::new(
        AppContext::build(config)
            .await
            .context("application context build failed")?,
    );

    match cli.command.unwrap_or(Command::Serve) {
        Command::Tick => {
            let report = context.scheduler.tick().await;
            let rendered = serde_json::to_string_pretty(&report)?;
            info!(status = report.status_code, "Tick complete");
            #[allow(clippy::print_stdout)]
            {
                println!("{rendered}");
            }
            Ok(())
        }
        Command::Serve => serve(context).await,
    }
}

async fn serve(context: Arc<AppContext>) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();

    let consumers = run_consumer_pool(
        Arc::clone(&context.chunk_queue),
        Arc::clone(&context.worker),
        context.config.pipeline.consumer_count,
        shutdown.clone(),
    );
    let scheduler = run_scheduler_loop(
        Arc::clone(&context.scheduler) as Arc<dyn SchedulerInterface>,
        context.config.scheduler.tick_interval_secs,
        shutdown.clone(),
    );

    let bind = context.config.server.bind.clone();
    let app = routes::router(Arc::clone(&context));
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(bind = %bind, "HTTP surface listening");

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {},
                () = server_shutdown.cancelled() => {},
            }
        })
        .await
        .context("HTTP server failed")?;

    info!("Shutting down");
    shutdown.cancel();
    for handle in consumers {
        let _ = handle.await;
    }
    let _ = scheduler.await;
    Ok(())
}
