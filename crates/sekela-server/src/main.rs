//! Sekela API server: serves the university catalog over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use sekela_core::config::SekelaConfig;
use sekela_core::seed::Seeder;
use sekela_server::server::AppState;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sekela-server", about = "Sekela university catalog API")]
struct Args {
    /// Directory holding sekela.toml (defaults to current directory)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Address to bind, overriding the configuration
    #[arg(short, long)]
    bind: Option<String>,

    /// Seed the catalog before serving
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let root = match args.root {
        Some(p) => p,
        None => std::env::current_dir().context("failed to get current directory")?,
    };

    let mut config = SekelaConfig::load(&root)
        .with_context(|| format!("failed to load configuration from {}", root.display()))?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    let addr = config.bind_addr()?;
    let seed_on_startup = args.seed || config.catalog.seed_on_startup;

    let state = AppState::from_config(config).context("failed to open catalog store")?;
    tracing::info!(
        store = ?state.store.location(),
        in_memory = state.store.is_memory(),
        dataset = %state.dataset.version,
        "sekela server starting"
    );

    if seed_on_startup {
        let dataset = state.dataset.clone();
        let report = state
            .with_session(move |s| Seeder::new(&dataset).seed(s))
            .await
            .map_err(|e| anyhow::anyhow!("startup seed failed: {e}"))?;
        tracing::info!("{}", report.message());
    }

    sekela_server::serve(state, addr, shutdown_signal()).await?;
    tracing::info!("sekela server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}
