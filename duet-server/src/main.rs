use anyhow::{Context, Result};
use clap::Parser;
use duet_core::{ChunkFormat, StorageLayout};
use duet_server::{
    AppState, ChunkStore, CommandLauncher, Coordinator, MergeScheduler, ServerConfig,
    SessionRegistry, SignalingService, create_router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "duet-server", about = "Signaling and chunk upload server for recorded calls")]
struct Args {
    /// Optional config file (toml, yaml or json).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    tokio::fs::create_dir_all(&cfg.storage_root)
        .await
        .with_context(|| format!("Failed to create storage root {}", cfg.storage_root.display()))?;
    info!("Storing chunks under {}", cfg.storage_root.display());

    let launcher = CommandLauncher {
        program: cfg.merge.program.clone(),
        storage_root: cfg.storage_root.clone(),
        min_chunk_bytes: cfg.merge.min_chunk_bytes,
    };
    let (scheduler, merges) = MergeScheduler::new(Arc::new(launcher), cfg.merge.grace_delay());
    tokio::spawn(scheduler.run());

    let signaling = SignalingService::new();
    let coordinator = Coordinator::new(SessionRegistry::new(), Arc::new(signaling.clone()), merges);
    let chunks = ChunkStore::new(StorageLayout::new(&cfg.storage_root), ChunkFormat::default());

    let state = AppState {
        coordinator,
        signaling,
        chunks: Arc::new(chunks),
    };
    let app = create_router(state, cfg.upload_limit_bytes);

    let listener = tokio::net::TcpListener::bind(cfg.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.bind))?;
    info!("Signaling server listening on http://{}", cfg.bind);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
