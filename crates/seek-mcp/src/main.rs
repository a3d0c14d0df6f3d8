//! seek-mcp server binary.
//!
//! Reads `seek.toml` (or the path given with `--config`), opens the SQLite
//! knowledge store, and serves MCP requests on stdin/stdout.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use seek_core::embed::Embedder as _;
use seek_embed::Provider;
use seek_mcp::{McpServer, ServerConfig};
use seek_service::KnowledgeService;
use seek_store_sqlite::SqliteStore;
use tokio::io::{BufReader, stdin, stdout};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Seek knowledge MCP server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "seek.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Stdout is the protocol channel, so logs go to stderr.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_ansi(false)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  let embedder =
    Provider::from_config(&cfg.embedding).context("failed to configure embedding provider")?;

  if let Some(parent) = cfg.database_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&cfg.database_path, cfg.store_config(embedder.dimensions()))
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.database_path))?;

  let service = KnowledgeService::new(Arc::new(store), Arc::new(embedder))
    .context("embedding provider does not match the store")?;

  tracing::info!(database = ?cfg.database_path, "serving on stdio");
  McpServer::new(service)
    .run(BufReader::new(stdin()), stdout())
    .await
    .context("transport error")?;

  Ok(())
}
