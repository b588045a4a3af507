//! Kestrel block store daemon — entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use kestrel_service::{
    init_logging, BlockStoreService, LogFormat, ServiceConfig, ShutdownController,
};
use kestrel_store::{Backend, MemoryBackend};
use kestrel_store_rocksdb::RocksBackend;

#[derive(Parser)]
#[command(
    name = "kestrel-block-store",
    version,
    about = "Block store service for the Kestrel chain"
)]
struct Cli {
    /// AMQP broker URL.
    #[arg(long, env = "KESTREL_AMQP_URL")]
    amqp_url: Option<String>,

    /// Base directory for the durable store.
    #[arg(long, env = "KESTREL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Instance identifier used in consumer tags and logs.
    #[arg(long, env = "KESTREL_INSTANCE_ID")]
    instance_id: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "KESTREL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "KESTREL_LOG_FORMAT")]
    log_format: Option<String>,

    /// Size of the RPC worker pool (defaults to the number of logical CPUs).
    #[arg(long, env = "KESTREL_WORKERS")]
    workers: Option<usize>,

    /// Wipe the whole block store namespace before serving.
    #[arg(long, env = "KESTREL_RESET")]
    reset: bool,

    /// Keep everything in memory; nothing survives a restart.
    #[arg(long)]
    ephemeral: bool,

    /// Path to a TOML configuration file. File settings are the base; CLI
    /// flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Overlay CLI flags on the file (or default) configuration.
    fn into_config(self) -> anyhow::Result<(ServiceConfig, bool)> {
        let base = match &self.config {
            Some(path) => ServiceConfig::from_toml_file(path)
                .map_err(|e| anyhow::anyhow!("could not load {}: {e}", path.display()))?,
            None => ServiceConfig::default(),
        };

        let config = ServiceConfig {
            amqp_url: self.amqp_url.unwrap_or(base.amqp_url),
            data_dir: self.data_dir.unwrap_or(base.data_dir),
            instance_id: self.instance_id.unwrap_or(base.instance_id),
            log_level: self.log_level.unwrap_or(base.log_level),
            log_format: self.log_format.unwrap_or(base.log_format),
            workers: self.workers.unwrap_or(base.workers),
            reset: self.reset || base.reset,
        };
        Ok((config, self.ephemeral))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, ephemeral) = cli.into_config()?;

    init_logging(LogFormat::from_config(&config.log_format), &config.log_level);

    tracing::info!(
        amqp = %config.amqp_url,
        data_dir = %config.data_dir.display(),
        workers = config.worker_count(),
        ephemeral,
        "starting kestrel block store"
    );

    let backend: Arc<dyn Backend> = if ephemeral {
        Arc::new(MemoryBackend::new())
    } else {
        Arc::new(RocksBackend::open(config.data_dir.join("blockstore"))?)
    };

    if config.reset {
        tracing::warn!("reset requested, wiping block store namespace");
        backend.reset()?;
    }

    let shutdown = Arc::new(ShutdownController::new());
    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move { shutdown.wait_for_signal().await });
    }

    let service = BlockStoreService::new(config, backend, Arc::clone(&shutdown));
    service.run().await?;

    tracing::info!("kestrel block store exited cleanly");
    Ok(())
}
