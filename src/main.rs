#![forbid(unsafe_code)]

//! `chime`: recurring group alarm bot binary.
//!
//! Bootstraps configuration, loads the persisted alarm store (re-arming one
//! timer per record), and serves the console transport until ctrl-c or
//! SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use chime::attachments::{AttachmentStore, DirAttachmentStore};
use chime::conversation::correlator::Correlator;
use chime::models::GroupId;
use chime::persistence::{AlarmRepo, BlobStore, FileBlobStore};
use chime::router::Router;
use chime::scheduler::AlarmScheduler;
use chime::transport::console::{self, ConsoleTransport};
use chime::transport::Transport;
use chime::{AppError, GlobalConfig, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "chime", about = "Recurring group alarm bot", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("chime bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let config = GlobalConfig::load_from_path(&args.config)?;
    info!("configuration loaded");

    // ── Storage boundaries ──────────────────────────────
    let blob_store: Arc<dyn BlobStore> = Arc::new(FileBlobStore::open(&config.data_dir)?);
    let attachments: Arc<dyn AttachmentStore> =
        Arc::new(DirAttachmentStore::open(config.attachment_dir())?);
    let repo = AlarmRepo::new(blob_store, &config.storage_key);

    // ── Scheduler: load records, re-arm timers ──────────
    let transport: Arc<dyn Transport> = Arc::new(ConsoleTransport::new());
    let ct = CancellationToken::new();
    let scheduler = AlarmScheduler::load(repo, Arc::clone(&transport), attachments, ct.clone())
        .await?;

    // ── Conversation routing ────────────────────────────
    let correlator = Arc::new(Correlator::new());
    let router = Router::new(
        Arc::clone(&scheduler),
        correlator,
        Arc::clone(&transport),
        config.self_id,
    );

    // ── Console transport event loop ────────────────────
    let (inbound_tx, mut inbound_rx) = mpsc::channel(64);
    let stdin_handle = console::serve_stdin(GroupId(config.console_group), inbound_tx, ct.clone());
    info!(group = config.console_group, "console transport ready");

    let dispatch_ct = ct.clone();
    let dispatch_handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                () = dispatch_ct.cancelled() => return,
                maybe = inbound_rx.recv() => match maybe {
                    Some(message) => router.handle_message(&message).await,
                    None => return,
                }
            }
        }
    });

    info!("chime ready");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    let _ = tokio::join!(stdin_handle, dispatch_handle);
    info!("chime shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
