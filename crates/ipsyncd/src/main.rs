// # ipsyncd - ipsync daemon
//
// Thin integration layer. All synchronization logic lives in ipsync-core.
//
// The daemon is responsible for:
// 1. Parsing the command line
// 2. Loading and validating the configuration file
// 3. Initializing logging and the runtime
// 4. Building the resolver, DNS client and optional notifier
// 5. Running the sync loop until the process is terminated
//
// ## Configuration
//
// JSON file given by `--config` (or `IPSYNC_CONFIG`, default `ipsync.json`):
//
// ```json
// {
//   "api_token": "cloudflare-token",
//   "zone_id": "023e105f4ecef8ad9ca31a8372d0c353",
//   "record_name": "home.example.com",
//   "poll_interval_seconds": 30,
//   "telegram_bot_token": "123456:ABC",
//   "telegram_chat_id": 42
// }
// ```
//
// ### Environment overrides
// - `IPSYNC_API_TOKEN`: Cloudflare API token
// - `IPSYNC_TELEGRAM_BOT_TOKEN`: Telegram bot token
// - `IPSYNC_LOG_LEVEL`: Log level (also `--log-level`)

use anyhow::{Context, Result};
use clap::Parser;
use ipsync_core::{
    DnsRecordClient, Error, IpResolver, Notifier, SyncConfig, SyncEngine, SyncState,
};
use ipsync_provider_cloudflare::CloudflareClient;
use ipsync_resolver_http::HttpIpResolver;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::oneshot;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IpsyncExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<IpsyncExitCode> for ExitCode {
    fn from(code: IpsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl IpsyncExitCode {
    /// Exit code for an error raised before the sync loop starts
    fn for_startup_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<Error>() {
            Some(e) if !e.is_fatal() => IpsyncExitCode::RuntimeError,
            _ => IpsyncExitCode::ConfigError,
        }
    }
}

/// Keep a Cloudflare A record pointed at this host's public IPv4 address
#[derive(Debug, Parser)]
#[command(name = "ipsyncd", version, about)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, env = "IPSYNC_CONFIG", default_value = "ipsync.json")]
    config: PathBuf,

    /// Override the configured log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "IPSYNC_LOG_LEVEL")]
    log_level: Option<String>,
}

/// Load the configuration file, apply overrides and validate
fn load_config(cli: &Cli) -> Result<SyncConfig> {
    let mut config = SyncConfig::from_file(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    apply_overrides(&mut config, cli, |key| env::var(key).ok());

    config.validate()?;
    Ok(config)
}

/// Apply environment and command-line overrides on top of the file
fn apply_overrides(
    config: &mut SyncConfig,
    cli: &Cli,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(token) = lookup("IPSYNC_API_TOKEN").filter(|t| !t.is_empty()) {
        config.api_token = token;
    }

    if let Some(token) = lookup("IPSYNC_TELEGRAM_BOT_TOKEN").filter(|t| !t.is_empty()) {
        config.telegram_bot_token = Some(token);
    }

    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
}

fn log_level(name: &str) -> Level {
    match name.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return IpsyncExitCode::for_startup_error(&e).into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(&config.log_level))
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return IpsyncExitCode::ConfigError.into();
    }

    info!("Starting ipsyncd for {}", config.record_name);
    info!("Check interval: {} seconds", config.poll_interval_seconds);

    let engine = match build_engine(&config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return IpsyncExitCode::for_startup_error(&e).into();
        }
    };

    // Every step runs in sequence; one thread is all the loop needs
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return IpsyncExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(engine).await {
            error!("Daemon error: {:#}", e);
            IpsyncExitCode::RuntimeError
        } else {
            IpsyncExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Build every component from a validated configuration
fn build_engine(config: &SyncConfig) -> Result<SyncEngine> {
    let resolver: Box<dyn IpResolver> = Box::new(HttpIpResolver::from_config(config)?);
    let client: Box<dyn DnsRecordClient> = Box::new(CloudflareClient::from_config(config)?);

    SyncEngine::new(resolver, client, build_notifier(config)?, config).map_err(Into::into)
}

#[cfg(feature = "telegram")]
fn build_notifier(config: &SyncConfig) -> Result<Option<Box<dyn Notifier>>> {
    use ipsync_notify_telegram::TelegramNotifier;

    if config.telegram_partially_configured() {
        warn!("Telegram needs both telegram_bot_token and a chat id; notifications disabled");
    }

    match config.telegram() {
        Some(telegram) => {
            info!("Telegram notifications enabled for {} chat(s)", telegram.chat_ids.len());
            let notifier = TelegramNotifier::from_config(&telegram, config.request_timeout())?;
            Ok(Some(Box::new(notifier)))
        }
        None => {
            info!("Telegram not configured, notifications disabled");
            Ok(None)
        }
    }
}

#[cfg(not(feature = "telegram"))]
fn build_notifier(config: &SyncConfig) -> Result<Option<Box<dyn Notifier>>> {
    if config.telegram().is_some() {
        warn!("Telegram configured but ipsyncd was built without the telegram feature");
    }
    Ok(None)
}

/// Run the sync loop until a termination signal arrives
async fn run_daemon(engine: SyncEngine) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    // A failed handler setup also stops the loop; the error surfaces below
    let signals = tokio::spawn(async move {
        let signal = wait_for_shutdown().await;
        let _ = shutdown_tx.send(());
        signal
    });

    let state = engine
        .run_with_shutdown(SyncState::default(), shutdown_rx)
        .await;

    let signal = signals.await.context("signal handler task failed")??;
    info!("Received shutdown signal: {}", signal);
    if let Some(ip) = state.last_known_ip {
        info!("Last known public IP: {}", ip);
    }
    info!("Shutting down daemon");

    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate()).context("failed to set up SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("failed to set up SIGINT handler")?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("failed to wait for CTRL-C")?;
    Ok("SIGINT")
}
