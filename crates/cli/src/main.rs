mod api;
mod cli;
mod console;
mod metrics;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use reelcrawl_core::{
    load_config, load_default_config, parse_identifiers, validate_config, CommandTransferAgent,
    Config, CrawlScheduler, HttpLinkExtractor, RunRequest, SanitizedConfig, SnapshotWriter,
    TransferAgent, WorkItemClassifier,
};

use api::create_router;
use cli::{Cli, Commands, RunArgs};
use console::ConsoleSink;
use state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default config file looked up in the working directory
const DEFAULT_CONFIG_FILE: &str = "reelcrawl.toml";

/// Exit status of a run stopped by an interrupt
const EXIT_INTERRUPTED: u8 = 130;

/// Exit status when no identifier could be parsed
const EXIT_INVALID_INPUT: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, json: bool) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into());

    // Stdout is reserved for the report.
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = load(cli.config)?;

    match cli.command {
        Commands::Config => {
            validate_config(&config).context("Configuration validation failed")?;
            let text = toml::to_string_pretty(&SanitizedConfig::from(&config))
                .context("Failed to render configuration")?;
            println!("{}", text);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check => {
            check(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run(args) => {
            args.apply(&mut config);
            validate_config(&config).context("Configuration validation failed")?;
            crawl(config, args).await
        }
    }
}

/// Config path: flag, then `REELCRAWL_CONFIG`, then `./reelcrawl.toml` if it
/// exists; defaults with environment overrides otherwise.
fn load(flag: Option<PathBuf>) -> Result<Config> {
    let explicit = flag.or_else(|| std::env::var("REELCRAWL_CONFIG").ok().map(PathBuf::from));
    let path = match explicit {
        Some(path) => Some(path),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            fallback.exists().then_some(fallback)
        }
    };

    match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
        }
        None => {
            info!("No configuration file, using defaults");
            load_default_config().context("Failed to load default configuration")
        }
    }
}

async fn check(config: &Config) -> Result<()> {
    validate_config(config).context("Configuration validation failed")?;
    info!("Configuration is valid");

    HttpLinkExtractor::new(&config.extraction).context("Failed to create page client")?;
    info!(template = %config.extraction.page_url_template, "Page client ready");

    let agent = CommandTransferAgent::new(config.transfer.clone());
    agent
        .validate()
        .await
        .with_context(|| format!("Download program {:?} is unavailable", config.transfer.program))?;
    info!(program = %config.transfer.program, "Download program available");

    Ok(())
}

async fn crawl(config: Config, args: RunArgs) -> Result<ExitCode> {
    let parsed = parse_identifiers(&args.identifiers, config.classifier.max_range_len);
    for rejected in &parsed.rejected {
        warn!("Skipping input: {}", rejected);
    }
    if parsed.identifiers.is_empty() {
        error!("No valid identifiers in input");
        return Ok(ExitCode::from(EXIT_INVALID_INPUT));
    }

    let classifier = WorkItemClassifier::from_config(&config.classifier)
        .context("Invalid filler list in configuration")?;
    let extractor =
        HttpLinkExtractor::new(&config.extraction).context("Failed to create page client")?;
    let agent = CommandTransferAgent::new(config.transfer.clone());

    let sanitized = SanitizedConfig::from(&config);
    let cancel = CancellationToken::new();

    let mut scheduler = CrawlScheduler::new(
        config.scheduler.clone(),
        classifier,
        Arc::new(extractor),
        config.extraction.clone(),
        Arc::new(agent),
        config.download.clone(),
    )
    .with_sink(Arc::new(ConsoleSink))
    .with_report_config(config.report.clone())
    .with_cancellation(cancel.clone());
    if config.snapshot.enabled {
        scheduler = scheduler.with_snapshot(
            SnapshotWriter::new(config.snapshot.clone()),
            sanitized.to_json(),
        );
    }
    let scheduler = Arc::new(scheduler);

    info!(
        version = VERSION,
        identifiers = parsed.identifiers.len(),
        rejected = parsed.rejected.len(),
        "reelcrawl starting"
    );

    let signal_task = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            tokio::select! {
                _ = shutdown_signal() => {
                    warn!("Interrupt received, stopping after in-flight items settle");
                    cancel.cancel();
                }
                _ = cancel.cancelled() => {}
            }
        }
    });

    let server_stop = CancellationToken::new();
    let server = if config.status.enabled {
        let state = Arc::new(AppState::new(config.clone(), Arc::clone(&scheduler)));
        Some(spawn_status_server(&config, state, server_stop.clone()).await?)
    } else {
        None
    };

    let result = scheduler.run(RunRequest::from(parsed)).await;

    server_stop.cancel();
    if let Some(handle) = server {
        if let Err(e) = handle.await {
            warn!(error = %e, "Status server task failed");
        }
    }
    signal_task.abort();

    let summary = result.context("Crawl failed")?;
    if let Some(path) = &summary.snapshot_path {
        info!(path = %path.display(), "Snapshot saved");
    }

    if summary.interrupted {
        warn!(
            recorded = summary.stats.recorded,
            not_started = summary.not_started.len(),
            "Run interrupted"
        );
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }
    Ok(ExitCode::SUCCESS)
}

async fn spawn_status_server(
    config: &Config,
    state: Arc<AppState>,
    stop: CancellationToken,
) -> Result<tokio::task::JoinHandle<()>> {
    let addr = SocketAddr::new(config.status.host, config.status.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Status endpoint listening on {}", addr);

    let app = create_router(state);
    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async move { stop.cancelled().await })
            .await
        {
            error!(error = %e, "Status server error");
        }
    }))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
