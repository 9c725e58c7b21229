//! ocrdeck CLI - submit documents, watch recognition jobs, export overlays

mod export;
mod logging;
mod view;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use ocrdeck_core::application::constants::DEFAULT_LANGUAGE;
use ocrdeck_core::application::{
    shutdown_channel, BatchInput, Dashboard, LocalFile, ResultPresenter, ShutdownToken,
    TrackerConfig, TrackerSession,
};
use ocrdeck_core::port::id_provider::UuidProvider;
use ocrdeck_core::port::time_provider::SystemTimeProvider;
use ocrdeck_infra_http::{HttpBackendConfig, HttpRecognitionBackend};
use ocrdeck_infra_render::{DocumentRenderer, RasterCanvas, RenderConfig};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_URL: &str = "http://127.0.0.1:5000";
const REDRAW_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "ocrdeck")]
#[command(about = "Submit documents for text recognition and track the jobs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Recognition backend URL
    #[arg(long, env = "OCRDECK_URL", default_value = DEFAULT_URL, global = true)]
    url: String,

    /// Status refresh interval in milliseconds
    #[arg(
        long,
        env = "OCRDECK_POLL_MS",
        default_value = "1000",
        value_parser = clap::value_parser!(u64).range(1..),
        global = true
    )]
    poll_ms: u64,

    /// Request timeout in seconds
    #[arg(
        long,
        env = "OCRDECK_TIMEOUT_SECS",
        default_value = "30",
        value_parser = clap::value_parser!(u64).range(1..),
        global = true
    )]
    timeout_secs: u64,

    /// Write overlay PNGs of the finished job into this directory
    #[arg(long, env = "OCRDECK_OUT_DIR", global = true)]
    out_dir: Option<String>,

    /// Log format: pretty or json
    #[arg(long, env = "OCRDECK_LOG_FORMAT", default_value = "pretty", global = true)]
    log_format: String,

    /// Also log to a daily-rolling file in this directory
    #[arg(long, env = "OCRDECK_LOG_DIR", global = true)]
    log_dir: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the languages the backend supports
    Languages,

    /// Recognize one file and wait for the result
    Scan {
        /// Image or PDF file
        file: String,

        /// Recognition language code
        #[arg(short, long, env = "OCRDECK_LANGUAGE", default_value = DEFAULT_LANGUAGE)]
        language: String,
    },

    /// Submit files and URLs as one background job and watch it finish
    Batch {
        /// Image or PDF files
        files: Vec<String>,

        /// Remote document URL (repeatable)
        #[arg(long = "url-input", value_name = "URL")]
        urls: Vec<String>,

        /// Recognition language code
        #[arg(short, long, env = "OCRDECK_LANGUAGE", default_value = DEFAULT_LANGUAGE)]
        language: String,

        /// Return right after submission instead of watching
        #[arg(long)]
        detach: bool,
    },
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

async fn read_local_file(raw: &str) -> Result<LocalFile> {
    let path = expand_path(raw);
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file path: {}", raw))?;
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(LocalFile::new(filename, bytes))
}

fn build_session(cli: &Cli) -> Result<TrackerSession> {
    let backend_config = HttpBackendConfig::new(cli.url.clone())
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    let backend = HttpRecognitionBackend::new(backend_config)
        .map_err(|e| anyhow::anyhow!("HTTP client creation failed: {}", e))?;

    let config = TrackerConfig::default()
        .with_poll_interval(Duration::from_millis(cli.poll_ms))
        .with_asset_base_url(cli.url.clone());

    Ok(TrackerSession::new(
        config,
        Arc::new(backend),
        Arc::new(SystemTimeProvider),
        Arc::new(UuidProvider),
    ))
}

/// Ctrl+C flips the returned token
fn install_ctrl_c() -> ShutdownToken {
    let (sender, token) = shutdown_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            sender.shutdown();
        }
    });
    token
}

/// Redraw the dashboard until every job is terminal or teardown is requested.
/// Returns false on teardown.
async fn watch(session: &TrackerSession, mut shutdown: ShutdownToken) -> bool {
    let interactive = std::io::stdout().is_terminal();
    let mut dashboard = Dashboard::new();
    let mut redraw = tokio::time::interval(REDRAW_INTERVAL);
    let mut last_revisions: Vec<(u64, u64)> = Vec::new();

    loop {
        tokio::select! {
            _ = redraw.tick() => {}
            _ = shutdown.wait() => return false,
        }

        let jobs = session.jobs();
        dashboard.refresh(&jobs, session.live(), session.now_millis());
        let revisions: Vec<(u64, u64)> = dashboard
            .rows()
            .iter()
            .map(|row| (row.row_id, row.revision))
            .collect();

        if revisions != last_revisions {
            if interactive {
                print!("\x1B[2J\x1B[H");
            }
            println!(
                "{}",
                view::dashboard_table(dashboard.rows(), dashboard.placeholder())
            );
            last_revisions = revisions;
        }

        if !session.store().has_active() {
            return true;
        }
    }
}

async fn export_focused(session: &TrackerSession, out_dir: &Path) -> Result<()> {
    let Some(job) = session.focused() else {
        return Ok(());
    };
    let renderer = DocumentRenderer::new(&RenderConfig::default())
        .map_err(|e| anyhow::anyhow!("Renderer creation failed: {}", e))?;
    let mut presenter = ResultPresenter::new(Arc::new(renderer), session.config());
    let mut canvas = RasterCanvas::new();

    let written = export::export_overlays(&mut presenter, &mut canvas, &job, out_dir).await?;
    if written.is_empty() {
        println!("{}", "No overlay could be rendered".yellow());
    }
    for path in written {
        println!("  {} {}", "✓".green(), path.display());
    }
    Ok(())
}

fn print_focused(session: &TrackerSession) {
    if let Some(job) = session.focused() {
        println!();
        println!(
            "{}",
            view::job_details(&job, session.live(), session.now_millis())
        );
    }
}

async fn run(cli: Cli) -> Result<()> {
    let session = build_session(&cli)?;
    let out_dir = cli.out_dir.as_deref().map(expand_path);

    match &cli.command {
        Commands::Languages => {
            let languages = session
                .languages()
                .await
                .context("Failed to fetch languages")?;
            println!("{}", view::languages_table(&languages));
        }

        Commands::Scan { file, language } => {
            let local = read_local_file(file).await?;
            println!("{} {}", "Recognizing".cyan().bold(), local.filename);

            let outcome = session.submit_sync(local, language).await;
            print_focused(&session);
            let job_id = outcome.context("Recognition failed")?;

            if let Some(dir) = &out_dir {
                if session.focused().map(|job| job.id) == Some(job_id) {
                    export_focused(&session, dir).await?;
                }
            }
        }

        Commands::Batch {
            files,
            urls,
            language,
            detach,
        } => {
            let mut inputs = Vec::with_capacity(files.len() + urls.len());
            for file in files {
                inputs.push(BatchInput::File(read_local_file(file).await?));
            }
            inputs.extend(urls.iter().cloned().map(BatchInput::Url));

            let receipt = session
                .submit_batch(inputs, language)
                .await
                .context("Batch submission failed")?;
            println!(
                "{} {} ({})",
                "✓ Job submitted".green().bold(),
                receipt.job_id,
                receipt
                    .message
                    .as_deref()
                    .unwrap_or(receipt.status.as_str())
            );
            if *detach {
                session.shutdown();
                return Ok(());
            }

            let shutdown = install_ctrl_c();
            if !watch(&session, shutdown).await {
                warn!("Watch interrupted before all jobs finished");
                session.shutdown();
                return Ok(());
            }

            print_focused(&session);
            if let Some(dir) = &out_dir {
                export_focused(&session, dir).await?;
            }
        }
    }

    session.shutdown();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = cli.log_dir.as_deref().map(expand_path);
    let _log_guard = logging::init(logging::LogFormat::parse(&cli.log_format), log_dir.as_deref())?;

    info!("ocrdeck v{} starting", ocrdeck_core::VERSION);
    run(cli).await
}
