//! unearth - Find and classify recoverable files on a storage volume.
//!
//! Usage:
//!   unearth scan [PATHS]...     Walk storage and list files by category
//!   unearth inspect <FILE>...   Check a file's content against its extension
//!   unearth storage [PATH]      Show capacity of the volume holding PATH
//!   unearth --help              Show help

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, bail, eyre};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use unearth_core::{Category, ScanConfig, ScannedEntry};
use unearth_detect::{Assessment, NoMetadata, assess};
use unearth_session::{
    EVENT_CHANNEL_SIZE, ScanCoordinator, ScanEvent, ScanOutcome, ScanState, ScanSummary,
    primary_storage_path, storage_info,
};

#[derive(Parser)]
#[command(
    name = "unearth",
    version,
    about = "Find and classify recoverable files on a storage volume",
    long_about = "unearth walks a storage volume, classifies every regular file it can \
                  read and reports them grouped by category.\n\n\
                  With no paths it scans the standard primary-storage locations."
)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan storage and list discovered files by category
    Scan {
        /// Roots to scan (defaults to the standard storage locations)
        paths: Vec<PathBuf>,

        /// TOML configuration file (defaults to the user config directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Deepest directory level to read below each root
        #[arg(short = 'd', long, value_parser = clap::value_parser!(u32).range(1..))]
        max_depth: Option<u32>,

        /// Drop files whose content duplicates an earlier file
        #[arg(long)]
        dedupe: bool,

        /// Emit every event as a JSON line on stdout
        #[arg(long)]
        json: bool,
    },

    /// Inspect files by content and score them
    Inspect {
        /// Files to inspect
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Show total, used and free space of a volume
    Storage {
        /// Any path on the volume (defaults to primary storage)
        path: Option<PathBuf>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Scan {
            paths,
            config,
            max_depth,
            dedupe,
            json,
        } => {
            let config = build_config(paths, config.as_deref(), max_depth, dedupe)?;
            run_scan(config, json).await?;
        }
        Command::Inspect { files, json } => {
            run_inspect(&files, json)?;
        }
        Command::Storage { path, json } => {
            run_storage(path, json)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Merge the config file (if any) with command-line overrides.
fn build_config(
    paths: Vec<PathBuf>,
    config_path: Option<&Path>,
    max_depth: Option<u32>,
    dedupe: bool,
) -> Result<ScanConfig> {
    let config_path = config_path
        .map(Path::to_path_buf)
        .or_else(|| default_config_path().filter(|path| path.is_file()));
    let mut config = match config_path {
        Some(path) => ScanConfig::load(&path)
            .wrap_err_with(|| format!("Failed to load config {}", path.display()))?,
        None => ScanConfig::default(),
    };
    if !paths.is_empty() {
        config.roots = paths;
    }
    if let Some(depth) = max_depth {
        config.max_depth = depth;
    }
    config.dedupe_content |= dedupe;
    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("unearth").join("config.toml"))
}

/// Run a scan, rendering its events until it ends. Ctrl-C cancels.
async fn run_scan(config: ScanConfig, json: bool) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
    let coordinator = ScanCoordinator::new(tx);

    if !json {
        eprintln!("Scanning {} root(s)...", config.effective_roots().len());
    }
    let handle = coordinator
        .start_scan(config)
        .context("Failed to start scan")?;

    let canceller = coordinator.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling scan");
            canceller.cancel();
        }
    });

    let printer = tokio::spawn(async move {
        let mut render = Renderer::new(json);
        while let Some(event) = rx.recv().await {
            let finished = matches!(
                event,
                ScanEvent::Lifecycle {
                    state: ScanState::Completed | ScanState::Error | ScanState::Idle
                }
            );
            render.event(&event)?;
            if finished {
                break;
            }
        }
        Ok::<_, color_eyre::Report>(())
    });

    let outcome = handle.wait().await;
    interrupt.abort();
    printer.await.context("Output task failed")??;

    match outcome {
        ScanOutcome::Completed(_) => Ok(()),
        ScanOutcome::Cancelled => {
            eprintln!("Scan cancelled.");
            Ok(())
        }
        ScanOutcome::Failed(message) => Err(eyre!(message).wrap_err("Scan failed")),
    }
}

/// Prints scan events as text or JSON lines.
struct Renderer {
    json: bool,
    progress_shown: bool,
}

impl Renderer {
    fn new(json: bool) -> Self {
        Self {
            json,
            progress_shown: false,
        }
    }

    fn event(&mut self, event: &ScanEvent) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(event)?);
            return Ok(());
        }

        match event {
            ScanEvent::Lifecycle { .. } => {}
            ScanEvent::Progress(progress) => {
                eprint!(
                    "\r{:>5.1}%  {} files  {}    ",
                    progress.progress,
                    progress.files_scanned,
                    format_size(progress.bytes_scanned)
                );
                self.progress_shown = true;
            }
            ScanEvent::FileBatch(batch) => {
                self.end_progress_line();
                for file in &batch.files {
                    println!(
                        "{:<12} {:>10}  {}",
                        batch.category,
                        format_size(file.entry.size),
                        file.entry.path.display()
                    );
                }
            }
            ScanEvent::Completed(summary) => {
                self.end_progress_line();
                print_summary(summary);
            }
            ScanEvent::Error { error_message } => {
                self.end_progress_line();
                eprintln!("Error: {error_message}");
            }
        }
        Ok(())
    }

    fn end_progress_line(&mut self) {
        if self.progress_shown {
            eprintln!();
            self.progress_shown = false;
        }
    }
}

fn print_summary(summary: &ScanSummary) {
    println!();
    println!("{}", "─".repeat(60));
    println!(
        " {} files, {} scanned",
        summary.total_files_found,
        format_size(summary.total_bytes_scanned)
    );
    println!("{}", "─".repeat(60));
    for (category, count) in summary.categories_summary.iter() {
        println!("   {:<14} {:>8}", category.summary_key(), count);
    }
    if summary.duplicates_removed > 0 {
        println!();
        println!(" {} duplicate(s) removed", summary.duplicates_removed);
    }
    if summary.warnings > 0 {
        println!();
        println!(" {} entries skipped", summary.warnings);
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InspectReport {
    path: PathBuf,
    size: u64,
    extension: String,
    category: Category,
    mime_type: String,
    #[serde(flatten)]
    assessment: Assessment,
}

/// Inspect files by content.
fn run_inspect(files: &[PathBuf], json: bool) -> Result<()> {
    let mut reports = Vec::with_capacity(files.len());
    for path in files {
        let metadata =
            std::fs::metadata(path).wrap_err_with(|| format!("Cannot stat {}", path.display()))?;
        if !metadata.is_file() {
            bail!("{} is not a regular file", path.display());
        }
        let modified = metadata.modified().unwrap_or(std::time::UNIX_EPOCH);
        let entry = ScannedEntry::new(path, metadata.len(), modified);
        let assessment = assess(path, &entry.mime_type, &NoMetadata)?;

        reports.push(InspectReport {
            path: path.clone(),
            size: entry.size,
            extension: entry.extension.to_string(),
            category: entry.category,
            mime_type: entry.mime_type.to_string(),
            assessment,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        let detected = report
            .assessment
            .signature
            .map(|s| format!("{} ({})", s.mime_type, s.category))
            .unwrap_or_else(|| "unrecognised".to_string());
        println!("{}", report.path.display());
        println!("   size        {}", format_size(report.size));
        println!("   extension   {} ({})", report.mime_type, report.category);
        println!("   content     {detected}");
        if report.assessment.mime_mismatch {
            println!("               content does not match extension");
        }
        println!("   confidence  {}/100", report.assessment.confidence);
        if let Some(app) = &report.assessment.source_app {
            println!("   source      {app}");
        }
        println!();
    }
    Ok(())
}

/// Show capacity of the volume holding `path`.
fn run_storage(path: Option<PathBuf>, json: bool) -> Result<()> {
    let path = path.unwrap_or_else(primary_storage_path);
    let Some(info) = storage_info(&path) else {
        bail!("No mounted volume contains {}", path.display());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("{}", info.mount_point.display());
        println!("   total  {:>10}", format_size(info.total_bytes));
        println!("   used   {:>10}", format_size(info.used_bytes));
        println!("   free   {:>10}", format_size(info.free_bytes));
    }
    Ok(())
}

fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
