use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod ingest;
mod output;
mod settings;

use delfi_core::PdfBackend;
use delfi_pdf_mupdf::MupdfBackend;
use delfi_segment::{DocumentProcessor, MetadataFreeProcessor};
use delfi_store::PaperStore;
use output::ColorMode;
use settings::Settings;

/// DeLFI paper segmentation - isolate main content and references of
/// proceedings PDFs and store them next to their metadata
#[derive(Parser, Debug)]
#[command(name = "delfi", version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of the platform and ./.delfi.toml configs
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Segment a single PDF and print main content and references
    Extract {
        /// Path to the PDF
        pdf: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        /// Use the metadata-free path (adds abstract and folder year)
        #[arg(long)]
        no_metadata: bool,
    },

    /// Scan a corpus root for proceedings folders, PDFs and metadata files
    Scan {
        /// Corpus root (default: $DELFI_CORPUS_ROOT or [corpus] root)
        root: Option<PathBuf>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Segment every paper of a corpus and store the results
    Ingest {
        /// Corpus root (default: $DELFI_CORPUS_ROOT or [corpus] root)
        root: Option<PathBuf>,

        /// SQLite database (default: $DELFI_DB_PATH or [database] path)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Number of concurrent workers
        #[arg(long)]
        workers: Option<usize>,

        /// Rows per committed transaction
        #[arg(long)]
        batch_size: Option<usize>,

        /// Write results of papers without metadata to this JSON file
        #[arg(long)]
        partial_out: Option<PathBuf>,
    },

    /// Show per-year counts and papers flagged for manual review
    Stats {
        /// SQLite database (default: $DELFI_DB_PATH or [database] path)
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Write it to the platform config file
        #[arg(long)]
        save: bool,
    },
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let _guard = match init_tracing(cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to open log file: {e}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(cli) {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

/// Log to stderr, and additionally to `log_file` when given. The returned
/// guard flushes the file writer on drop.
fn init_tracing(log_file: Option<&Path>) -> std::io::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(guard)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let color = ColorMode(!cli.no_color);

    match cli.command {
        Command::Extract {
            pdf,
            json,
            no_metadata,
        } => extract(&settings, &pdf, json, no_metadata, color),
        Command::Scan { root, json } => scan(&settings, root, json, color),
        Command::Ingest {
            root,
            db,
            workers,
            batch_size,
            partial_out,
        } => {
            let root = settings
                .corpus_root(root)
                .context("no corpus root given (argument, DELFI_CORPUS_ROOT or [corpus] root)")?;
            let options = ingest::IngestOptions {
                root,
                db_path: settings.db_path(db),
                num_workers: settings.num_workers(workers),
                batch_size: settings.batch_size(batch_size),
                partial_out,
            };
            let segmenter = settings.segmenter()?;
            let runtime = tokio::runtime::Runtime::new()?;
            let report = runtime.block_on(async move {
                let cancel = CancellationToken::new();
                let cancel_clone = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        cancel_clone.cancel();
                    }
                });
                let backend: Arc<dyn PdfBackend> = Arc::new(MupdfBackend::new());
                ingest::run(options, backend, segmenter, cancel).await
            })?;
            output::print_ingest_report(&mut std::io::stdout(), &report, color)?;
            Ok(())
        }
        Command::Stats { db } => {
            let path = settings.db_path(db);
            if !path.exists() {
                anyhow::bail!(
                    "Database not found at {}. Create it with: delfi ingest <root> --db {}",
                    path.display(),
                    path.display()
                );
            }
            let store = PaperStore::open(&path)?;
            output::print_stats(
                &mut std::io::stdout(),
                store.count()?,
                &store.papers_per_year()?,
                store.sentinel_counts()?,
                color,
            )?;
            Ok(())
        }
        Command::Config { save } => {
            let rendered = toml::to_string_pretty(&settings.file)?;
            println!("{}", rendered);
            if save {
                let path = delfi_core::config_file::save_config(&settings.file)
                    .map_err(anyhow::Error::msg)?;
                tracing::info!(path = %path.display(), "config saved");
            }
            Ok(())
        }
    }
}

fn extract(
    settings: &Settings,
    pdf: &Path,
    json: bool,
    no_metadata: bool,
    color: ColorMode,
) -> anyhow::Result<()> {
    if !pdf.exists() {
        anyhow::bail!("PDF not found: {}", pdf.display());
    }
    let backend = MupdfBackend::new();
    let segmenter = settings.segmenter()?;
    let mut out = std::io::stdout();

    if no_metadata {
        let paper = MetadataFreeProcessor::with_segmenter(&backend, segmenter).process(pdf)?;
        if json {
            writeln!(out, "{}", serde_json::to_string_pretty(&paper)?)?;
        } else {
            output::print_partial(&mut out, &paper, color)?;
        }
        return Ok(());
    }

    let processor = DocumentProcessor::with_segmenter(&backend, segmenter);
    let raw = processor.acquire(pdf)?;
    let result = processor.process_text(&raw);
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
    } else {
        let start_rule = if result.is_corrupted() {
            None
        } else {
            processor.segmenter().find_start(&raw).map(|m| m.rule)
        };
        let name = pdf
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        output::print_segmentation(&mut out, &name, &result, start_rule, color)?;
    }
    Ok(())
}

fn scan(settings: &Settings, root: Option<PathBuf>, json: bool, color: ColorMode) -> anyhow::Result<()> {
    let root = settings
        .corpus_root(root)
        .context("no corpus root given (argument, DELFI_CORPUS_ROOT or [corpus] root)")?;
    let scan = delfi_ingest::scan_corpus(&root)?;
    let mut out = std::io::stdout();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&scan)?)?;
    } else {
        output::print_scan(&mut out, &scan, color)?;
    }
    Ok(())
}
