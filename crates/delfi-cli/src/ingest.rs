//! `delfi ingest`: scan a corpus, segment every paper on blocking worker
//! threads, and store the complete records.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use delfi_core::{Extracted, PaperMetadata, PartialPaper, PdfBackend};
use delfi_ingest::{IngestOutcome, MetadataIndex, ingest_document, scan_corpus};
use delfi_segment::Segmenter;
use delfi_store::{PaperRow, PaperStore};

use crate::output::IngestReport;

pub struct IngestOptions {
    pub root: PathBuf,
    pub db_path: PathBuf,
    pub num_workers: usize,
    pub batch_size: usize,
    /// Where to write the results of papers without metadata, as JSON.
    pub partial_out: Option<PathBuf>,
}

struct Job {
    path: PathBuf,
    metadata: Option<PaperMetadata>,
}

/// Build the job list: every PDF of every volume, paired with its metadata
/// record when the volume's JSON export has one.
fn collect_jobs(root: &Path) -> anyhow::Result<Vec<Job>> {
    let scan = scan_corpus(root)?;
    let mut jobs = Vec::with_capacity(scan.total_pdfs());

    for volume in &scan.volumes {
        let index = match MetadataIndex::for_volume(volume) {
            Ok(index) => index,
            Err(e) => {
                tracing::warn!(volume = %volume.name, error = %e, "metadata unreadable, using metadata-free path");
                MetadataIndex::default()
            }
        };
        for path in &volume.pdfs {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            jobs.push(Job {
                path: path.clone(),
                metadata: index.get(&filename).cloned(),
            });
        }
    }
    Ok(jobs)
}

pub async fn run(
    options: IngestOptions,
    backend: Arc<dyn PdfBackend>,
    segmenter: Segmenter,
    cancel: CancellationToken,
) -> anyhow::Result<IngestReport> {
    let jobs = collect_jobs(&options.root)?;
    tracing::info!(
        documents = jobs.len(),
        workers = options.num_workers,
        "starting ingest"
    );

    let bar = ProgressBar::new(jobs.len() as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} {msg} [{bar:40.green/dim}] {pos}/{len} (eta {eta})",
        )
        .context("progress bar template")?
        .progress_chars("=> "),
    );
    bar.set_message("Segmenting");
    bar.enable_steady_tick(Duration::from_millis(120));

    let semaphore = Arc::new(Semaphore::new(options.num_workers));
    let segmenter = Arc::new(segmenter);
    let mut set = JoinSet::new();
    let mut report = IngestReport::default();

    for job in jobs {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                report.cancelled = true;
                break;
            }
            permit = semaphore.clone().acquire_owned() => permit?,
        };
        let backend = backend.clone();
        let segmenter = segmenter.clone();
        let bar = bar.clone();
        set.spawn_blocking(move || {
            let _permit = permit;
            let outcome = ingest_document(&job.path, job.metadata, backend.as_ref(), &segmenter);
            bar.inc(1);
            (job.path, outcome)
        });
    }

    let mut rows = Vec::new();
    let mut partial: Vec<PartialPaper> = Vec::new();
    while let Some(joined) = set.join_next().await {
        let (path, outcome) = joined.context("worker panicked")?;
        report.processed += 1;
        match outcome {
            Ok(outcome) => {
                let seg = outcome.segmentation();
                if seg.text == Extracted::Corrupted {
                    report.corrupted += 1;
                }
                if seg.references == Extracted::NotFound {
                    report.no_references += 1;
                }
                match outcome {
                    IngestOutcome::Complete {
                        metadata,
                        segmentation,
                    } => rows.push(PaperRow::new(metadata, segmentation)),
                    IngestOutcome::Partial(paper) => partial.push(paper),
                }
            }
            Err(e) => {
                report.failed += 1;
                tracing::error!(path = %path.display(), error = %e, "document failed");
            }
        }
    }
    bar.finish_and_clear();
    report.partial = partial.len();

    // Worker completion order is arbitrary; store in corpus order
    rows.sort_by(|a, b| {
        (a.metadata.year, &a.metadata.filename).cmp(&(b.metadata.year, &b.metadata.filename))
    });

    let db_path = options.db_path.clone();
    let batch_size = options.batch_size;
    let summary = tokio::task::spawn_blocking(move || {
        let store = PaperStore::open(&db_path)?;
        store.insert_papers(&rows, batch_size)
    })
    .await
    .context("store task panicked")??;
    report.inserted = summary.inserted;
    report.duplicates = summary.duplicates.len();
    for (filename, reason) in &summary.duplicates {
        tracing::warn!(%filename, %reason, "duplicate skipped");
    }

    if let Some(out) = &options.partial_out {
        partial.sort_by(|a, b| a.filename.cmp(&b.filename));
        let json = serde_json::to_string_pretty(&partial)?;
        std::fs::write(out, json).with_context(|| format!("writing {}", out.display()))?;
        tracing::info!(path = %out.display(), papers = partial.len(), "wrote metadata-free results");
    }

    Ok(report)
}
