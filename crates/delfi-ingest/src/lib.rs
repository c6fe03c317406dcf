use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod corpus;
pub mod metadata;

pub use corpus::{CorpusScan, MetadataSource, ProceedingsVolume, scan_corpus, scan_volume};
pub use metadata::{MetadataIndex, load_metadata};
// Re-export domain types for convenience
pub use delfi_core::{PaperMetadata, PartialPaper, SegmentationResult};

use delfi_core::PdfBackend;
use delfi_segment::{DocumentProcessor, MetadataFreeProcessor, SegmentError, Segmenter};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("unsupported metadata format (expected .json): {0}")]
    UnsupportedMetadata(PathBuf),
    #[error("invalid metadata in {path}: {source}")]
    MetadataParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("segmentation error: {0}")]
    Segment(#[from] SegmentError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(not(feature = "pdf"))]
    #[error("PDF support not compiled in (enable the `pdf` feature of delfi-ingest)")]
    NoPdfSupport,
}

/// What processing one PDF produced.
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    /// A metadata record exists; ready for the `paper` table.
    Complete {
        metadata: PaperMetadata,
        segmentation: SegmentationResult,
    },
    /// No metadata record; only the narrower metadata-free result.
    Partial(PartialPaper),
}

impl IngestOutcome {
    pub fn segmentation(&self) -> &SegmentationResult {
        match self {
            IngestOutcome::Complete { segmentation, .. } => segmentation,
            IngestOutcome::Partial(paper) => &paper.segmentation,
        }
    }
}

/// Process one PDF, choosing the path by whether `metadata` is present.
pub fn ingest_document(
    path: &Path,
    metadata: Option<PaperMetadata>,
    backend: &dyn PdfBackend,
    segmenter: &Segmenter,
) -> Result<IngestOutcome, IngestError> {
    match metadata {
        Some(metadata) => {
            let processor = DocumentProcessor::with_segmenter(backend, segmenter.clone());
            let segmentation = processor.process_with_metadata(path)?;
            Ok(IngestOutcome::Complete {
                metadata,
                segmentation,
            })
        }
        None => {
            let processor = MetadataFreeProcessor::with_segmenter(backend, segmenter.clone());
            Ok(IngestOutcome::Partial(processor.process(path)?))
        }
    }
}

/// The PDF backend compiled into this build.
#[cfg(feature = "pdf")]
pub fn default_backend() -> Result<Box<dyn PdfBackend>, IngestError> {
    Ok(Box::new(delfi_pdf_mupdf::MupdfBackend::default()))
}

#[cfg(not(feature = "pdf"))]
pub fn default_backend() -> Result<Box<dyn PdfBackend>, IngestError> {
    Err(IngestError::NoPdfSupport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use delfi_core::{BackendError, Extracted};

    struct FixedText(&'static str);

    impl PdfBackend for FixedText {
        fn extract_text(&self, _path: &Path) -> Result<String, BackendError> {
            Ok(self.0.to_string())
        }
    }

    const PAPER: &str = "Titel\nAbstract: Kurz.\n1 Einleitung\nInhalt.\nLiteratur\n[Ka93] Kay, A.: Titel.";

    #[test]
    fn test_with_metadata_is_complete() {
        let metadata = PaperMetadata {
            title: "Titel".into(),
            authors: "Kay, A.".into(),
            year: 2009,
            filename: "p1.pdf".into(),
            ..Default::default()
        };
        let outcome = ingest_document(
            Path::new("/lni153/p1.pdf"),
            Some(metadata),
            &FixedText(PAPER),
            &Segmenter::new(),
        )
        .unwrap();
        match outcome {
            IngestOutcome::Complete { segmentation, .. } => {
                assert_eq!(segmentation.text, Extracted::Text("Inhalt.".into()));
            }
            IngestOutcome::Partial(_) => panic!("expected complete outcome"),
        }
    }

    #[test]
    fn test_without_metadata_is_partial() {
        let outcome = ingest_document(
            Path::new("/lni153/p1.pdf"),
            None,
            &FixedText(PAPER),
            &Segmenter::new(),
        )
        .unwrap();
        match &outcome {
            IngestOutcome::Partial(paper) => {
                assert_eq!(paper.year, Some(2009));
                assert_eq!(paper.abstract_text.as_deref(), Some("Kurz."));
            }
            IngestOutcome::Complete { .. } => panic!("expected partial outcome"),
        }
        assert!(outcome.segmentation().references.is_text());
    }
}
