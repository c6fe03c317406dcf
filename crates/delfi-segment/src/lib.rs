//! Heuristic segmentation of DeLFI paper text.
//!
//! Pipeline:
//! 1. Reject garbled text layers ([`corruption`])
//! 2. Find where the main content starts with a priority-ordered rule cascade
//!    ([`rules`]); the first matching rule wins
//! 3. Find the bibliography by its heading, last candidate first, and accept it
//!    only if citation-shaped entries follow ([`references`])
//! 4. Cut the main content at the validated reference heading
//!    ([`main_content`])
//!
//! Failures of steps 1–3 are values ([`Extracted::Corrupted`],
//! [`Extracted::NotFound`]), never errors. Only text acquisition can fail.

use std::path::Path;

use thiserror::Error;

pub mod config;
pub mod corruption;
pub mod front_matter;
pub mod main_content;
pub mod processor;
pub mod references;
pub mod rules;
pub mod segmenter;
pub mod text_processing;

pub use config::{ListOverride, SegmentConfig, SegmentConfigBuilder};
pub use corruption::{CorruptionReport, is_corrupted};
pub use main_content::{MainContentReport, extract_main_content};
pub use processor::{DocumentProcessor, MetadataFreeProcessor};
pub use references::{CitationEvidence, ReferenceSection, extract_references};
pub use rules::{Boundary, PatternRule, RuleMatch, StartRule};
pub use segmenter::Segmenter;
// Re-export domain types from core (canonical definitions live there)
pub use delfi_core::{
    BackendError, CORRUPTED_SENTINEL, Extracted, NOT_FOUND_SENTINEL, PartialPaper, PdfBackend,
    SegmentationResult,
};

#[derive(Error, Debug)]
pub enum SegmentError {
    #[error("text acquisition failed: {0}")]
    Backend(#[from] BackendError),
}

/// Segment a paper that has a metadata record, using `backend` for text
/// acquisition and the default calibration.
pub fn process_with_metadata(
    path: &Path,
    backend: &dyn PdfBackend,
) -> Result<SegmentationResult, SegmentError> {
    DocumentProcessor::new(backend).process_with_metadata(path)
}

/// Best-effort processing of a paper without a metadata record.
pub fn process_without_metadata(
    path: &Path,
    backend: &dyn PdfBackend,
) -> Result<PartialPaper, SegmentError> {
    MetadataFreeProcessor::new(backend).process(path)
}
