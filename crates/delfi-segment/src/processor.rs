//! Document-level orchestration: text acquisition through a [`PdfBackend`],
//! then segmentation of the acquired text.

use std::path::Path;

use delfi_core::{PartialPaper, PdfBackend, SegmentationResult, volume_year};

use crate::SegmentError;
use crate::segmenter::Segmenter;
use crate::text_processing::expand_ligatures;

/// Processes papers that have a metadata record.
///
/// Only `text` and `references` are produced; title, authors and the other
/// bibliographic fields come from the metadata record.
pub struct DocumentProcessor<'a> {
    backend: &'a dyn PdfBackend,
    segmenter: Segmenter,
}

impl<'a> DocumentProcessor<'a> {
    pub fn new(backend: &'a dyn PdfBackend) -> Self {
        Self::with_segmenter(backend, Segmenter::new())
    }

    pub fn with_segmenter(backend: &'a dyn PdfBackend, segmenter: Segmenter) -> Self {
        Self { backend, segmenter }
    }

    pub fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    /// Raw text of the document with ligatures expanded.
    pub fn acquire(&self, path: &Path) -> Result<String, SegmentError> {
        let raw = self.backend.extract_text(path)?;
        Ok(expand_ligatures(&raw))
    }

    pub fn process_text(&self, raw: &str) -> SegmentationResult {
        self.segmenter.segment(raw)
    }

    /// Acquire the text of `path` and segment it.
    ///
    /// Only acquisition failures are errors; garbled or unstructured text
    /// yields sentinel values.
    pub fn process_with_metadata(&self, path: &Path) -> Result<SegmentationResult, SegmentError> {
        let raw = self.acquire(path)?;
        let result = self.process_text(&raw);
        tracing::debug!(
            path = %path.display(),
            corrupted = result.is_corrupted(),
            references = result.references.is_text(),
            "processed document"
        );
        Ok(result)
    }
}

/// Processes papers without a metadata record.
///
/// This path is incomplete by construction: it returns a [`PartialPaper`]
/// that has no title or authors, a best-effort abstract, and a year only when
/// the parent folder follows the LNI volume naming.
pub struct MetadataFreeProcessor<'a> {
    inner: DocumentProcessor<'a>,
}

impl<'a> MetadataFreeProcessor<'a> {
    pub fn new(backend: &'a dyn PdfBackend) -> Self {
        Self {
            inner: DocumentProcessor::new(backend),
        }
    }

    pub fn with_segmenter(backend: &'a dyn PdfBackend, segmenter: Segmenter) -> Self {
        Self {
            inner: DocumentProcessor::with_segmenter(backend, segmenter),
        }
    }

    pub fn process(&self, path: &Path) -> Result<PartialPaper, SegmentError> {
        let raw = self.inner.acquire(path)?;
        let segmentation = self.inner.process_text(&raw);
        let abstract_text = if segmentation.is_corrupted() {
            None
        } else {
            self.inner.segmenter.abstract_text(&raw)
        };

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let year = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| volume_year(&n.to_string_lossy()));
        if year.is_none() {
            tracing::debug!(path = %path.display(), "no LNI volume folder, year unknown");
        }

        Ok(PartialPaper {
            filename,
            year,
            abstract_text,
            segmentation,
        })
    }
}
