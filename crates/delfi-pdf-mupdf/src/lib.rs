use std::path::Path;

use mupdf::{Document, TextPageFlags};

use delfi_core::{BackendError, PdfBackend};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency so
/// that the segmentation engine does not transitively depend on it.
///
/// Pages are read block by block and line by line and concatenated in page
/// order, which reproduces the plain text layer the segmentation heuristics
/// were calibrated on (running heads and page numbers included). Header and
/// footer bands can be excluded, but doing so shifts where page furniture
/// ends up and is off by default.
#[derive(Debug, Clone, Default)]
pub struct MupdfBackend {
    /// Fraction of page height from bottom to exclude as footer (0.0–1.0).
    /// `None` keeps footers.
    footer_exclusion_ratio: Option<f32>,
    /// Fraction of page height from top to exclude as header (0.0–1.0).
    /// `None` keeps headers.
    header_exclusion_ratio: Option<f32>,
}

impl MupdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the footer exclusion ratio. Pass `0.0` to disable.
    pub fn with_footer_exclusion(mut self, ratio: f32) -> Self {
        self.footer_exclusion_ratio = if ratio > 0.0 { Some(ratio) } else { None };
        self
    }

    /// Set the header exclusion ratio. Pass `0.0` to disable.
    pub fn with_header_exclusion(mut self, ratio: f32) -> Self {
        self.header_exclusion_ratio = if ratio > 0.0 { Some(ratio) } else { None };
        self
    }

    pub fn footer_exclusion(&self) -> Option<f32> {
        self.footer_exclusion_ratio
    }

    pub fn header_exclusion(&self) -> Option<f32> {
        self.header_exclusion_ratio
    }
}

impl PdfBackend for MupdfBackend {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;

        let mut text = String::new();
        let mut page_count = 0usize;

        for page_result in document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?
        {
            let page = page_result.map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            page_count += 1;

            let page_bounds = page
                .bounds()
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let page_height = page_bounds.y1 - page_bounds.y0;

            let header_threshold = self
                .header_exclusion_ratio
                .map(|r| page_bounds.y0 + page_height * r);
            let footer_threshold = self
                .footer_exclusion_ratio
                .map(|r| page_bounds.y1 - page_height * r);

            for block in text_page.blocks() {
                let block_bounds = block.bounds();

                // Blocks entirely within the header band
                if header_threshold.is_some_and(|t| block_bounds.y1 <= t) {
                    continue;
                }
                // Blocks whose top edge is in the footer band
                if footer_threshold.is_some_and(|t| block_bounds.y0 >= t) {
                    continue;
                }

                for line in block.lines() {
                    text.extend(line.chars().map(|c| c.char().unwrap_or('\u{FFFD}')));
                    text.push('\n');
                }
            }
        }

        // The document is released here, before segmentation starts
        drop(document);
        tracing::debug!(path = %path.display(), pages = page_count, chars = text.len(), "extracted text layer");
        Ok(text)
    }
}
