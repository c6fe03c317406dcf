use delfi_core::{Extracted, SegmentationResult};

use crate::config::SegmentConfig;
use crate::main_content::{MainContentReport, segment_main_content};
use crate::references::{ReferenceSection, locate_reference_section};
use crate::rules::{PatternRule, RuleMatch, default_cascade, run_cascade};
use crate::{corruption, front_matter};

/// A configurable segmentation pipeline.
///
/// Holds a [`SegmentConfig`] and the start-rule cascade and exposes each step
/// as a method. The default constructor uses the built-in calibration; use
/// [`Segmenter::with_config`] to supply custom keywords and thresholds.
#[derive(Debug, Clone)]
pub struct Segmenter {
    config: SegmentConfig,
    rules: Vec<PatternRule>,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter {
    /// Create a segmenter with default configuration.
    pub fn new() -> Self {
        Self::with_config(SegmentConfig::default())
    }

    /// Create a segmenter with a custom configuration.
    pub fn with_config(config: SegmentConfig) -> Self {
        Self {
            config,
            rules: default_cascade(),
        }
    }

    /// Replace the start-rule cascade. Rules are evaluated by priority
    /// regardless of their order in `rules`.
    pub fn with_rules(mut self, mut rules: Vec<PatternRule>) -> Self {
        rules.sort_by_key(|r| r.priority());
        self.rules = rules;
        self
    }

    pub fn config(&self) -> &SegmentConfig {
        &self.config
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Whether the text layer is too garbled to segment (step 1).
    pub fn is_corrupted(&self, text: &str) -> bool {
        corruption::is_corrupted_with_config(text, &self.config)
    }

    /// Winning start rule and its boundary (step 2).
    pub fn find_start(&self, text: &str) -> Option<RuleMatch> {
        run_cascade(&self.rules, text, &self.config)
    }

    /// The validated reference section (step 3).
    pub fn find_reference_section(&self, text: &str) -> Option<ReferenceSection> {
        locate_reference_section(text, &self.config)
    }

    /// Main content with boundary details.
    pub fn main_content_report(&self, text: &str) -> MainContentReport {
        segment_main_content(text, &self.rules, &self.config)
    }

    pub fn main_content(&self, text: &str) -> Extracted {
        self.main_content_report(text).content
    }

    pub fn references(&self, text: &str) -> Extracted {
        crate::references::extract_references_with_config(text, &self.config)
    }

    /// Best-effort abstract; `None` when there is no abstract heading.
    pub fn abstract_text(&self, text: &str) -> Option<String> {
        front_matter::extract_abstract_with_rules(text, &self.rules, &self.config)
    }

    /// Run the full pipeline on already-extracted text.
    ///
    /// Corrupted text short-circuits to [`SegmentationResult::corrupted`]
    /// without any boundary search.
    pub fn segment(&self, text: &str) -> SegmentationResult {
        if self.is_corrupted(text) {
            tracing::warn!(len = text.len(), "corrupted text layer");
            return SegmentationResult::corrupted();
        }
        SegmentationResult {
            text: self.main_content(text),
            references: self.references(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Boundary, StartRule};

    #[test]
    fn test_segment_pairs_both_regions() {
        let text = "1 Introduction\nLorem ipsum...\nReferences\n[BBS01] Author et al.";
        let result = Segmenter::new().segment(text);
        assert_eq!(result.text, Extracted::Text("Lorem ipsum...".into()));
        assert_eq!(
            result.references,
            Extracted::Text("[BBS01] Author et al.".into())
        );
    }

    #[test]
    fn test_segment_corrupted() {
        let garbled = "\u{E001}".repeat(300);
        assert_eq!(
            Segmenter::new().segment(&garbled),
            SegmentationResult::corrupted()
        );
    }

    #[test]
    fn test_custom_rules() {
        fn locate_marker(text: &str, _: &SegmentConfig) -> Option<Boundary> {
            text.find("@@").map(|i| Boundary::heading(i, i + 2))
        }
        let segmenter = Segmenter::new().with_rules(vec![
            PatternRule::new(StartRule::NumberedAnyTitle, locate_marker),
        ]);
        let report = segmenter.main_content_report("Preamble\n@@\nBody");
        assert_eq!(report.content, Extracted::Text("Body".into()));
        assert_eq!(report.start_rule, Some(StartRule::NumberedAnyTitle));
    }

    #[test]
    fn test_find_start_reports_rule() {
        let m = Segmenter::new()
            .find_start("Title\nEinleitung\nText")
            .unwrap();
        assert_eq!(m.rule, StartRule::BareOpener);
    }
}
