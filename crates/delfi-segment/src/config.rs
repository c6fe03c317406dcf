use once_cell::sync::Lazy;
use regex::Regex;

use delfi_core::config_file::SegmentationConfig;

/// Section openers accepted after the ordinal `1` (regex fragments).
pub const DEFAULT_OPENERS: &[&str] = &[
    "Introduction",
    "Einleitung",
    "Einführung",
    "Background",
    "Motivation",
    "Hintergrund",
];

/// Openers accepted as an unnumbered heading near the top of the paper.
pub const DEFAULT_BARE_OPENERS: &[&str] = &["Introduction", "Einleitung", "Einführung"];

pub const DEFAULT_ABSTRACT_LABELS: &[&str] = &[
    "Abstract",
    "Zusammenfassung",
    "Kurzfassung",
    "Summary",
    "Résumé",
];

pub const DEFAULT_KEYWORD_LABELS: &[&str] = &[
    r"Keywords",
    r"Key\s+words",
    r"Schlüsselwörter",
    r"Schlagwörter",
    r"Keyphrases",
    r"Key\s+phrases",
    r"Index\s+Terms",
    r"Suchbegriffe",
    r"Stichwörter",
    r"Indexbegriffe",
];

pub const DEFAULT_REFERENCE_HEADINGS: &[&str] = &[
    r"References",
    r"Literaturverzeichnis",
    r"Literatur",
    r"Bibliography",
    r"Bibliografie",
    r"Referenzen",
    r"Quellenverzeichnis",
    r"Quellen",
    r"Reference\s+List",
];

/// Headings of sections that may follow the bibliography.
pub const DEFAULT_TRAILING_SECTIONS: &[&str] = &["Appendix", "Anhang"];

/// Controls how a list of patterns/values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }

    fn is_default(&self) -> bool {
        matches!(self, ListOverride::Default)
    }

    fn push(&mut self, value: T) {
        match self {
            ListOverride::Extend(v) | ListOverride::Replace(v) => v.push(value),
            ListOverride::Default => *self = ListOverride::Extend(vec![value]),
        }
    }
}

/// Compiled keyword-dependent regexes.
///
/// Keyword lists are regex fragments joined into alternations, so a custom
/// entry like `Key\s+words` keeps its whitespace tolerance.
#[derive(Debug, Clone)]
pub(crate) struct Patterns {
    /// `1\nKW`, `1 KW` / `1. KW`, `1: KW`, tried in that order.
    pub(crate) numbered_opener: Vec<Regex>,
    /// Standalone line, `KW: subtitle`, `KW – subtitle`.
    pub(crate) bare_opener: Vec<Regex>,
    /// `Abstract:` anywhere, or a bare `Abstract` line; see
    /// `rules::find_abstract_label` for where the bare form is accepted.
    pub(crate) abstract_label: Regex,
    /// A complete `Keywords: ...` line.
    pub(crate) keywords_line: Regex,
    /// A keywords label anchored at the start of the haystack.
    pub(crate) keywords_label_start: Regex,
    pub(crate) reference_heading: Regex,
    pub(crate) trailing_section: Regex,
}

impl Patterns {
    fn compile(
        openers: &[String],
        bare_openers: &[String],
        abstract_labels: &[String],
        keyword_labels: &[String],
        reference_headings: &[String],
        trailing_sections: &[String],
    ) -> Result<Self, regex::Error> {
        let o = openers.join("|");
        let b = bare_openers.join("|");
        let a = abstract_labels.join("|");
        let k = keyword_labels.join("|");
        let r = reference_headings.join("|");
        let t = trailing_sections.join("|");

        Ok(Self {
            numbered_opener: vec![
                Regex::new(&format!(r"(?mi)^\s*1\s*\n\s*(?:{o})"))?,
                Regex::new(&format!(r"(?mi)^\s*1\.?\s+(?:{o})"))?,
                Regex::new(&format!(r"(?mi)^\s*1:\s*(?:{o})"))?,
            ],
            bare_opener: vec![
                Regex::new(&format!(r"(?mi)^\s*(?:{b})\s*$"))?,
                Regex::new(&format!(r"(?mi)^\s*(?:{b}):\s*.+$"))?,
                // Dash-separated subtitle, length-capped so prose lines do not match
                Regex::new(&format!(r"(?mi)^\s*(?:{b})[ \t–—-]+.{{1,50}}$"))?,
            ],
            abstract_label: Regex::new(&format!(
                r"(?mi)^[ \t]*(?:{a})(?:[ \t]*:|[ \t]*$)[ \t]*"
            ))?,
            keywords_line: Regex::new(&format!(r"(?mi)^[ \t]*(?:{k})[ \t]*:\s*[^\n]+$"))?,
            keywords_label_start: Regex::new(&format!(r"(?i)^(?:{k})"))?,
            reference_heading: Regex::new(&format!(
                r"(?mi)^\s*(?:\d+\s*\n\s*|\d+\.?\s+)?(?:{r})\d*\s*$"
            ))?,
            // `Anhang`, `Appendix B`, `Anhang 1 Fragebogen`, `Appendix: Items`;
            // a wrapped entry such as `Anhang zur Studie, 2009.` is not a heading
            trailing_section: Regex::new(&format!(
                r"(?m)^[ \t]*(?i:{t})(?:[ \t]+[A-Z0-9]{{1,3}}[.:]?(?:[ \t]+[^\n]{{0,60}})?|[ \t]*:[^\n]{{0,60}})?[ \t]*$"
            ))?,
        })
    }
}

fn owned(defaults: &[&str]) -> Vec<String> {
    defaults.iter().map(|s| s.to_string()).collect()
}

static DEFAULT_PATTERNS: Lazy<Patterns> = Lazy::new(|| {
    Patterns::compile(
        &owned(DEFAULT_OPENERS),
        &owned(DEFAULT_BARE_OPENERS),
        &owned(DEFAULT_ABSTRACT_LABELS),
        &owned(DEFAULT_KEYWORD_LABELS),
        &owned(DEFAULT_REFERENCE_HEADINGS),
        &owned(DEFAULT_TRAILING_SECTIONS),
    )
    .unwrap()
});

/// Calibration constants and keyword patterns of the segmentation engine.
///
/// The defaults were tuned against the DeLFI corpus (2003–2025). A corpus with
/// different conventions will likely need other windows and thresholds; use
/// [`SegmentConfigBuilder`] to construct a custom config.
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    // ── corruption.rs ──
    /// Number of leading characters inspected by the corruption detector.
    pub(crate) corruption_sample_chars: usize,
    /// Minimum share of alphabetic characters in the sample.
    pub(crate) min_alpha_ratio: f64,
    /// Maximum share of control, replacement and private-use characters.
    pub(crate) max_nonprintable_ratio: f64,
    /// Length of a run of non-printable characters that marks the text corrupted.
    pub(crate) max_noise_run: usize,

    // ── rules.rs ──
    /// Search window (chars) for an unnumbered opener heading.
    pub(crate) keyword_window_chars: usize,
    /// Minimum abstract length (chars) before a sentence break counts as its end.
    pub(crate) min_abstract_chars: usize,

    // ── references.rs ──
    /// Fraction of the document before which no reference heading is accepted.
    pub(crate) reference_floor: f64,
    /// Texts shorter than this (chars) ignore the floor.
    pub(crate) reference_floor_min_len: usize,
    /// Leading characters of a reference block scanned for citation evidence.
    pub(crate) evidence_window_chars: usize,

    // ── main_content.rs ──
    /// Keep the matched section heading at the start of the main content.
    pub(crate) keep_heading: bool,

    /// `None` means the built-in keyword lists.
    pub(crate) patterns: Option<Patterns>,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            corruption_sample_chars: 2000,
            min_alpha_ratio: 0.30,
            max_nonprintable_ratio: 0.20,
            max_noise_run: 16,
            keyword_window_chars: 2000,
            min_abstract_chars: 400,
            reference_floor: 0.5,
            reference_floor_min_len: 2000,
            evidence_window_chars: 1500,
            keep_heading: false,
            patterns: None,
        }
    }
}

impl SegmentConfig {
    pub(crate) fn patterns(&self) -> &Patterns {
        self.patterns.as_ref().unwrap_or(&DEFAULT_PATTERNS)
    }

    pub fn keyword_window_chars(&self) -> usize {
        self.keyword_window_chars
    }

    pub fn keep_heading(&self) -> bool {
        self.keep_heading
    }
}

/// Builder for [`SegmentConfig`].
///
/// Keyword lists are compiled into regexes in [`build()`](Self::build), which
/// fails fast with `regex::Error` if any fragment is invalid.
#[derive(Debug, Clone, Default)]
pub struct SegmentConfigBuilder {
    corruption_sample_chars: Option<usize>,
    min_alpha_ratio: Option<f64>,
    max_nonprintable_ratio: Option<f64>,
    max_noise_run: Option<usize>,
    keyword_window_chars: Option<usize>,
    min_abstract_chars: Option<usize>,
    reference_floor: Option<f64>,
    reference_floor_min_len: Option<usize>,
    evidence_window_chars: Option<usize>,
    keep_heading: Option<bool>,
    openers: ListOverride<String>,
    bare_openers: ListOverride<String>,
    abstract_labels: ListOverride<String>,
    keyword_labels: ListOverride<String>,
    reference_headings: ListOverride<String>,
    trailing_sections: ListOverride<String>,
}

impl SegmentConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the builder from the `[segmentation]` table of a config file.
    pub fn from_file_config(file: &SegmentationConfig) -> Self {
        let mut builder = Self {
            corruption_sample_chars: file.corruption_sample_chars,
            min_alpha_ratio: file.min_alpha_ratio,
            max_nonprintable_ratio: file.max_nonprintable_ratio,
            max_noise_run: file.max_noise_run,
            keyword_window_chars: file.keyword_window_chars,
            min_abstract_chars: file.min_abstract_chars,
            reference_floor: file.reference_floor,
            reference_floor_min_len: file.reference_floor_min_len,
            evidence_window_chars: file.evidence_window_chars,
            keep_heading: file.keep_heading,
            ..Self::default()
        };
        for opener in file.extra_openers.iter().flatten() {
            builder = builder.add_opener(opener.clone());
        }
        for heading in file.extra_reference_headings.iter().flatten() {
            builder = builder.add_reference_heading(heading.clone());
        }
        builder
    }

    // ── Corruption detector ──

    pub fn corruption_sample_chars(mut self, n: usize) -> Self {
        self.corruption_sample_chars = Some(n);
        self
    }

    pub fn min_alpha_ratio(mut self, ratio: f64) -> Self {
        self.min_alpha_ratio = Some(ratio);
        self
    }

    pub fn max_nonprintable_ratio(mut self, ratio: f64) -> Self {
        self.max_nonprintable_ratio = Some(ratio);
        self
    }

    pub fn max_noise_run(mut self, n: usize) -> Self {
        self.max_noise_run = Some(n);
        self
    }

    // ── Start cascade ──

    pub fn keyword_window_chars(mut self, n: usize) -> Self {
        self.keyword_window_chars = Some(n);
        self
    }

    pub fn min_abstract_chars(mut self, n: usize) -> Self {
        self.min_abstract_chars = Some(n);
        self
    }

    pub fn keep_heading(mut self, keep: bool) -> Self {
        self.keep_heading = Some(keep);
        self
    }

    // ── Reference section ──

    pub fn reference_floor(mut self, fraction: f64) -> Self {
        self.reference_floor = Some(fraction);
        self
    }

    pub fn reference_floor_min_len(mut self, n: usize) -> Self {
        self.reference_floor_min_len = Some(n);
        self
    }

    pub fn evidence_window_chars(mut self, n: usize) -> Self {
        self.evidence_window_chars = Some(n);
        self
    }

    // ── Keyword lists ──

    pub fn set_openers(mut self, openers: Vec<String>) -> Self {
        self.openers = ListOverride::Replace(openers);
        self
    }

    pub fn add_opener(mut self, opener: String) -> Self {
        self.openers.push(opener);
        self
    }

    pub fn set_bare_openers(mut self, openers: Vec<String>) -> Self {
        self.bare_openers = ListOverride::Replace(openers);
        self
    }

    pub fn add_bare_opener(mut self, opener: String) -> Self {
        self.bare_openers.push(opener);
        self
    }

    pub fn set_abstract_labels(mut self, labels: Vec<String>) -> Self {
        self.abstract_labels = ListOverride::Replace(labels);
        self
    }

    pub fn add_abstract_label(mut self, label: String) -> Self {
        self.abstract_labels.push(label);
        self
    }

    pub fn set_keyword_labels(mut self, labels: Vec<String>) -> Self {
        self.keyword_labels = ListOverride::Replace(labels);
        self
    }

    pub fn add_keyword_label(mut self, label: String) -> Self {
        self.keyword_labels.push(label);
        self
    }

    pub fn set_reference_headings(mut self, headings: Vec<String>) -> Self {
        self.reference_headings = ListOverride::Replace(headings);
        self
    }

    pub fn add_reference_heading(mut self, heading: String) -> Self {
        self.reference_headings.push(heading);
        self
    }

    pub fn set_trailing_sections(mut self, headings: Vec<String>) -> Self {
        self.trailing_sections = ListOverride::Replace(headings);
        self
    }

    pub fn add_trailing_section(mut self, heading: String) -> Self {
        self.trailing_sections.push(heading);
        self
    }

    /// Compile the keyword lists and produce a [`SegmentConfig`].
    pub fn build(self) -> Result<SegmentConfig, regex::Error> {
        let defaults = SegmentConfig::default();

        let lists = [
            &self.openers,
            &self.bare_openers,
            &self.abstract_labels,
            &self.keyword_labels,
            &self.reference_headings,
            &self.trailing_sections,
        ];
        let patterns = if lists.iter().all(|l| l.is_default()) {
            None
        } else {
            Some(Patterns::compile(
                &self.openers.resolve(&owned(DEFAULT_OPENERS)),
                &self.bare_openers.resolve(&owned(DEFAULT_BARE_OPENERS)),
                &self.abstract_labels.resolve(&owned(DEFAULT_ABSTRACT_LABELS)),
                &self.keyword_labels.resolve(&owned(DEFAULT_KEYWORD_LABELS)),
                &self
                    .reference_headings
                    .resolve(&owned(DEFAULT_REFERENCE_HEADINGS)),
                &self
                    .trailing_sections
                    .resolve(&owned(DEFAULT_TRAILING_SECTIONS)),
            )?)
        };

        Ok(SegmentConfig {
            corruption_sample_chars: self
                .corruption_sample_chars
                .unwrap_or(defaults.corruption_sample_chars),
            min_alpha_ratio: self.min_alpha_ratio.unwrap_or(defaults.min_alpha_ratio),
            max_nonprintable_ratio: self
                .max_nonprintable_ratio
                .unwrap_or(defaults.max_nonprintable_ratio),
            max_noise_run: self.max_noise_run.unwrap_or(defaults.max_noise_run),
            keyword_window_chars: self
                .keyword_window_chars
                .unwrap_or(defaults.keyword_window_chars),
            min_abstract_chars: self
                .min_abstract_chars
                .unwrap_or(defaults.min_abstract_chars),
            reference_floor: self.reference_floor.unwrap_or(defaults.reference_floor),
            reference_floor_min_len: self
                .reference_floor_min_len
                .unwrap_or(defaults.reference_floor_min_len),
            evidence_window_chars: self
                .evidence_window_chars
                .unwrap_or(defaults.evidence_window_chars),
            keep_heading: self.keep_heading.unwrap_or(defaults.keep_heading),
            patterns,
        })
    }
}
