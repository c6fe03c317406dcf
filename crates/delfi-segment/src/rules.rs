//! The start-boundary cascade.
//!
//! Each [`PatternRule`] pairs a [`StartRule`] (name + priority) with a locator
//! function. Rules run in ascending priority and the first one that produces a
//! [`Boundary`] wins. Results of different rules are never merged or scored.

use std::fmt;

use once_cell::sync::Lazy;
use regex::{Match, Regex};
use serde::Serialize;

use crate::config::SegmentConfig;
use crate::text_processing::{advance_chars, char_offset, line_end};

/// Identifies one strategy of the start cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartRule {
    /// `1 Introduction`, `1. Einleitung`, `1\nMotivation`, `1: Background`
    NumberedOpener,
    /// Unnumbered `Einleitung` line close to the top of the paper
    BareOpener,
    /// First paragraph after the abstract (papers without a keywords line)
    BelowAbstract,
    /// First line after the keywords line
    BelowKeywords,
    /// `1 <any title>`
    NumberedAnyTitle,
}

impl StartRule {
    /// Lower runs first.
    pub fn priority(&self) -> u8 {
        match self {
            Self::NumberedOpener => 1,
            Self::BareOpener => 2,
            Self::BelowAbstract => 3,
            Self::BelowKeywords => 4,
            Self::NumberedAnyTitle => 5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NumberedOpener => "numbered_opener",
            Self::BareOpener => "bare_opener",
            Self::BelowAbstract => "below_abstract",
            Self::BelowKeywords => "below_keywords",
            Self::NumberedAnyTitle => "numbered_any_title",
        }
    }
}

impl fmt::Display for StartRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Location found by a rule.
///
/// `start` is the anchor (start of a heading, or start of the first body
/// paragraph). `heading_end` is the end of the matched heading span; for
/// paragraph anchors it equals `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Boundary {
    pub start: usize,
    pub heading_end: usize,
}

impl Boundary {
    pub fn anchor(pos: usize) -> Self {
        Self {
            start: pos,
            heading_end: pos,
        }
    }

    pub fn heading(start: usize, end: usize) -> Self {
        Self {
            start,
            heading_end: end,
        }
    }

    fn from_match(offset: usize, m: Match<'_>) -> Self {
        Self::heading(offset + m.start(), offset + m.end())
    }

    pub fn is_heading(&self) -> bool {
        self.heading_end > self.start
    }

    /// Where the main content begins: the anchor itself, or the end of the
    /// heading line when the heading is dropped.
    pub fn content_start(&self, text: &str, keep_heading: bool) -> usize {
        if keep_heading || !self.is_heading() {
            self.start
        } else {
            line_end(text, self.heading_end)
        }
    }
}

pub type Locator = fn(&str, &SegmentConfig) -> Option<Boundary>;

/// One entry of the cascade.
#[derive(Clone, Copy)]
pub struct PatternRule {
    pub rule: StartRule,
    pub locate: Locator,
}

impl PatternRule {
    pub fn new(rule: StartRule, locate: Locator) -> Self {
        Self { rule, locate }
    }

    pub fn priority(&self) -> u8 {
        self.rule.priority()
    }
}

impl fmt::Debug for PatternRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternRule")
            .field("rule", &self.rule)
            .field("priority", &self.priority())
            .finish()
    }
}

/// The winning rule and its boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleMatch {
    pub rule: StartRule,
    pub boundary: Boundary,
}

/// The five built-in rules, sorted by priority.
pub fn default_cascade() -> Vec<PatternRule> {
    let mut rules = vec![
        PatternRule::new(StartRule::NumberedOpener, locate_numbered_opener),
        PatternRule::new(StartRule::BareOpener, locate_bare_opener),
        PatternRule::new(StartRule::BelowAbstract, locate_below_abstract),
        PatternRule::new(StartRule::BelowKeywords, locate_below_keywords),
        PatternRule::new(StartRule::NumberedAnyTitle, locate_numbered_any_title),
    ];
    rules.sort_by_key(|r| r.priority());
    rules
}

/// Evaluate `rules` in ascending priority; the first match wins.
pub fn run_cascade(rules: &[PatternRule], text: &str, config: &SegmentConfig) -> Option<RuleMatch> {
    let mut ordered: Vec<&PatternRule> = rules.iter().collect();
    ordered.sort_by_key(|r| r.priority());
    ordered.into_iter().find_map(|r| {
        (r.locate)(text, config).map(|boundary| RuleMatch {
            rule: r.rule,
            boundary,
        })
    })
}

/// `1 Title`, `1. Title` or `1\nTitle` with a title of up to 80 chars.
pub(crate) fn find_numbered_title(text: &str) -> Option<Match<'_>> {
    static RES: Lazy<[Regex; 2]> = Lazy::new(|| {
        [
            Regex::new(r"(?m)^\s*1\.?\s+[A-Za-zÄÖÜäöü][^\n]{0,80}$").unwrap(),
            Regex::new(r"(?m)^\s*1\s*\n\s*[A-Za-zÄÖÜäöü][^\n]{0,80}$").unwrap(),
        ]
    });
    RES.iter().find_map(|re| re.find(text))
}

/// The abstract heading. `Abstract:` counts anywhere; a bare label line only
/// within the keyword window, since `Zusammenfassung` or `Summary` further
/// down is a closing section.
pub(crate) fn find_abstract_label<'t>(text: &'t str, config: &SegmentConfig) -> Option<Match<'t>> {
    let front_matter_end = advance_chars(text, 0, config.keyword_window_chars);
    config
        .patterns()
        .abstract_label
        .find_iter(text)
        .find(|m| m.as_str().contains(':') || m.start() < front_matter_end)
}

/// Rule 1: ordinal `1` followed by a recognized opener keyword.
pub(crate) fn locate_numbered_opener(text: &str, config: &SegmentConfig) -> Option<Boundary> {
    config
        .patterns()
        .numbered_opener
        .iter()
        .find_map(|re| re.find(text))
        .map(|m| Boundary::from_match(0, m))
}

/// Rule 2: unnumbered opener within the keyword window.
///
/// The window starts at the abstract heading when there is one, so that long
/// title pages do not push the introduction out of reach.
pub(crate) fn locate_bare_opener(text: &str, config: &SegmentConfig) -> Option<Boundary> {
    let p = config.patterns();
    let offset = find_abstract_label(text, config).map(|m| m.start()).unwrap_or(0);
    let window_end = advance_chars(text, offset, config.keyword_window_chars);
    let region = &text[offset..window_end];

    p.bare_opener
        .iter()
        .find_map(|re| re.find(region))
        .map(|m| Boundary::from_match(offset, m))
}

/// Rule 3: first paragraph after the abstract, for papers without keywords.
pub(crate) fn locate_below_abstract(text: &str, config: &SegmentConfig) -> Option<Boundary> {
    static PARAGRAPH_BREAK_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)\n\s*\n\s*([A-ZÄÖÜ])").unwrap());
    static SENTENCE_BREAK_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\.\n([A-ZÄÖÜ])").unwrap());

    let p = config.patterns();
    // Papers with a keywords line are handled by rule 4
    if p.keywords_line.is_match(text) {
        return None;
    }
    let label = find_abstract_label(text, config)?;
    let base = label.end();
    let rest = &text[base..];

    if let Some(m) = find_numbered_title(rest) {
        return Some(Boundary::from_match(base, m));
    }

    // Blank line followed by a letter, skipping keyword labels (no look-ahead
    // in the regex crate, so they are filtered here)
    for caps in PARAGRAPH_BREAK_RE.captures_iter(rest) {
        let Some(letter) = caps.get(1) else { continue };
        if p.keywords_label_start.is_match(&rest[letter.start()..]) {
            continue;
        }
        return Some(Boundary::anchor(base + letter.start()));
    }

    // Sentence end at a line break, past the minimum abstract length first
    let min = char_offset(rest, config.min_abstract_chars);
    let late_break = SENTENCE_BREAK_RE
        .captures(&rest[min..])
        .and_then(|caps| caps.get(1));
    if let Some(letter) = late_break {
        return Some(Boundary::anchor(base + min + letter.start()));
    }
    SENTENCE_BREAK_RE
        .captures(rest)
        .and_then(|caps| caps.get(1))
        .map(|letter| Boundary::anchor(base + letter.start()))
}

/// Rule 4: first non-blank line after the keywords line.
///
/// A keyword list wrapped over several lines anchors at its continuation
/// line, so a few keywords lead the content. Nothing after the anchor is lost.
pub(crate) fn locate_below_keywords(text: &str, config: &SegmentConfig) -> Option<Boundary> {
    static NON_BLANK_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*(\S)").unwrap());

    let line = config.patterns().keywords_line.find(text)?;
    let rest = &text[line.end()..];
    NON_BLANK_LINE_RE
        .captures(rest)
        .and_then(|caps| caps.get(1))
        .map(|first| Boundary::anchor(line.end() + first.start()))
}

/// Rule 5: first section numbered `1`, whatever its title.
pub(crate) fn locate_numbered_any_title(text: &str, _config: &SegmentConfig) -> Option<Boundary> {
    find_numbered_title(text).map(|m| Boundary::from_match(0, m))
}
