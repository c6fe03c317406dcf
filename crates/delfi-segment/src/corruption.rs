//! Detection of garbled text layers (broken CMaps, missing font encodings).
//!
//! Typical corrupted extractions look like `"\x1aE2F1C $ \x05.3 \x17.0.-\x1c\x1a"`
//! or long stretches of private-use glyph codes. Only a prefix of the text is
//! inspected since garbling, when present, affects the whole document.

use crate::config::SegmentConfig;

/// Character statistics of the inspected prefix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorruptionReport {
    pub sampled_chars: usize,
    pub alpha_ratio: f64,
    pub nonprintable_ratio: f64,
    pub longest_noise_run: usize,
}

/// Control characters other than line breaks and tabs, the replacement
/// character, and Private Use Area code points.
fn is_nonprintable(c: char) -> bool {
    (c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
        || c == '\u{FFFD}'
        || ('\u{E000}'..='\u{F8FF}').contains(&c)
}

/// Gather statistics over the first `sample_chars` characters.
pub fn inspect(text: &str, sample_chars: usize) -> CorruptionReport {
    let mut total = 0usize;
    let mut alpha = 0usize;
    let mut nonprintable = 0usize;
    let mut run = 0usize;
    let mut longest = 0usize;

    for c in text.chars().take(sample_chars) {
        total += 1;
        if c.is_alphabetic() {
            alpha += 1;
        }
        if is_nonprintable(c) {
            nonprintable += 1;
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }

    let ratio = |n: usize| if total == 0 { 0.0 } else { n as f64 / total as f64 };
    CorruptionReport {
        sampled_chars: total,
        alpha_ratio: ratio(alpha),
        nonprintable_ratio: ratio(nonprintable),
        longest_noise_run: longest,
    }
}

/// Whether the extracted text is too garbled to segment.
///
/// Empty and whitespace-only input is classified as corrupted: there is
/// nothing a segmenter could anchor on.
pub fn is_corrupted(text: &str) -> bool {
    is_corrupted_with_config(text, &SegmentConfig::default())
}

/// Config-aware version of [`is_corrupted`].
pub(crate) fn is_corrupted_with_config(text: &str, config: &SegmentConfig) -> bool {
    if text.trim().is_empty() {
        return true;
    }
    let report = inspect(text, config.corruption_sample_chars);
    let corrupted = report.alpha_ratio < config.min_alpha_ratio
        || report.nonprintable_ratio > config.max_nonprintable_ratio
        || report.longest_noise_run >= config.max_noise_run;
    if corrupted {
        tracing::debug!(
            alpha_ratio = report.alpha_ratio,
            nonprintable_ratio = report.nonprintable_ratio,
            longest_noise_run = report.longest_noise_run,
            "text classified as corrupted"
        );
    }
    corrupted
}
