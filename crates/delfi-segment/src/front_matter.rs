//! Best-effort front matter for papers without a metadata record.
//!
//! Only the abstract is attempted. Title and author lines of DeLFI papers are
//! too irregular in the text layer to be recovered reliably.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::SegmentConfig;
use crate::corruption::is_corrupted_with_config;
use crate::rules::{PatternRule, find_abstract_label, run_cascade};

/// Text between the abstract heading and whatever follows it first: the
/// keywords line, the start of the main content, or a blank line.
pub(crate) fn extract_abstract_with_rules(
    raw: &str,
    rules: &[PatternRule],
    config: &SegmentConfig,
) -> Option<String> {
    static BLANK_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

    if is_corrupted_with_config(raw, config) {
        return None;
    }
    let p = config.patterns();
    let label = find_abstract_label(raw, config)?;
    let base = label.end();
    let rest = &raw[base..];

    let keywords = p.keywords_line.find(rest).map(|m| base + m.start());
    let content = run_cascade(rules, raw, config)
        .map(|m| m.boundary.start)
        .filter(|&start| start > base);

    let end = match keywords.into_iter().chain(content).min() {
        Some(end) => end,
        None => BLANK_LINE_RE
            .find(rest.trim_start())
            .map(|m| raw.len() - rest.trim_start().len() + m.start())
            .unwrap_or(raw.len()),
    };

    let text = raw[base..end].trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::default_cascade;

    fn abstract_of(text: &str) -> Option<String> {
        extract_abstract_with_rules(text, &default_cascade(), &SegmentConfig::default())
    }

    #[test]
    fn test_abstract_until_keywords() {
        let text = "Titel\nAbstract: Wir untersuchen X.\nUnd Y.\nKeywords: a, b\n1 Einleitung\nText";
        assert_eq!(
            abstract_of(text).as_deref(),
            Some("Wir untersuchen X.\nUnd Y.")
        );
    }

    #[test]
    fn test_abstract_until_introduction() {
        let text = "Titel\nZusammenfassung\nKurzer Abriss.\n1 Einleitung\nText";
        assert_eq!(abstract_of(text).as_deref(), Some("Kurzer Abriss."));
    }

    #[test]
    fn test_abstract_until_blank_line() {
        let text = "Titel\nAbstract:\nOnly the abstract.\n\nunnumbered prose follows";
        assert_eq!(abstract_of(text).as_deref(), Some("Only the abstract."));
    }

    #[test]
    fn test_no_abstract_heading() {
        assert_eq!(abstract_of("Titel\n1 Einleitung\nText"), None);
    }

    #[test]
    fn test_corrupted_has_no_abstract() {
        let garbled = "\x1aE2F1C $ \x05.3 \x17.0.-\x1c\x1a".repeat(50);
        assert_eq!(abstract_of(&garbled), None);
    }
}
