//! Main-content segmentation: from the introduction-equivalent heading up to,
//! but excluding, the reference section.

use serde::Serialize;

use delfi_core::Extracted;

use crate::config::SegmentConfig;
use crate::corruption::is_corrupted_with_config;
use crate::references::locate_reference_section;
use crate::rules::{PatternRule, StartRule, default_cascade, run_cascade};

/// Main content together with the boundaries it was cut at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MainContentReport {
    pub content: Extracted,
    /// Rule that fixed the start, `None` when the document start was used.
    pub start_rule: Option<StartRule>,
    /// Byte offsets into the raw text (before trimming).
    pub start: usize,
    pub end: usize,
}

/// Extract the main content of a paper with the default cascade.
///
/// Returns [`Extracted::Corrupted`] for garbled text. Otherwise the result is
/// always a trimmed substring of `raw`: if no start rule matches, the content
/// starts at the beginning of the document; if no validated reference heading
/// follows the start, it runs to the end.
pub fn extract_main_content(raw: &str) -> Extracted {
    extract_main_content_with_config(raw, &SegmentConfig::default())
}

/// Config-aware version of [`extract_main_content`].
pub(crate) fn extract_main_content_with_config(raw: &str, config: &SegmentConfig) -> Extracted {
    segment_main_content(raw, &default_cascade(), config).content
}

/// Run the start cascade and the reference boundary over `raw`.
pub fn segment_main_content(
    raw: &str,
    rules: &[PatternRule],
    config: &SegmentConfig,
) -> MainContentReport {
    if is_corrupted_with_config(raw, config) {
        tracing::warn!(len = raw.len(), "corrupted text, skipping boundary search");
        return MainContentReport {
            content: Extracted::Corrupted,
            start_rule: None,
            start: 0,
            end: 0,
        };
    }

    let matched = run_cascade(rules, raw, config);
    let start = match &matched {
        Some(m) => {
            tracing::debug!(rule = %m.rule, offset = m.boundary.start, "start boundary");
            m.boundary.content_start(raw, config.keep_heading)
        }
        None => {
            tracing::warn!("no start rule matched, using document start");
            0
        }
    };

    let end = locate_reference_section(raw, config)
        .map(|section| section.heading.start)
        .filter(|&heading| heading >= start)
        .unwrap_or(raw.len());

    MainContentReport {
        content: Extracted::Text(raw[start..end].trim().to_string()),
        start_rule: matched.map(|m| m.rule),
        start,
        end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SegmentConfigBuilder;

    fn body(n: usize) -> String {
        "Die Studie untersucht Lernprozesse in Online-Kursen der Hochschule.\n".repeat(n)
    }

    #[test]
    fn test_heading_and_references_excluded() {
        let text = "1 Introduction\nLorem ipsum...\nReferences\n[BBS01] Author et al.";
        let report = segment_main_content(text, &default_cascade(), &SegmentConfig::default());
        assert_eq!(report.content, Extracted::Text("Lorem ipsum...".to_string()));
        assert_eq!(report.start_rule, Some(StartRule::NumberedOpener));
    }

    #[test]
    fn test_keep_heading() {
        let config = SegmentConfigBuilder::new().keep_heading(true).build().unwrap();
        let text = "Title\n1 Introduction\nLorem ipsum.\nReferences\n[BBS01] Author et al.";
        assert_eq!(
            extract_main_content_with_config(text, &config),
            Extracted::Text("1 Introduction\nLorem ipsum.".to_string())
        );
    }

    #[test]
    fn test_multiline_keywords_start_at_continuation() {
        let text = "Keywords: a, b,\nc, d\nEinstieg\nBody text";
        let report = segment_main_content(text, &default_cascade(), &SegmentConfig::default());
        assert_eq!(report.start_rule, Some(StartRule::BelowKeywords));
        assert_eq!(
            report.content,
            Extracted::Text("c, d\nEinstieg\nBody text".to_string())
        );
    }

    #[test]
    fn test_numbered_opener_beats_keywords_rule() {
        let text = "Keywords: a, b,\nc, d\n1 Introduction\nBody text";
        let report = segment_main_content(text, &default_cascade(), &SegmentConfig::default());
        assert_eq!(report.start_rule, Some(StartRule::NumberedOpener));
        assert_eq!(report.content, Extracted::Text("Body text".to_string()));
    }

    #[test]
    fn test_corrupted_short_circuits() {
        let garbled = "\x1aE2F1C $ \x05.3 \x17.0.-\x1c\x1a".repeat(50);
        let report =
            segment_main_content(&garbled, &default_cascade(), &SegmentConfig::default());
        assert_eq!(report.content, Extracted::Corrupted);
        assert_eq!(report.start_rule, None);
    }

    #[test]
    fn test_no_rule_falls_back_to_document_start() {
        let text = "Ein Text ohne jede erkennbare Gliederung.\nNoch eine Zeile.";
        let report = segment_main_content(text, &default_cascade(), &SegmentConfig::default());
        assert_eq!(report.start_rule, None);
        assert_eq!(report.content, Extracted::Text(text.to_string()));
    }

    #[test]
    fn test_reference_heading_before_start_is_ignored() {
        // With the floor disabled an early "Literatur" line may validate; it
        // must not cut the content before its own start
        let config = SegmentConfigBuilder::new().reference_floor(0.0).build().unwrap();
        let text = "Literatur\n[AB01] Vorab.\n1 Einleitung\nInhalt.";
        let report = segment_main_content(text, &default_cascade(), &config);
        assert_eq!(report.content, Extracted::Text("Inhalt.".to_string()));
    }

    #[test]
    fn test_end_matches_reference_heading() {
        let text = format!(
            "Titel\nAbstract: Kurz.\n\n1 Einleitung\n{}Literatur\n[Ke18] Kerres, M.: Mediendidaktik.\n",
            body(40)
        );
        let report = segment_main_content(&text, &default_cascade(), &SegmentConfig::default());
        let section = locate_reference_section(&text, &SegmentConfig::default()).unwrap();
        assert_eq!(report.end, section.heading.start);
        assert!(matches!(report.content, Extracted::Text(ref t) if t.ends_with("Hochschule.")));
    }

    #[test]
    fn test_content_is_substring_of_input() {
        let inputs = [
            format!("Titel\n1 Einleitung\n{}Literatur\n[Ke18] Kerres.", body(35)),
            format!("Titel\nEinleitung\n{}", body(3)),
            format!("Abstract: x\nKeywords: y\n{}", body(2)),
            "Nur ein Satz.".to_string(),
        ];
        for text in &inputs {
            match extract_main_content(text) {
                Extracted::Text(content) => assert!(text.contains(&content), "{:?}", content),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let text = format!("Titel\n1 Einleitung\n{}Literatur\n[Ke18] Kerres.", body(35));
        assert_eq!(extract_main_content(&text), extract_main_content(&text));
    }

    #[test]
    fn test_degenerate_inputs_do_not_panic() {
        for text in ["", "1", "1\n", "References", "Literatur\n[1]", "ä", "1 Einleitung"] {
            let _ = extract_main_content(text);
        }
    }
}
