//! Reference-section segmentation.
//!
//! The bibliography is located through its heading, searched from the end of
//! the document backward, and accepted only if the isolated block carries
//! citation-shaped evidence. A heading followed by prose (a figure caption, an
//! in-body mention of "Literatur") is treated as a false positive.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use delfi_core::Extracted;

use crate::config::SegmentConfig;
use crate::corruption::is_corrupted_with_config;
use crate::text_processing::{char_offset, head_chars};

/// Citation shapes accepted as proof that a block is a reference list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationEvidence {
    /// DeLFI-style `[BBS01]`, `[Ka93]`
    BracketedTag,
    /// `[12]` at the start of a line
    BracketedNumber,
    /// `Bruner, J. S. (1961)` or `Bruner, J., 1961`
    AuthorYear,
}

static BRACKETED_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(?:[A-Za-z]{2,4}|[A-Z][a-z]{1,2})\d{2}\]").unwrap());

static BRACKETED_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*\[\d{1,3}\]").unwrap());

static AUTHOR_YEAR_RES: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"(?m)^[A-ZÄÖÜ][a-zäöüß]+,\s+[A-Z].*?\(\d{4}\)").unwrap(),
        Regex::new(r"(?m)^[A-ZÄÖÜ][a-zäöüß]+,\s+[A-Z]\.[^\n]*?\b(?:19|20)\d{2}\b").unwrap(),
    ]
});

/// Trailing page furniture, tried in order; only the first matching rule is
/// applied. None of them can span more than the last line.
static TRAILER_RES: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        // "449"
        Regex::new(r"\n\d{1,4}\s*$").unwrap(),
        // "208 Alexander Aumann et al."
        Regex::new(r"\n\d{1,4}[ \t]+[A-ZÄÖÜ][a-zäöüß]+[^\n]*$").unwrap(),
        // "The interplay of ... 21"
        Regex::new(r"\n[A-ZÄÖÜ][^\n]+[ \t]+\d{1,4}[ \t]*$").unwrap(),
    ]
});

/// First kind of citation evidence found in `sample`, if any.
pub fn find_citation_evidence(sample: &str) -> Option<CitationEvidence> {
    if BRACKETED_TAG_RE.is_match(sample) {
        Some(CitationEvidence::BracketedTag)
    } else if BRACKETED_NUMBER_RE.is_match(sample) {
        Some(CitationEvidence::BracketedNumber)
    } else if AUTHOR_YEAR_RES.iter().any(|re| re.is_match(sample)) {
        Some(CitationEvidence::AuthorYear)
    } else {
        None
    }
}

/// Byte span of a reference heading. `start` points at the heading text
/// itself (leading blank lines excluded), `end` just past the heading line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReferenceHeading {
    pub start: usize,
    pub end: usize,
}

/// A validated reference section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceSection {
    pub heading: ReferenceHeading,
    /// Entries without the heading, cut before any trailing appendix and
    /// stripped of the final page header/footer line.
    pub block: String,
    pub evidence: CitationEvidence,
}

/// All reference headings at or after the position floor, in document order.
pub(crate) fn heading_candidates(text: &str, config: &SegmentConfig) -> Vec<ReferenceHeading> {
    let total_chars = text.chars().count();
    let floor = if total_chars >= config.reference_floor_min_len {
        let floor_chars = (total_chars as f64 * config.reference_floor) as usize;
        char_offset(text, floor_chars)
    } else {
        0
    };

    config
        .patterns()
        .reference_heading
        .find_iter(text)
        .map(|m| {
            let leading_ws = m.as_str().len() - m.as_str().trim_start().len();
            ReferenceHeading {
                start: m.start() + leading_ws,
                end: m.end(),
            }
        })
        .filter(|h| h.start >= floor)
        .collect()
}

/// Remove the last line if it looks like a page number or running head.
fn strip_trailer(block: &str) -> &str {
    for re in TRAILER_RES.iter() {
        if let Some(m) = re.find(block) {
            return block[..m.start()].trim();
        }
    }
    block
}

/// Isolate the block after `heading`: cut at a trailing appendix heading,
/// trim, and strip the final page furniture line.
fn isolate_block<'t>(text: &'t str, heading: &ReferenceHeading, config: &SegmentConfig) -> &'t str {
    let after = &text[heading.end..];
    let body = match config.patterns().trailing_section.find(after) {
        Some(m) => &after[..m.start()],
        None => after,
    };
    strip_trailer(body.trim())
}

/// Find the last reference heading whose block contains citation evidence.
pub fn locate_reference_section(text: &str, config: &SegmentConfig) -> Option<ReferenceSection> {
    let candidates = heading_candidates(text, config);

    for heading in candidates.iter().rev() {
        let block = isolate_block(text, heading, config);
        if block.is_empty() {
            continue;
        }
        match find_citation_evidence(head_chars(block, config.evidence_window_chars)) {
            Some(evidence) => {
                tracing::debug!(
                    heading_start = heading.start,
                    ?evidence,
                    "reference section validated"
                );
                return Some(ReferenceSection {
                    heading: *heading,
                    block: block.to_string(),
                    evidence,
                });
            }
            None => {
                tracing::debug!(
                    heading_start = heading.start,
                    "reference heading without citation evidence, skipping"
                );
            }
        }
    }
    None
}

/// Extract the bibliography of a paper.
///
/// Returns [`Extracted::NotFound`] for corrupted input, when no heading is
/// found, and when no candidate block passes citation validation.
pub fn extract_references(raw: &str) -> Extracted {
    extract_references_with_config(raw, &SegmentConfig::default())
}

/// Config-aware version of [`extract_references`].
pub(crate) fn extract_references_with_config(raw: &str, config: &SegmentConfig) -> Extracted {
    if is_corrupted_with_config(raw, config) {
        return Extracted::NotFound;
    }
    match locate_reference_section(raw, config) {
        Some(section) => Extracted::Text(section.block),
        None => Extracted::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SegmentConfigBuilder;

    fn body(n: usize) -> String {
        "Wir beschreiben den Aufbau der Lernumgebung und die Ergebnisse der Evaluation. "
            .repeat(n)
    }

    #[test]
    fn test_evidence_shapes() {
        assert_eq!(
            find_citation_evidence("[BBS01] Baumann, B.: Titel."),
            Some(CitationEvidence::BracketedTag)
        );
        assert_eq!(
            find_citation_evidence("text [Ka93] text"),
            Some(CitationEvidence::BracketedTag)
        );
        assert_eq!(
            find_citation_evidence("  [12] A. Author. Title."),
            Some(CitationEvidence::BracketedNumber)
        );
        assert_eq!(
            find_citation_evidence("Bruner, J. S. (1961). The act of discovery."),
            Some(CitationEvidence::AuthorYear)
        );
        assert_eq!(
            find_citation_evidence("Kerres, M., 2018. Mediendidaktik."),
            Some(CitationEvidence::AuthorYear)
        );
        assert_eq!(
            find_citation_evidence("See Figure 3 for references to prior layouts."),
            None
        );
    }

    #[test]
    fn test_short_document() {
        let text = "1 Introduction\nLorem ipsum...\nReferences\n[BBS01] Author et al.";
        assert_eq!(
            extract_references(text),
            Extracted::Text("[BBS01] Author et al.".to_string())
        );
    }

    #[test]
    fn test_heading_without_evidence_is_not_found() {
        let text = "1 Introduction\nLorem ipsum dolor sit amet.\nReferences\n\
                    See Figure 3 for references to prior layouts.";
        assert_eq!(extract_references(text), Extracted::NotFound);
    }

    #[test]
    fn test_last_valid_heading_wins() {
        let text = format!(
            "1 Einleitung\n{}\nLiteratur\n[AB01] First list.\n{}\nLiteratur\n[CD02] Second list.",
            body(30),
            body(5)
        );
        let section = locate_reference_section(&text, &SegmentConfig::default()).unwrap();
        assert_eq!(section.block, "[CD02] Second list.");
        assert_eq!(section.evidence, CitationEvidence::BracketedTag);
    }

    #[test]
    fn test_later_invalid_heading_falls_back_to_earlier() {
        let text = format!(
            "1 Einleitung\n{}\nLiteratur\n[AB01] Real entry.\n{}\nQuellen\nAlle Abbildungen vom Autor.",
            body(30),
            body(2)
        );
        let section = locate_reference_section(&text, &SegmentConfig::default()).unwrap();
        assert!(section.block.starts_with("[AB01] Real entry."));
    }

    #[test]
    fn test_floor_rejects_early_heading() {
        let text = format!(
            "1 Einleitung\nLiteratur\n[AB01] Too early.\n{}",
            body(60)
        );
        assert_eq!(extract_references(&text), Extracted::NotFound);

        let config = SegmentConfigBuilder::new()
            .reference_floor(0.0)
            .build()
            .unwrap();
        assert!(locate_reference_section(&text, &config).is_some());
    }

    #[test]
    fn test_numbered_and_footnoted_headings() {
        for heading in ["5 Literatur", "5. Literatur", "5\nLiteratur", "Literatur1", "Reference List"] {
            let text = format!("Body.\n{}\n[1] A. Author. Title. 2004.", heading);
            assert_eq!(
                extract_references(&text),
                Extracted::Text("[1] A. Author. Title. 2004.".to_string()),
                "heading {:?}",
                heading
            );
        }
    }

    #[test]
    fn test_cut_at_appendix() {
        let text = "Body.\nReferences\n[1] A. Author. Title.\nAppendix A\nQuestionnaire items.";
        assert_eq!(
            extract_references(text),
            Extracted::Text("[1] A. Author. Title.".to_string())
        );
    }

    #[test]
    fn test_wrapped_entry_starting_with_anhang_is_kept() {
        let text = "Body.\nLiteratur\n[Mu09] Müller, K.: Lernplattformen im\nAnhang zur Studie, Springer, 2009.\n[Ka93] Kay, A.: Smalltalk.";
        let refs = extract_references(text);
        let block = refs.text().unwrap();
        assert!(block.contains("Anhang zur Studie"));
        assert!(block.ends_with("Kay, A.: Smalltalk."));
    }

    #[test]
    fn test_trailer_page_number() {
        let text = "Body.\nLiteratur\n[Ka93] Kay, A.: Title.\n[Mü04] Müller, B.: Buch.\n449\n";
        assert_eq!(
            extract_references(text),
            Extracted::Text("[Ka93] Kay, A.: Title.\n[Mü04] Müller, B.: Buch.".to_string())
        );
    }

    #[test]
    fn test_trailer_running_head_with_authors() {
        let text = "Body.\nLiteratur\n[Ka93] Kay, A.: Title.\n208 Alexander Aumann et al.";
        assert_eq!(
            extract_references(text),
            Extracted::Text("[Ka93] Kay, A.: Title.".to_string())
        );
    }

    #[test]
    fn test_trailer_title_with_page_number() {
        let text = "Body.\nLiteratur\n[Ka93] Kay, A.: Title.\nThe interplay of tools and learners 21";
        assert_eq!(
            extract_references(text),
            Extracted::Text("[Ka93] Kay, A.: Title.".to_string())
        );
    }

    #[test]
    fn test_evidence_checked_after_stripping() {
        // The only citation-shaped text is the running head that gets stripped
        let text = "Body.\nLiteratur\nSiehe Kapitel drei.\n208 Kay et al. [Ka93]";
        assert_eq!(extract_references(text), Extracted::NotFound);
    }

    #[test]
    fn test_corrupted_input_is_not_found() {
        let garbled = "\x1aE2F1C $ \x05.3 \x17.0.-\x1c\x1a".repeat(50);
        assert_eq!(extract_references(&garbled), Extracted::NotFound);
    }

    #[test]
    fn test_returned_block_always_has_evidence() {
        let inputs = [
            "Body.\nReferences\n[1] Entry.".to_string(),
            "Body.\nReferences\nNothing to see.".to_string(),
            format!("{}\nBibliography\nSmith, J. (2001). Book.\n", body(40)),
            format!("{}\nBibliography\n", body(40)),
        ];
        for text in &inputs {
            if let Extracted::Text(block) = extract_references(text) {
                assert!(find_citation_evidence(&block).is_some(), "{:?}", block);
            }
        }
    }
}
