use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub mod backend;
pub mod config_file;
pub mod lni;

pub use backend::{BackendError, PdfBackend};
pub use lni::{volume_year, LNI_VOLUME_YEARS};

/// Persisted in place of main content when the text layer is garbled.
pub const CORRUPTED_SENTINEL: &str = "Corrupted text";

/// Persisted in place of references when no validated reference list exists.
pub const NOT_FOUND_SENTINEL: &str = "No references found";

/// Outcome of isolating one region of a paper.
///
/// Downstream consumers (the `paper` table, the labeling workflow) only ever
/// see strings, so the sentinel variants serialize to the fixed literals
/// [`CORRUPTED_SENTINEL`] and [`NOT_FOUND_SENTINEL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Text(String),
    Corrupted,
    NotFound,
}

impl Extracted {
    /// The string written at the persistence boundary.
    pub fn as_str(&self) -> &str {
        match self {
            Extracted::Text(t) => t,
            Extracted::Corrupted => CORRUPTED_SENTINEL,
            Extracted::NotFound => NOT_FOUND_SENTINEL,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Extracted::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Extracted::Text(_))
    }

    /// Map a persisted string back to its variant.
    pub fn from_contract_str(s: &str) -> Self {
        match s {
            CORRUPTED_SENTINEL => Extracted::Corrupted,
            NOT_FOUND_SENTINEL => Extracted::NotFound,
            other => Extracted::Text(other.to_string()),
        }
    }
}

impl fmt::Display for Extracted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Extracted {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Extracted {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Extracted::from_contract_str(&s))
    }
}

/// Main content and references of one paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationResult {
    pub text: Extracted,
    pub references: Extracted,
}

impl SegmentationResult {
    /// Result for a document whose text layer could not be trusted.
    pub fn corrupted() -> Self {
        Self {
            text: Extracted::Corrupted,
            references: Extracted::NotFound,
        }
    }

    pub fn is_corrupted(&self) -> bool {
        self.text == Extracted::Corrupted
    }
}

/// Result of the metadata-free path.
///
/// Deliberately narrower than a full paper record: title and authors are not
/// extracted from the PDF, and `year` is only known when the proceedings
/// folder follows the LNI naming scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialPaper {
    pub filename: String,
    pub year: Option<u16>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(flatten)]
    pub segmentation: SegmentationResult,
}

/// Bibliographic metadata for one paper, as exported from the proceedings
/// metadata sheet. Field names follow the `paper` table columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub title: String,
    pub authors: String,
    pub year: u16,
    pub filename: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub start_page: Option<u32>,
    #[serde(default)]
    pub end_page: Option<u32>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub editors: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub issn: Option<String>,
    #[serde(default)]
    pub proceeding_title: Option<String>,
    #[serde(default)]
    pub series_title: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub publication_place: Option<String>,
    #[serde(default)]
    pub conference_date: Option<String>,
    #[serde(default)]
    pub conference_location: Option<String>,
    #[serde(default)]
    pub session_title: Option<String>,
    #[serde(default)]
    pub publication_type: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub peer_review_status: Option<String>,
}
