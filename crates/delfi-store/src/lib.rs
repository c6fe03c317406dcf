//! Persistence of segmented papers in a SQLite `paper` table.
//!
//! The table mirrors the schema of the study database: bibliographic columns
//! from the metadata record plus the `text` and `references` produced by the
//! segmentation engine. Sentinel values are stored as their literal strings
//! so that papers needing manual review can be selected with plain SQL.

use std::path::Path;

use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;

pub mod db;

pub use db::RowOutcome;
use delfi_core::{PaperMetadata, SegmentationResult};

/// Commit interval used when none is configured.
pub const DEFAULT_BATCH_SIZE: usize = 50;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One row of the `paper` table.
#[derive(Debug, Clone)]
pub struct PaperRow {
    pub metadata: PaperMetadata,
    pub segmentation: SegmentationResult,
}

impl PaperRow {
    pub fn new(metadata: PaperMetadata, segmentation: SegmentationResult) -> Self {
        Self {
            metadata,
            segmentation,
        }
    }
}

/// Result of [`PaperStore::insert_papers`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct InsertSummary {
    pub inserted: usize,
    /// `(filename, reason)` of rows rejected by a unique constraint.
    pub duplicates: Vec<(String, String)>,
}

/// Papers flagged for manual review.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentinelCounts {
    pub corrupted: i64,
    pub no_references: i64,
}

/// A SQLite database holding the `paper` table.
pub struct PaperStore {
    conn: Connection,
}

impl PaperStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        db::init_database(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        db::init_database(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Insert `rows`, committing every `batch_size` rows. Duplicates are
    /// skipped and reported; other database errors abort.
    pub fn insert_papers(
        &self,
        rows: &[PaperRow],
        batch_size: usize,
    ) -> Result<InsertSummary, StoreError> {
        let mut summary = InsertSummary::default();
        for (i, chunk) in rows.chunks(batch_size.max(1)).enumerate() {
            let outcomes = db::insert_batch(&self.conn, chunk)?;
            for (row, outcome) in chunk.iter().zip(outcomes) {
                match outcome {
                    RowOutcome::Inserted => summary.inserted += 1,
                    RowOutcome::Duplicate(reason) => summary
                        .duplicates
                        .push((row.metadata.filename.clone(), reason)),
                }
            }
            tracing::debug!(batch = i + 1, rows = chunk.len(), "committed batch");
        }
        tracing::info!(
            inserted = summary.inserted,
            duplicates = summary.duplicates.len(),
            "papers stored"
        );
        Ok(summary)
    }

    pub fn count(&self) -> Result<i64, StoreError> {
        db::count(&self.conn)
    }

    pub fn papers_per_year(&self) -> Result<Vec<(u16, i64)>, StoreError> {
        db::papers_per_year(&self.conn)
    }

    pub fn sentinel_counts(&self) -> Result<SentinelCounts, StoreError> {
        let (corrupted, no_references) = db::sentinel_counts(&self.conn)?;
        Ok(SentinelCounts {
            corrupted,
            no_references,
        })
    }

    pub fn get_segmentation(
        &self,
        year: u16,
        filename: &str,
    ) -> Result<Option<SegmentationResult>, StoreError> {
        db::get_segmentation(&self.conn, year, filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delfi_core::Extracted;

    fn row(title: &str, year: u16, filename: &str, doi: Option<&str>) -> PaperRow {
        PaperRow::new(
            PaperMetadata {
                title: title.into(),
                authors: "Beispiel, Anna".into(),
                year,
                filename: filename.into(),
                doi: doi.map(String::from),
                ..Default::default()
            },
            SegmentationResult {
                text: Extracted::Text("Inhalt.".into()),
                references: Extracted::Text("[Ka93] Kay, A.".into()),
            },
        )
    }

    #[test]
    fn test_insert_and_count() {
        let store = PaperStore::open_in_memory().unwrap();
        let rows = vec![
            row("A", 2009, "p1.pdf", Some("10.1/a")),
            row("B", 2009, "p2.pdf", None),
            row("C", 2010, "p1.pdf", None),
        ];
        let summary = store.insert_papers(&rows, 2).unwrap();
        assert_eq!(summary.inserted, 3);
        assert!(summary.duplicates.is_empty());
        assert_eq!(store.count().unwrap(), 3);
        assert_eq!(store.papers_per_year().unwrap(), vec![(2009, 2), (2010, 1)]);
    }

    #[test]
    fn test_duplicates_are_skipped() {
        let store = PaperStore::open_in_memory().unwrap();
        let rows = vec![
            row("A", 2009, "p1.pdf", Some("10.1/a")),
            row("A", 2011, "p9.pdf", None),           // same title
            row("B", 2009, "p1.pdf", None),           // same (year, filename)
            row("C", 2012, "p3.pdf", Some("10.1/a")), // same doi
            row("D", 2012, "p4.pdf", None),
        ];
        let summary = store.insert_papers(&rows, DEFAULT_BATCH_SIZE).unwrap();
        assert_eq!(summary.inserted, 2);
        let skipped: Vec<&str> = summary.duplicates.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(skipped, vec!["p9.pdf", "p1.pdf", "p3.pdf"]);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_null_dois_do_not_collide() {
        let store = PaperStore::open_in_memory().unwrap();
        let rows = vec![row("A", 2009, "p1.pdf", None), row("B", 2009, "p2.pdf", None)];
        assert_eq!(store.insert_papers(&rows, 1).unwrap().inserted, 2);
    }

    #[test]
    fn test_sentinels_round_trip() {
        let store = PaperStore::open_in_memory().unwrap();
        let mut corrupted = row("A", 2009, "p1.pdf", None);
        corrupted.segmentation = SegmentationResult::corrupted();
        let mut no_refs = row("B", 2009, "p2.pdf", None);
        no_refs.segmentation.references = Extracted::NotFound;
        store
            .insert_papers(&[corrupted, no_refs, row("C", 2009, "p3.pdf", None)], 50)
            .unwrap();

        assert_eq!(
            store.sentinel_counts().unwrap(),
            SentinelCounts {
                corrupted: 1,
                no_references: 2
            }
        );
        assert_eq!(
            store.get_segmentation(2009, "p1.pdf").unwrap(),
            Some(SegmentationResult::corrupted())
        );
        let stored: String = store
            .connection()
            .query_row(
                "SELECT text FROM paper WHERE filename = 'p1.pdf'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(stored, "Corrupted text");
        assert_eq!(store.get_segmentation(2009, "missing.pdf").unwrap(), None);
    }

    #[test]
    fn test_open_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("delfi.sqlite");
        {
            let store = PaperStore::open(&path).unwrap();
            store
                .insert_papers(&[row("A", 2009, "p1.pdf", None)], 50)
                .unwrap();
        }
        let reopened = PaperStore::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }
}
