//! SQLite operations on the `paper` table.

use rusqlite::{Connection, ErrorCode, OptionalExtension, params};

use delfi_core::{Extracted, SegmentationResult};

use crate::{PaperRow, StoreError};

/// Columns written by [`insert_batch`], in statement order.
pub const COLUMNS: &[&str] = &[
    "title",
    "authors",
    "year",
    "abstract",
    "text",
    "references",
    "start_page",
    "end_page",
    "subject",
    "filename",
    "editors",
    "doi",
    "isbn",
    "issn",
    "proceeding_title",
    "series_title",
    "publisher",
    "publication_place",
    "conference_date",
    "conference_location",
    "session_title",
    "publication_type",
    "language",
    "peer_review_status",
];

/// Create the `paper` table if it does not exist.
pub fn init_database(conn: &Connection) -> Result<(), StoreError> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS paper (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL UNIQUE,
            authors TEXT NOT NULL,
            year INTEGER NOT NULL,
            abstract TEXT,
            text TEXT NOT NULL,
            "references" TEXT,
            start_page INTEGER,
            end_page INTEGER,
            subject TEXT,
            filename TEXT NOT NULL,
            editors TEXT,
            doi TEXT UNIQUE,
            isbn TEXT,
            issn TEXT,
            proceeding_title TEXT,
            series_title TEXT,
            publisher TEXT,
            publication_place TEXT,
            conference_date TEXT,
            conference_location TEXT,
            session_title TEXT,
            publication_type TEXT,
            language TEXT,
            peer_review_status TEXT,
            UNIQUE (year, filename)
        );

        CREATE INDEX IF NOT EXISTS idx_paper_year ON paper(year);
        "#,
    )?;

    Ok(())
}

fn insert_sql() -> String {
    let columns: Vec<String> = COLUMNS.iter().map(|c| format!("\"{}\"", c)).collect();
    let placeholders: Vec<String> = (1..=COLUMNS.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT INTO paper ({}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    )
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// Outcome of inserting one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Inserted,
    /// A unique constraint (`title`, `doi` or `(year, filename)`) rejected it.
    Duplicate(String),
}

/// Insert `rows` in one transaction. Rows that violate a unique constraint
/// are skipped; any other error aborts the batch.
pub fn insert_batch(conn: &Connection, rows: &[PaperRow]) -> Result<Vec<RowOutcome>, StoreError> {
    let tx = conn.unchecked_transaction()?;
    let mut outcomes = Vec::with_capacity(rows.len());

    {
        let mut stmt = tx.prepare_cached(&insert_sql())?;
        for row in rows {
            let m = &row.metadata;
            let result = stmt.execute(params![
                m.title,
                m.authors,
                m.year,
                m.abstract_text,
                row.segmentation.text.as_str(),
                row.segmentation.references.as_str(),
                m.start_page,
                m.end_page,
                m.subject,
                m.filename,
                m.editors,
                m.doi,
                m.isbn,
                m.issn,
                m.proceeding_title,
                m.series_title,
                m.publisher,
                m.publication_place,
                m.conference_date,
                m.conference_location,
                m.session_title,
                m.publication_type,
                m.language,
                m.peer_review_status,
            ]);
            match result {
                Ok(_) => outcomes.push(RowOutcome::Inserted),
                Err(e) if is_unique_violation(&e) => {
                    tracing::debug!(filename = %m.filename, error = %e, "duplicate paper skipped");
                    outcomes.push(RowOutcome::Duplicate(e.to_string()));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    tx.commit()?;
    Ok(outcomes)
}

pub fn count(conn: &Connection) -> Result<i64, StoreError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM paper", [], |row| row.get(0))?)
}

/// `(year, papers)` in ascending year order.
pub fn papers_per_year(conn: &Connection) -> Result<Vec<(u16, i64)>, StoreError> {
    let mut stmt =
        conn.prepare_cached("SELECT year, COUNT(*) FROM paper GROUP BY year ORDER BY year")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, u16>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Number of rows whose `column` holds exactly `value`.
fn count_equal(conn: &Connection, column: &str, value: &str) -> Result<i64, StoreError> {
    let sql = format!("SELECT COUNT(*) FROM paper WHERE \"{}\" = ?1", column);
    Ok(conn.query_row(&sql, params![value], |row| row.get(0))?)
}

/// `(corrupted text, no references found)` counts.
pub fn sentinel_counts(conn: &Connection) -> Result<(i64, i64), StoreError> {
    let corrupted = count_equal(conn, "text", Extracted::Corrupted.as_str())?;
    let missing = count_equal(conn, "references", Extracted::NotFound.as_str())?;
    Ok((corrupted, missing))
}

/// Stored segmentation of one paper, with sentinels mapped back to variants.
pub fn get_segmentation(
    conn: &Connection,
    year: u16,
    filename: &str,
) -> Result<Option<SegmentationResult>, StoreError> {
    let mut stmt = conn.prepare_cached(
        "SELECT text, \"references\" FROM paper WHERE year = ?1 AND filename = ?2",
    )?;
    let row = stmt
        .query_row(params![year, filename], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })
        .optional()?;
    Ok(row.map(|(text, references)| SegmentationResult {
        text: Extracted::from_contract_str(&text),
        references: references
            .map(|r| Extracted::from_contract_str(&r))
            .unwrap_or(Extracted::NotFound),
    }))
}
