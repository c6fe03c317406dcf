//! Loading of the per-volume metadata export.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use delfi_core::PaperMetadata;

use crate::IngestError;
use crate::corpus::{MetadataSource, ProceedingsVolume};

/// Read a `metadata-*.json` file: a JSON array of paper records.
pub fn load_metadata(path: &Path) -> Result<Vec<PaperMetadata>, IngestError> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if !is_json {
        return Err(IngestError::UnsupportedMetadata(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let records: Vec<PaperMetadata> =
        serde_json::from_str(&content).map_err(|source| IngestError::MetadataParse {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(path = %path.display(), records = records.len(), "loaded metadata");
    Ok(records)
}

/// Metadata records of one volume, keyed by PDF file name.
#[derive(Debug, Clone, Default)]
pub struct MetadataIndex {
    by_filename: HashMap<String, PaperMetadata>,
}

impl MetadataIndex {
    /// Index `records`. Records without a year inherit `fallback_year`.
    pub fn from_records(records: Vec<PaperMetadata>, fallback_year: Option<u16>) -> Self {
        let by_filename = records
            .into_iter()
            .map(|mut record| {
                if record.year == 0 {
                    record.year = fallback_year.unwrap_or(0);
                }
                (record.filename.clone(), record)
            })
            .collect();
        Self { by_filename }
    }

    /// Load the index for `volume`. A volume without a JSON export yields an
    /// empty index; its papers go through the metadata-free path.
    pub fn for_volume(volume: &ProceedingsVolume) -> Result<Self, IngestError> {
        match &volume.metadata {
            Some(MetadataSource::Json(path)) => {
                Ok(Self::from_records(load_metadata(path)?, volume.year))
            }
            Some(MetadataSource::Xlsx(path)) => {
                tracing::warn!(
                    volume = %volume.name,
                    path = %path.display(),
                    "metadata only available as spreadsheet, export it to JSON to use it"
                );
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn get(&self, filename: &str) -> Option<&PaperMetadata> {
        self.by_filename.get(filename)
    }

    pub fn len(&self) -> usize {
        self.by_filename.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_filename.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::scan_volume;

    const RECORDS: &str = r#"[
        {"title": "Lernen mit Karten", "authors": "Beispiel, Anna", "year": 2009,
         "filename": "p1.pdf", "doi": "10.1234/abc", "start_page": 11, "end_page": 22},
        {"title": "Wikis", "authors": "Muster, Bernd", "year": 0, "filename": "p2.pdf"}
    ]"#;

    #[test]
    fn test_load_and_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata-lni153.json");
        fs::write(&path, RECORDS).unwrap();

        let records = load_metadata(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].doi.as_deref(), Some("10.1234/abc"));
        assert_eq!(records[0].start_page, Some(11));

        let index = MetadataIndex::from_records(records, Some(2009));
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("p2.pdf").unwrap().year, 2009);
        assert!(index.get("p3.pdf").is_none());
    }

    #[test]
    fn test_xlsx_is_unsupported() {
        let err = load_metadata(Path::new("/x/metadata-lni153.xlsx")).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedMetadata(_)));
    }

    #[test]
    fn test_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata-bad.json");
        fs::write(&path, "{not json").unwrap();
        let err = load_metadata(&path).unwrap_err();
        assert!(matches!(err, IngestError::MetadataParse { .. }));
    }

    #[test]
    fn test_index_for_volume() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("lni153");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("metadata-lni153.json"), RECORDS).unwrap();
        fs::write(dir.join("p1.pdf"), b"").unwrap();

        let volume = scan_volume(&dir).unwrap();
        let index = MetadataIndex::for_volume(&volume).unwrap();
        assert_eq!(index.get("p1.pdf").unwrap().title, "Lernen mit Karten");
    }

    #[test]
    fn test_spreadsheet_only_volume_has_empty_index() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("lni169");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("metadata-lni169.xlsx"), b"").unwrap();

        let volume = scan_volume(&dir).unwrap();
        assert!(MetadataIndex::for_volume(&volume).unwrap().is_empty());
    }
}
