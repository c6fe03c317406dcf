//! Scanning of a proceedings corpus laid out as one folder per LNI volume.
//!
//! ```text
//! <root>/
//!   lni153/
//!     metadata-lni153.json
//!     paper-01.pdf
//!     lni153-komplett.pdf     (full proceedings, skipped)
//!   lni169/
//!     ...
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use delfi_core::volume_year;

use crate::IngestError;

/// Where a volume's metadata sheet lives, if it has one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "format", content = "path", rename_all = "lowercase")]
pub enum MetadataSource {
    /// Machine-readable export, loaded by [`crate::load_metadata`].
    Json(PathBuf),
    /// Original spreadsheet; detected but not read.
    Xlsx(PathBuf),
}

impl MetadataSource {
    pub fn path(&self) -> &Path {
        match self {
            MetadataSource::Json(p) | MetadataSource::Xlsx(p) => p,
        }
    }
}

/// One proceedings folder.
#[derive(Debug, Clone, Serialize)]
pub struct ProceedingsVolume {
    pub name: String,
    pub path: PathBuf,
    /// Inferred from the folder name; `None` outside the known LNI volumes.
    pub year: Option<u16>,
    /// Single-paper PDFs, sorted by file name.
    pub pdfs: Vec<PathBuf>,
    /// Full-proceedings PDFs that were excluded.
    pub skipped: Vec<PathBuf>,
    pub metadata: Option<MetadataSource>,
}

/// Result of [`scan_corpus`].
#[derive(Debug, Clone, Serialize)]
pub struct CorpusScan {
    pub root: PathBuf,
    /// Sorted by folder name.
    pub volumes: Vec<ProceedingsVolume>,
}

impl CorpusScan {
    pub fn total_pdfs(&self) -> usize {
        self.volumes.iter().map(|v| v.pdfs.len()).sum()
    }

    pub fn with_metadata(&self) -> usize {
        self.volumes.iter().filter(|v| v.metadata.is_some()).count()
    }

    pub fn without_metadata(&self) -> usize {
        self.volumes.len() - self.with_metadata()
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Full proceedings volumes are distributed alongside the single papers as
/// `*komplett*.pdf`.
pub fn is_full_proceedings(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase().contains("komplett"))
        .unwrap_or(false)
}

fn metadata_source(path: &Path) -> Option<MetadataSource> {
    let name = path.file_name()?.to_string_lossy().to_lowercase();
    if !name.starts_with("metadata-") {
        return None;
    }
    if has_extension(path, "json") {
        Some(MetadataSource::Json(path.to_path_buf()))
    } else if has_extension(path, "xlsx") {
        Some(MetadataSource::Xlsx(path.to_path_buf()))
    } else {
        None
    }
}

/// Scan a single proceedings folder.
pub fn scan_volume(dir: &Path) -> Result<ProceedingsVolume, IngestError> {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut pdfs = Vec::new();
    let mut skipped = Vec::new();
    let mut json = None;
    let mut xlsx = None;

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if has_extension(&path, "pdf") {
            if is_full_proceedings(&path) {
                skipped.push(path);
            } else {
                pdfs.push(path);
            }
            continue;
        }
        match metadata_source(&path) {
            Some(MetadataSource::Json(p)) => json = json.or(Some(p)),
            Some(MetadataSource::Xlsx(p)) => xlsx = xlsx.or(Some(p)),
            None => {}
        }
    }
    pdfs.sort();
    skipped.sort();

    // The JSON export is preferred over the spreadsheet
    let metadata = json
        .map(MetadataSource::Json)
        .or(xlsx.map(MetadataSource::Xlsx));

    let year = volume_year(&name);
    tracing::debug!(
        volume = %name,
        pdfs = pdfs.len(),
        skipped = skipped.len(),
        has_metadata = metadata.is_some(),
        "scanned volume"
    );

    Ok(ProceedingsVolume {
        name,
        path: dir.to_path_buf(),
        year,
        pdfs,
        skipped,
        metadata,
    })
}

/// Scan every immediate subdirectory of `root` as a proceedings volume.
pub fn scan_corpus(root: &Path) -> Result<CorpusScan, IngestError> {
    if !root.is_dir() {
        return Err(IngestError::NotADirectory(root.to_path_buf()));
    }

    let mut dirs: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();

    let volumes = dirs
        .iter()
        .map(|d| scan_volume(d))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(
        root = %root.display(),
        volumes = volumes.len(),
        "corpus scanned"
    );
    Ok(CorpusScan {
        root: root.to_path_buf(),
        volumes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(path: &Path) {
        File::create(path).unwrap();
    }

    #[test]
    fn test_scan_corpus_layout() {
        let root = tempfile::tempdir().unwrap();
        let v1 = root.path().join("lni153");
        let v2 = root.path().join("lni169");
        fs::create_dir(&v1).unwrap();
        fs::create_dir(&v2).unwrap();

        touch(&v1.join("b.pdf"));
        touch(&v1.join("a.PDF"));
        touch(&v1.join("lni153-komplett.pdf"));
        touch(&v1.join("metadata-lni153.json"));
        touch(&v1.join("metadata-lni153.xlsx"));
        touch(&v1.join("notes.txt"));
        touch(&v2.join("c.pdf"));
        touch(&v2.join("metadata-lni169.xlsx"));
        touch(&root.path().join("stray.pdf"));

        let scan = scan_corpus(root.path()).unwrap();
        assert_eq!(scan.volumes.len(), 2);
        assert_eq!(scan.total_pdfs(), 3);
        assert_eq!(scan.with_metadata(), 2);
        assert_eq!(scan.without_metadata(), 0);

        let first = &scan.volumes[0];
        assert_eq!(first.name, "lni153");
        assert_eq!(first.year, Some(2009));
        assert_eq!(first.pdfs, vec![v1.join("a.PDF"), v1.join("b.pdf")]);
        assert_eq!(first.skipped, vec![v1.join("lni153-komplett.pdf")]);
        assert_eq!(
            first.metadata,
            Some(MetadataSource::Json(v1.join("metadata-lni153.json")))
        );

        assert_eq!(
            scan.volumes[1].metadata,
            Some(MetadataSource::Xlsx(v2.join("metadata-lni169.xlsx")))
        );
    }

    #[test]
    fn test_volume_without_metadata_or_known_year() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("workshops");
        fs::create_dir(&dir).unwrap();
        touch(&dir.join("x.pdf"));

        let volume = scan_volume(&dir).unwrap();
        assert_eq!(volume.year, None);
        assert!(volume.metadata.is_none());
        assert_eq!(volume.pdfs.len(), 1);
    }

    #[test]
    fn test_scan_missing_root() {
        let err = scan_corpus(Path::new("/nonexistent/delfi/corpus")).unwrap_err();
        assert!(matches!(err, IngestError::NotADirectory(_)));
    }

    #[test]
    fn test_is_full_proceedings() {
        assert!(is_full_proceedings(Path::new("/x/DeLFI2009-Komplett.pdf")));
        assert!(!is_full_proceedings(Path::new("/x/paper.pdf")));
    }
}
