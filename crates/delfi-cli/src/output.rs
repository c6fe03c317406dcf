use std::io::Write;

use delfi_core::{Extracted, PartialPaper, SegmentationResult};
use delfi_ingest::CorpusScan;
use delfi_segment::StartRule;
use delfi_store::SentinelCounts;
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Counters of an `ingest` run.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub processed: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub partial: usize,
    pub corrupted: usize,
    pub no_references: usize,
    pub failed: usize,
    pub cancelled: bool,
}

fn heading(w: &mut dyn Write, text: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", text.bold().cyan())
    } else {
        writeln!(w, "{}", text)
    }
}

fn region(w: &mut dyn Write, label: &str, value: &Extracted, color: ColorMode) -> std::io::Result<()> {
    heading(w, label, color)?;
    match value {
        Extracted::Text(t) => writeln!(w, "{}", t)?,
        sentinel if color.enabled() => writeln!(w, "{}", sentinel.as_str().yellow())?,
        sentinel => writeln!(w, "{}", sentinel.as_str())?,
    }
    writeln!(w)
}

/// Print the segmentation of one document.
pub fn print_segmentation(
    w: &mut dyn Write,
    name: &str,
    result: &SegmentationResult,
    start_rule: Option<StartRule>,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w, "Segmenting {}...", name)?;
    let rule = start_rule.map(|r| r.name()).unwrap_or("none (document start)");
    if color.enabled() {
        writeln!(w, "{}", format!("Start rule: {}", rule).dimmed())?;
    } else {
        writeln!(w, "Start rule: {}", rule)?;
    }
    writeln!(w)?;
    region(w, "== Main content ==", &result.text, color)?;
    region(w, "== References ==", &result.references, color)
}

/// Print the result of the metadata-free path.
pub fn print_partial(w: &mut dyn Write, paper: &PartialPaper, color: ColorMode) -> std::io::Result<()> {
    let year = paper
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "unknown".into());
    writeln!(w, "File: {}  Year: {}", paper.filename, year)?;
    writeln!(w)?;
    heading(w, "== Abstract ==", color)?;
    writeln!(w, "{}", paper.abstract_text.as_deref().unwrap_or("(none)"))?;
    writeln!(w)?;
    region(w, "== Main content ==", &paper.segmentation.text, color)?;
    region(w, "== References ==", &paper.segmentation.references, color)
}

pub fn print_scan(w: &mut dyn Write, scan: &CorpusScan, color: ColorMode) -> std::io::Result<()> {
    writeln!(w, "Scanning {}", scan.root.display())?;
    writeln!(w, "Proceedings folders: {}", scan.volumes.len())?;
    writeln!(w)?;

    for (idx, volume) in scan.volumes.iter().enumerate() {
        let year = volume
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "????".into());
        writeln!(
            w,
            "[{}/{}] {} ({})",
            idx + 1,
            scan.volumes.len(),
            volume.name,
            year
        )?;
        writeln!(w, "    PDFs: {}", volume.pdfs.len())?;
        if !volume.skipped.is_empty() {
            writeln!(w, "    Skipped full proceedings: {}", volume.skipped.len())?;
        }
        let meta = match &volume.metadata {
            Some(source) => source
                .path()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            None => String::new(),
        };
        match (meta.is_empty(), color.enabled()) {
            (false, true) => writeln!(w, "    Metadata: {}", meta.green())?,
            (false, false) => writeln!(w, "    Metadata: {}", meta)?,
            (true, true) => writeln!(w, "    Metadata: {}", "missing".red())?,
            (true, false) => writeln!(w, "    Metadata: missing")?,
        }
    }

    writeln!(w)?;
    heading(w, "----- Result -----", color)?;
    writeln!(w, "Folders scanned:          {}", scan.volumes.len())?;
    writeln!(w, "PDF files:                {}", scan.total_pdfs())?;
    writeln!(w, "Folders with metadata:    {}", scan.with_metadata())?;
    writeln!(w, "Folders without metadata: {}", scan.without_metadata())?;
    Ok(())
}

pub fn print_ingest_report(
    w: &mut dyn Write,
    report: &IngestReport,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    heading(w, "----- Ingest -----", color)?;
    if report.cancelled {
        if color.enabled() {
            writeln!(w, "{}", "Cancelled: partial results were stored".yellow())?;
        } else {
            writeln!(w, "Cancelled: partial results were stored")?;
        }
    }
    writeln!(w, "Processed:            {}", report.processed)?;
    writeln!(w, "Inserted:             {}", report.inserted)?;
    writeln!(w, "Duplicates skipped:   {}", report.duplicates)?;
    writeln!(w, "Without metadata:     {}", report.partial)?;
    writeln!(w, "Corrupted text:       {}", report.corrupted)?;
    writeln!(w, "No references found:  {}", report.no_references)?;
    if report.failed > 0 && color.enabled() {
        writeln!(w, "Failed:               {}", report.failed.red())?;
    } else {
        writeln!(w, "Failed:               {}", report.failed)?;
    }
    Ok(())
}

pub fn print_stats(
    w: &mut dyn Write,
    total: i64,
    per_year: &[(u16, i64)],
    sentinels: SentinelCounts,
    color: ColorMode,
) -> std::io::Result<()> {
    heading(w, "Papers per year", color)?;
    for (year, count) in per_year {
        writeln!(w, "  {}: {}", year, count)?;
    }
    writeln!(w, "Total: {}", total)?;
    writeln!(w)?;
    heading(w, "Flagged for manual review", color)?;
    writeln!(w, "  Corrupted text:      {}", sentinels.corrupted)?;
    writeln!(w, "  No references found: {}", sentinels.no_references)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_printed_verbatim() {
        let mut buf = Vec::new();
        print_segmentation(
            &mut buf,
            "p1.pdf",
            &SegmentationResult::corrupted(),
            None,
            ColorMode(false),
        )
        .unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("Corrupted text"));
        assert!(out.contains("No references found"));
        assert!(out.contains("none (document start)"));
    }

    #[test]
    fn stats_layout() {
        let mut buf = Vec::new();
        print_stats(
            &mut buf,
            3,
            &[(2009, 2), (2010, 1)],
            SentinelCounts {
                corrupted: 1,
                no_references: 0,
            },
            ColorMode(false),
        )
        .unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("  2009: 2"));
        assert!(out.contains("Total: 3"));
        assert!(out.contains("Corrupted text:      1"));
    }
}
