// 📝 Report Writer - JSON or TSV, published atomically
// The report is rendered in memory, written to a temp file beside the destination, then renamed

use crate::aggregate::AuditReport;
use crate::coverage::COUNTER_LABELS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

const REPORT_STEM: &str = "catalogue-audit-report";

// ============================================================================
// FORMAT
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Tsv,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Tsv => "tsv",
        }
    }

    /// `catalogue-audit-report.<ext>`
    pub fn file_name(&self) -> String {
        format!("{}.{}", REPORT_STEM, self.extension())
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "tsv" => Ok(ReportFormat::Tsv),
            other => Err(format!("unknown report format: {}", other)),
        }
    }
}

// ============================================================================
// WRITER
// ============================================================================

pub struct ReportWriter {
    format: ReportFormat,
}

impl ReportWriter {
    pub fn new(format: ReportFormat) -> Self {
        ReportWriter { format }
    }

    /// Serialize the whole report into memory
    pub fn render(&self, report: &AuditReport) -> io::Result<Vec<u8>> {
        match self.format {
            ReportFormat::Json => render_json(report),
            ReportFormat::Tsv => render_tsv(report),
        }
    }

    /// Write the report to `destination`, all or nothing
    pub fn write(&self, report: &AuditReport, destination: &Path) -> io::Result<()> {
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let bytes = self.render(report)?;
        let temp_path = temp_path_for(destination);
        debug!(path = %temp_path.display(), bytes = bytes.len(), "writing report to temp file");

        let published = write_synced(&temp_path, &bytes)
            .and_then(|_| fs::rename(&temp_path, destination));

        if let Err(err) = published {
            warn!(path = %destination.display(), error = %err, "report write failed");
            // the temp file may not exist if creating it was what failed
            let _ = fs::remove_file(&temp_path);
            return Err(err);
        }

        info!(
            path = %destination.display(),
            format = %self.format,
            findings = report.summary.total_findings,
            "report written"
        );
        Ok(())
    }
}

fn temp_path_for(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    destination.with_file_name(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()
}

// ============================================================================
// RENDERING
// ============================================================================

fn render_json(report: &AuditReport) -> io::Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(report)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Sections are introduced by a `[name]` row followed by a header row
fn render_tsv(report: &AuditReport) -> io::Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_writer(Vec::new());

    let summary = &report.summary;
    let mut rows: Vec<(String, String)> = vec![
        ("files_processed".to_string(), summary.files_processed.to_string()),
        ("records_processed".to_string(), summary.records_processed.to_string()),
        ("malformed_records".to_string(), summary.malformed_records.to_string()),
        ("total_findings".to_string(), summary.total_findings.to_string()),
    ];
    for (severity, count) in &summary.by_severity {
        rows.push((format!("severity:{}", severity), count.to_string()));
    }
    for (rule, count) in &summary.by_rule {
        rows.push((format!("rule:{}", rule), count.to_string()));
    }
    for (file, count) in &summary.by_file {
        rows.push((format!("file:{}", file), count.to_string()));
    }

    wtr.write_record(["[summary]"])?;
    wtr.write_record(["key", "value"])?;
    for (key, value) in &rows {
        wtr.write_record([key, value])?;
    }

    wtr.write_record(["[findings]"])?;
    wtr.write_record([
        "source_file",
        "record_offset",
        "record_id",
        "rule",
        "severity",
        "message",
        "related",
        "fingerprint",
    ])?;
    for f in &report.findings {
        let related = f
            .related
            .iter()
            .map(|l| format!("{}#{}", l.source_file, l.record_offset))
            .collect::<Vec<_>>()
            .join(" ");
        let offset = f.record_offset.to_string();
        wtr.write_record([
            f.source_file.as_str(),
            offset.as_str(),
            f.record_id.as_deref().unwrap_or(""),
            f.rule.as_str(),
            f.severity.as_str(),
            f.message.as_str(),
            related.as_str(),
            f.fingerprint.as_str(),
        ])?;
    }

    wtr.write_record(["[exclusions]"])?;
    wtr.write_record(["category", "label", "count", "identifiers", "description"])?;
    for category in &report.exclusions.categories {
        let key = serde_json::to_value(category.category)?;
        let count = category.count.to_string();
        let identifiers = category.identifiers.join(" ");
        wtr.write_record([
            key.as_str().unwrap_or_default(),
            category.label.as_str(),
            count.as_str(),
            identifiers.as_str(),
            category.description.as_str(),
        ])?;
    }
    let total = report.exclusions.total.to_string();
    wtr.write_record(["total", "", total.as_str(), "", ""])?;

    wtr.write_record(["[coverage]"])?;
    let mut header = vec!["row", "format"];
    header.extend(COUNTER_LABELS);
    wtr.write_record(&header)?;
    for (row, cells) in &report.coverage.rows {
        for (format, counts) in cells {
            let mut record = vec![row.clone(), format.clone()];
            record.extend(counts.values().iter().map(u64::to_string));
            wtr.write_record(&record)?;
        }
    }

    wtr.flush()?;
    wtr.into_inner().map_err(|e| e.into_error())
}

// ============================================================================
// TESTS
// ============================================================================
