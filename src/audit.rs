// 🔁 Audit Driver - Parser → rules → aggregator → writer
// Files are read one after another; global rules run once the last file is done

use crate::aggregate::{AuditReport, ReportAggregator};
use crate::config::AuditConfig;
use crate::context::ContextBuilder;
use crate::coverage::CoverageTable;
use crate::discovery::discover_input_files;
use crate::error::AuditError;
use crate::exclusions::ExclusionClassifier;
use crate::finding::{Finding, Severity};
use crate::parser::{MarcFormat, ParseOutcome, RecordFormat};
use crate::record::CatalogueRecord;
use crate::report::ReportWriter;
use crate::rules::{RuleEngine, FILE_UNREADABLE, MALFORMED_RECORD};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Mutable state of one run, dropped once the report is built
struct RunState {
    aggregator: ReportAggregator,
    context: ContextBuilder,
    exclusions: ExclusionClassifier,
    coverage: CoverageTable,
}

pub struct Auditor {
    config: AuditConfig,
    engine: RuleEngine,
    format: Box<dyn RecordFormat>,
}

impl Auditor {
    /// Auditor reading MARC 21 exchange files
    pub fn new(config: AuditConfig, engine: RuleEngine) -> Self {
        Auditor {
            config,
            engine,
            format: Box::new(MarcFormat),
        }
    }

    /// Builder pattern: swap the record serialisation
    pub fn with_format(mut self, format: Box<dyn RecordFormat>) -> Self {
        self.format = format;
        self
    }

    /// Audit `files` in the given order and build the report
    pub fn run(&self, files: &[PathBuf]) -> Result<AuditReport, AuditError> {
        self.config.validate()?;
        info!(
            files = files.len(),
            rules = self.engine.rule_count(),
            format = self.format.name(),
            "starting audit"
        );

        let mut state = RunState {
            aggregator: ReportAggregator::new(),
            context: ContextBuilder::new(&self.config.reference_fields),
            exclusions: ExclusionClassifier::new(),
            coverage: CoverageTable::new(self.config.process_year),
        };

        for path in files {
            self.audit_file(path, &mut state);
        }

        // phase barrier: nothing below touches the builder again
        let ctx = state.context.freeze();
        debug!(records = ctx.record_count(), identifiers = ctx.identifiers().len(), "running global rules");
        state.aggregator.extend(self.engine.evaluate_global(&ctx));

        let report = state.aggregator.finish(
            &self.engine,
            state.exclusions.report(),
            state.coverage,
        );
        info!(
            records = report.summary.records_processed,
            malformed = report.summary.malformed_records,
            findings = report.summary.total_findings,
            excluded = report.exclusions.total,
            "audit complete"
        );
        Ok(report)
    }

    fn audit_file(&self, path: &Path, state: &mut RunState) {
        let source_file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        state.aggregator.file_processed(&source_file);

        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) => {
                warn!(file = %source_file, error = %err, "cannot open input file");
                state.aggregator.add(Finding::new(
                    FILE_UNREADABLE,
                    Severity::Error,
                    None,
                    &source_file,
                    0,
                    format!("file could not be opened: {}", err),
                ));
                return;
            }
        };
        debug!(file = %source_file, "reading");

        let mut seen = 0usize;
        for outcome in self.format.records(Box::new(BufReader::new(file)), &source_file) {
            match outcome {
                Ok(ParseOutcome::Record(record)) => {
                    seen += 1;
                    self.audit_record(&record, state);
                }
                Ok(ParseOutcome::Malformed(bad)) => {
                    seen += 1;
                    debug!(
                        file = %source_file,
                        offset = bad.provenance.record_offset,
                        reason = %bad.reason,
                        "malformed record"
                    );
                    state.aggregator.record_malformed();
                    state.aggregator.add(Finding::for_record(
                        MALFORMED_RECORD,
                        Severity::Error,
                        None,
                        &bad.provenance,
                        format!("Malformed record: {} [{}]", bad.reason, bad.raw.trim()),
                    ));
                }
                Err(err) => {
                    warn!(file = %source_file, records = seen, error = %err, "input file read failed");
                    state.aggregator.add(Finding::new(
                        FILE_UNREADABLE,
                        Severity::Error,
                        None,
                        &source_file,
                        seen + 1,
                        format!("file unreadable after {} records: {}", seen, err),
                    ));
                    break;
                }
            }
        }

        debug!(file = %source_file, records = seen, "finished");
    }

    fn audit_record(&self, record: &CatalogueRecord, state: &mut RunState) {
        state.aggregator.record_processed();
        state.aggregator.extend(self.engine.evaluate(record));
        state.context.add_record(record);

        if let Some(id) = record.identifier() {
            if !state.exclusions.observe(id, record) {
                state.coverage.add_record(record);
            }
        }
    }
}

/// Discover, audit and write the report for one input folder
///
/// Returns the path of the written report.
pub fn audit_folder(input: &Path, output: &Path, config: &AuditConfig) -> Result<PathBuf, AuditError> {
    config.validate()?;
    let files = discover_input_files(input)?;
    if files.is_empty() {
        info!(folder = %input.display(), "no full<N>.lex files found");
    }

    fs::create_dir_all(output).map_err(|source| AuditError::OutputFolder {
        path: output.to_path_buf(),
        source,
    })?;

    let engine = RuleEngine::with_default_rules(config);
    let report = Auditor::new(config.clone(), engine).run(&files)?;

    let destination = output.join(config.report_format.file_name());
    ReportWriter::new(config.report_format)
        .write(&report, &destination)
        .map_err(|source| AuditError::OutputFolder {
            path: output.to_path_buf(),
            source,
        })?;

    Ok(destination)
}

// ============================================================================
// TESTS
// ============================================================================
