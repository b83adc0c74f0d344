// 🧮 Report Aggregator - Findings in arrival order, counts on demand
// Nothing is dropped or merged; ordering is applied once, when the report is built

use crate::coverage::CoverageTable;
use crate::exclusions::ExclusionReport;
use crate::finding::{Finding, Severity};
use crate::rules::{RuleEngine, RuleInfo};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub files_processed: usize,
    pub records_processed: usize,
    pub malformed_records: usize,
    pub total_findings: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_rule: BTreeMap<String, usize>,
    pub by_file: BTreeMap<String, usize>,
}

/// Everything one run produced, ready to be written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub summary: Summary,
    pub rules: Vec<RuleInfo>,
    pub findings: Vec<Finding>,
    pub exclusions: ExclusionReport,
    pub coverage: CoverageTable,
}

impl AuditReport {
    pub fn findings_for_rule<'a>(&'a self, rule: &'a str) -> impl Iterator<Item = &'a Finding> + 'a {
        self.findings.iter().filter(move |f| f.rule == rule)
    }
}

// ============================================================================
// AGGREGATOR
// ============================================================================

#[derive(Debug, Default)]
pub struct ReportAggregator {
    findings: Vec<Finding>,
    files: Vec<String>,
    records_processed: usize,
    malformed_records: usize,
}

impl ReportAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        for finding in findings {
            self.add(finding);
        }
    }

    /// A record was decoded and run through the per-record rules
    pub fn record_processed(&mut self) {
        self.records_processed += 1;
    }

    /// A record could not be decoded
    pub fn record_malformed(&mut self) {
        self.malformed_records += 1;
    }

    /// A file was visited, readable or not; also fixes its place in the report
    pub fn file_processed(&mut self, source_file: &str) {
        self.files.push(source_file.to_string());
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Counts recomputed from the stored findings on every call
    pub fn summarize(&self) -> Summary {
        let mut by_severity: BTreeMap<Severity, usize> =
            Severity::ALL.iter().map(|s| (*s, 0)).collect();
        let mut by_rule: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_file: BTreeMap<String, usize> = BTreeMap::new();

        for finding in &self.findings {
            *by_severity.entry(finding.severity).or_insert(0) += 1;
            *by_rule.entry(finding.rule.clone()).or_insert(0) += 1;
            *by_file.entry(finding.source_file.clone()).or_insert(0) += 1;
        }

        Summary {
            files_processed: self.files.len(),
            records_processed: self.records_processed,
            malformed_records: self.malformed_records,
            total_findings: self.findings.len(),
            by_severity,
            by_rule,
            by_file,
        }
    }

    /// Build the report: files in processing order, then record offset, then
    /// rule registration order, then arrival order
    pub fn finish(
        self,
        engine: &RuleEngine,
        exclusions: ExclusionReport,
        coverage: CoverageTable,
    ) -> AuditReport {
        let summary = self.summarize();
        let file_rank = |name: &str| {
            self.files
                .iter()
                .position(|f| f == name)
                .unwrap_or(usize::MAX)
        };

        let mut findings = self.findings.clone();
        findings.sort_by_cached_key(|f| {
            (
                file_rank(&f.source_file),
                f.record_offset,
                engine.rule_rank(&f.rule),
            )
        });

        AuditReport {
            summary,
            rules: engine.rule_infos(),
            findings,
            exclusions,
            coverage,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
