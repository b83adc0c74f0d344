// 🔎 Findings - One reported issue per rule/record
// Immutable once built; fingerprinted for cross-run comparison

use crate::record::Provenance;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

// ============================================================================
// SEVERITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,    // Worth knowing, nothing is broken
    Warning, // Questionable or incomplete data
    Error,   // Invalid record or unusable input
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Error, Severity::Warning, Severity::Info];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// FINDING
// ============================================================================

/// Additional place a finding refers to (e.g. other copies of a duplicate id)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub source_file: String,
    pub record_offset: usize,
}

impl From<&Provenance> for Location {
    fn from(p: &Provenance) -> Self {
        Location {
            source_file: p.source_file.clone(),
            record_offset: p.record_offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub record_id: Option<String>,
    pub source_file: String,
    pub record_offset: usize,
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<Location>,
    pub fingerprint: String,
}

impl Finding {
    pub fn new(
        rule: &str,
        severity: Severity,
        record_id: Option<&str>,
        source_file: &str,
        record_offset: usize,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        let fingerprint = compute_fingerprint(rule, record_id, source_file, record_offset, &message);
        Finding {
            record_id: record_id.map(str::to_string),
            source_file: source_file.to_string(),
            record_offset,
            rule: rule.to_string(),
            severity,
            message,
            related: Vec::new(),
            fingerprint,
        }
    }

    /// Finding anchored at a record's provenance
    pub fn for_record(
        rule: &str,
        severity: Severity,
        record_id: Option<&str>,
        provenance: &Provenance,
        message: impl Into<String>,
    ) -> Self {
        Finding::new(
            rule,
            severity,
            record_id,
            &provenance.source_file,
            provenance.record_offset,
            message,
        )
    }

    /// Builder pattern: attach related locations
    pub fn with_related(mut self, related: Vec<Location>) -> Self {
        self.related = related;
        self
    }

    pub fn location(&self) -> String {
        format!("{}#{}", self.source_file, self.record_offset)
    }
}

/// SHA-256 over the identifying parts of a finding
///
/// Same input twice gives the same fingerprint, so reports can be diffed run to run.
pub fn compute_fingerprint(
    rule: &str,
    record_id: Option<&str>,
    source_file: &str,
    record_offset: usize,
    message: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!(
        "{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}",
        rule,
        record_id.unwrap_or(""),
        source_file,
        record_offset,
        message
    ));
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// TESTS
// ============================================================================
