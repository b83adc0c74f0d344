// 🏷️ Rule Engine - Rules as pluggable checks
// Per-record rules run as records stream in; global rules run once all files are read

use crate::checks;
use crate::config::AuditConfig;
use crate::context::AuditContext;
use crate::error::RuleError;
use crate::finding::{Finding, Severity};
use crate::record::CatalogueRecord;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};

// ============================================================================
// ENGINE-GENERATED RULE NAMES
// ============================================================================

/// Record could not be decoded
pub const MALFORMED_RECORD: &str = "malformed-record";

/// Input file could not be opened or read to the end
pub const FILE_UNREADABLE: &str = "file-unreadable";

/// A rule failed or panicked on one record
pub const RULE_INTERNAL_ERROR: &str = "rule-internal-error";

/// Source file of findings that belong to no single file
pub const GLOBAL_SOURCE: &str = "(global)";

const ENGINE_RULES: [&str; 3] = [FILE_UNREADABLE, MALFORMED_RECORD, RULE_INTERNAL_ERROR];

// ============================================================================
// RULE TRAITS
// ============================================================================

/// ValidationRule - a stateless check over one record
///
/// `check` must not mutate anything. Returning `Err` (or panicking) turns into a
/// single `rule-internal-error` finding for that record; the audit continues.
pub trait ValidationRule: Send + Sync {
    fn name(&self) -> &str;

    fn severity(&self) -> Severity;

    fn description(&self) -> &str;

    fn check(&self, record: &CatalogueRecord) -> Result<Vec<Finding>, RuleError>;
}

/// GlobalRule - a check over every record processed in the run
pub trait GlobalRule: Send + Sync {
    fn name(&self) -> &str;

    fn severity(&self) -> Severity;

    fn description(&self) -> &str;

    fn check(&self, ctx: &AuditContext) -> Result<Vec<Finding>, RuleError>;
}

/// Rule metadata as published in the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleInfo {
    pub name: String,
    pub severity: Severity,
    pub scope: RuleScope,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleScope {
    Record,
    Global,
}

// ============================================================================
// RULE ENGINE
// ============================================================================

pub struct RuleEngine {
    rules: Vec<Box<dyn ValidationRule>>,
    global_rules: Vec<Box<dyn GlobalRule>>,
}

impl RuleEngine {
    /// Create a new empty rule engine
    pub fn new() -> Self {
        RuleEngine {
            rules: Vec::new(),
            global_rules: Vec::new(),
        }
    }

    /// Engine with the built-in rule catalogue, in its standard order
    pub fn with_default_rules(config: &AuditConfig) -> Self {
        let mut engine = RuleEngine::new();
        for rule in checks::record_rules(config) {
            engine.rules.push(rule);
        }
        for rule in checks::global_rules() {
            engine.global_rules.push(rule);
        }
        engine
    }

    /// Register a per-record rule after the existing ones
    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    /// Register a global rule after the existing ones
    pub fn add_global_rule(&mut self, rule: Box<dyn GlobalRule>) {
        self.global_rules.push(rule);
    }

    /// Apply every per-record rule to one record
    pub fn evaluate(&self, record: &CatalogueRecord) -> Vec<Finding> {
        let mut findings = Vec::new();

        for rule in &self.rules {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.check(record)))
                .unwrap_or_else(|_| Err(RuleError::new("rule panicked")));

            match outcome {
                Ok(mut found) => findings.append(&mut found),
                Err(err) => findings.push(Finding::for_record(
                    RULE_INTERNAL_ERROR,
                    Severity::Error,
                    record.identifier(),
                    &record.provenance,
                    format!("Rule {} failed: {}", rule.name(), err),
                )),
            }
        }

        findings
    }

    /// Apply every global rule to the frozen context
    pub fn evaluate_global(&self, ctx: &AuditContext) -> Vec<Finding> {
        let mut findings = Vec::new();

        for rule in &self.global_rules {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.check(ctx)))
                .unwrap_or_else(|_| Err(RuleError::new("rule panicked")));

            match outcome {
                Ok(mut found) => findings.append(&mut found),
                Err(err) => findings.push(Finding::new(
                    RULE_INTERNAL_ERROR,
                    Severity::Error,
                    None,
                    GLOBAL_SOURCE,
                    0,
                    format!("Rule {} failed: {}", rule.name(), err),
                )),
            }
        }

        findings
    }

    /// Registration order of a rule name, used to order findings in a report
    ///
    /// Engine-generated names come first, then per-record rules, then global
    /// rules. Unknown names sort last.
    pub fn rule_rank(&self, name: &str) -> usize {
        ENGINE_RULES
            .iter()
            .copied()
            .chain(self.rules.iter().map(|r| r.name()))
            .chain(self.global_rules.iter().map(|r| r.name()))
            .position(|n| n == name)
            .unwrap_or(usize::MAX)
    }

    /// Metadata for every registered rule, in registration order
    pub fn rule_infos(&self) -> Vec<RuleInfo> {
        let record = self.rules.iter().map(|r| RuleInfo {
            name: r.name().to_string(),
            severity: r.severity(),
            scope: RuleScope::Record,
            description: r.description().to_string(),
        });
        let global = self.global_rules.iter().map(|r| RuleInfo {
            name: r.name().to_string(),
            severity: r.severity(),
            scope: RuleScope::Global,
            description: r.description().to_string(),
        });
        record.chain(global).collect()
    }

    /// Get number of rules loaded
    pub fn rule_count(&self) -> usize {
        self.rules.len() + self.global_rules.len()
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
