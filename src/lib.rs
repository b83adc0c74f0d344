// Catalogue Audit - Core Library
// Exposes all modules for use in the CLI and tests

pub mod record;       // Record model: leader, fields, provenance
pub mod parser;       // Record Parser - MARC 21 exchange format
pub mod fixed_fields; // 008 decoding
pub mod finding;      // Findings and severities
pub mod error;
pub mod config;
pub mod rules;        // Rule Engine - traits, registration, containment
pub mod checks;       // Built-in rule catalogue
pub mod context;      // Frozen record set for global rules
pub mod exclusions;   // Out-of-scope record categories
pub mod coverage;     // Field coverage statistics
pub mod aggregate;    // Report Aggregator
pub mod report;       // Report Writer
pub mod discovery;
pub mod audit;        // Driver

// Re-export commonly used types
pub use record::{CatalogueRecord, Field, FieldContent, Provenance, Subfield};
pub use parser::{
    decode_record, encode_record,
    MalformedRecord, MarcFormat, MarcReader, ParseError, ParseOutcome, RecordFormat,
};
pub use finding::{Finding, Location, Severity};
pub use error::{AuditError, RuleError};
pub use config::{AuditConfig, ReferenceField};
pub use rules::{
    GlobalRule, RuleEngine, RuleInfo, RuleScope, ValidationRule,
    FILE_UNREADABLE, GLOBAL_SOURCE, MALFORMED_RECORD, RULE_INTERNAL_ERROR,
};
pub use context::{AuditContext, ContextBuilder};
pub use exclusions::{ExclusionCategory, ExclusionClassifier, ExclusionReport};
pub use coverage::{CoverageCounts, CoverageTable};
pub use aggregate::{AuditReport, ReportAggregator, Summary};
pub use report::{ReportFormat, ReportWriter};
pub use discovery::discover_input_files;
pub use audit::{audit_folder, Auditor};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
