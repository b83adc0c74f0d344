// ⚙️ Audit Configuration - Defaults in code, overrides from JSON
// Everything that parameterises the rule catalogue lives here

use crate::error::AuditError;
use crate::report::ReportFormat;
use anyhow::{Context, Result};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Linking fields whose subfield holds another record's identifier
const DEFAULT_REFERENCE_FIELDS: [(&str, char); 16] = [
    ("LKR", 'b'),
    ("760", 'w'),
    ("762", 'w'),
    ("765", 'w'),
    ("767", 'w'),
    ("770", 'w'),
    ("772", 'w'),
    ("773", 'w'),
    ("774", 'w'),
    ("775", 'w'),
    ("776", 'w'),
    ("777", 'w'),
    ("780", 'w'),
    ("785", 'w'),
    ("786", 'w'),
    ("787", 'w'),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceField {
    pub tag: String,
    pub code: char,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Tags every record must carry (001 is checked separately)
    pub required_fields: Vec<String>,

    /// Where cross-references to other records are found
    pub reference_fields: Vec<ReferenceField>,

    /// Publication years after this are reported
    pub latest_publication_year: i32,

    /// Publication years before this are reported
    pub earliest_publication_year: i32,

    /// Year whose records get the "Process year" coverage rows
    pub process_year: i32,

    pub report_format: ReportFormat,
}

impl Default for AuditConfig {
    fn default() -> Self {
        let this_year = chrono::Local::now().year();
        AuditConfig {
            required_fields: vec!["008".to_string(), "245".to_string()],
            reference_fields: DEFAULT_REFERENCE_FIELDS
                .iter()
                .map(|(tag, code)| ReferenceField {
                    tag: tag.to_string(),
                    code: *code,
                })
                .collect(),
            latest_publication_year: this_year,
            earliest_publication_year: 1000,
            process_year: this_year - 1,
            report_format: ReportFormat::Json,
        }
    }
}

impl AuditConfig {
    /// Load configuration from a JSON file; missing keys keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: AuditConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AuditError> {
        let tags = self
            .required_fields
            .iter()
            .chain(self.reference_fields.iter().map(|r| &r.tag));
        for tag in tags {
            if tag.chars().count() != 3 {
                return Err(AuditError::Config(format!(
                    "field tag must be 3 characters: {:?}",
                    tag
                )));
            }
        }

        if self.earliest_publication_year > self.latest_publication_year {
            return Err(AuditError::Config(format!(
                "earliest_publication_year {} is after latest_publication_year {}",
                self.earliest_publication_year, self.latest_publication_year
            )));
        }

        Ok(())
    }

    /// Builder pattern: pin the years so runs do not depend on the clock
    pub fn with_years(mut self, latest_publication_year: i32, process_year: i32) -> Self {
        self.latest_publication_year = latest_publication_year;
        self.process_year = process_year;
        self
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.report_format = format;
        self
    }
}

// ============================================================================
// TESTS
// ============================================================================
