// ✅ Built-in Checks - The standard rule catalogue
// Structural completeness, leader values, 008 sanity, identifier uniqueness,
// cross-reference integrity

use crate::config::AuditConfig;
use crate::context::AuditContext;
use crate::error::RuleError;
use crate::finding::{Finding, Location, Severity};
use crate::fixed_fields::{FixedFields, PublicationYear};
use crate::record::CatalogueRecord;
use crate::rules::{GlobalRule, ValidationRule};

/// Allowed values per checked leader position
const LEADER_VALIDATION: [(usize, &str); 8] = [
    (5, "acdnp"),
    (6, "acdefgijkmoprt"),
    (7, "abcdims"),
    (8, " a"),
    (9, " a"),
    (17, " 12345678uz"),
    (18, " acinu"),
    (19, " abc"),
];

/// Per-record rules in registration order
pub fn record_rules(config: &AuditConfig) -> Vec<Box<dyn ValidationRule>> {
    vec![
        Box::new(RecordIdentifierRule),
        Box::new(RequiredFieldsRule::new(config.required_fields.clone())),
        Box::new(LeaderValuesRule),
        Box::new(PublicationYearRule::new(
            config.earliest_publication_year,
            config.latest_publication_year,
        )),
        Box::new(FixedFieldCodesRule),
    ]
}

/// Global rules in registration order
pub fn global_rules() -> Vec<Box<dyn GlobalRule>> {
    vec![Box::new(DuplicateIdentifierRule), Box::new(DanglingReferenceRule)]
}

// ============================================================================
// RECORD IDENTIFIER
// ============================================================================

pub struct RecordIdentifierRule;

impl ValidationRule for RecordIdentifierRule {
    fn name(&self) -> &str {
        "record-identifier"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &str {
        "Record carries a non-empty 001 identifier"
    }

    fn check(&self, record: &CatalogueRecord) -> Result<Vec<Finding>, RuleError> {
        if record.identifier().is_some() {
            return Ok(Vec::new());
        }
        Ok(vec![Finding::for_record(
            self.name(),
            self.severity(),
            None,
            &record.provenance,
            format!(
                "Record without ID at position {} in file {}",
                record.provenance.record_offset, record.provenance.source_file
            ),
        )])
    }
}

// ============================================================================
// REQUIRED FIELDS
// ============================================================================

pub struct RequiredFieldsRule {
    required: Vec<String>,
}

impl RequiredFieldsRule {
    pub fn new(required: Vec<String>) -> Self {
        RequiredFieldsRule { required }
    }
}

impl ValidationRule for RequiredFieldsRule {
    fn name(&self) -> &str {
        "required-fields"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn description(&self) -> &str {
        "Record carries every configured required field"
    }

    fn check(&self, record: &CatalogueRecord) -> Result<Vec<Finding>, RuleError> {
        Ok(self
            .required
            .iter()
            .filter(|tag| !record.has_field(tag))
            .map(|tag| {
                Finding::for_record(
                    self.name(),
                    self.severity(),
                    record.identifier(),
                    &record.provenance,
                    format!("Missing required field {}", tag),
                )
            })
            .collect())
    }
}

// ============================================================================
// LEADER VALUES
// ============================================================================

pub struct LeaderValuesRule;

impl ValidationRule for LeaderValuesRule {
    fn name(&self) -> &str {
        "leader-values"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn description(&self) -> &str {
        "Leader positions 5-9 and 17-19 hold MARC 21 values"
    }

    fn check(&self, record: &CatalogueRecord) -> Result<Vec<Finding>, RuleError> {
        let mut findings = Vec::new();
        for (position, allowed) in LEADER_VALIDATION {
            let Some(value) = record.leader_byte(position) else {
                continue;
            };
            if !allowed.contains(value) {
                findings.push(Finding::for_record(
                    self.name(),
                    self.severity(),
                    record.identifier(),
                    &record.provenance,
                    format!("Invalid LDR position {}: {:?}", position, value),
                ));
            }
        }
        Ok(findings)
    }
}

// ============================================================================
// PUBLICATION YEAR
// ============================================================================

pub struct PublicationYearRule {
    earliest: i32,
    latest: i32,
}

impl PublicationYearRule {
    pub fn new(earliest: i32, latest: i32) -> Self {
        PublicationYearRule { earliest, latest }
    }
}

impl ValidationRule for PublicationYearRule {
    fn name(&self) -> &str {
        "publication-year"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn description(&self) -> &str {
        "008/07-10 year of publication lies in a plausible range"
    }

    fn check(&self, record: &CatalogueRecord) -> Result<Vec<Finding>, RuleError> {
        let Some(ff) = FixedFields::from_record(record) else {
            return Ok(Vec::new());
        };
        let PublicationYear::Year(year) = ff.publication_year else {
            return Ok(Vec::new());
        };

        let message = if year > self.latest {
            format!("Strange year of publication: {}", year)
        } else if year < self.earliest {
            format!("Strangely early year of publication: {}", year)
        } else {
            return Ok(Vec::new());
        };

        Ok(vec![Finding::for_record(
            self.name(),
            self.severity(),
            record.identifier(),
            &record.provenance,
            message,
        )])
    }
}

// ============================================================================
// FIXED FIELD CODES
// ============================================================================

pub struct FixedFieldCodesRule;

impl ValidationRule for FixedFieldCodesRule {
    fn name(&self) -> &str {
        "fixed-field-codes"
    }

    fn severity(&self) -> Severity {
        Severity::Info
    }

    fn description(&self) -> &str {
        "008 date entered, country and language codes are usable"
    }

    fn check(&self, record: &CatalogueRecord) -> Result<Vec<Finding>, RuleError> {
        let Some(ff) = FixedFields::from_record(record) else {
            return Ok(Vec::new());
        };

        let mut problems = Vec::new();
        if ff.date_entered.is_none() {
            problems.push(format!(
                "No date entered on file (008/00-05 {:?})",
                ff.date_entered_raw
            ));
        }
        if !ff.has_valid_country() {
            problems.push("No place of publication code in 008/15-17".to_string());
        }
        if !ff.has_valid_language() {
            problems.push("No language code in 008/35-37".to_string());
        }

        Ok(problems
            .into_iter()
            .map(|message| {
                Finding::for_record(
                    self.name(),
                    self.severity(),
                    record.identifier(),
                    &record.provenance,
                    message,
                )
            })
            .collect())
    }
}

// ============================================================================
// DUPLICATE IDENTIFIER (global)
// ============================================================================

pub struct DuplicateIdentifierRule;

impl GlobalRule for DuplicateIdentifierRule {
    fn name(&self) -> &str {
        "duplicate-identifier"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &str {
        "Each identifier occurs once across all input files"
    }

    fn check(&self, ctx: &AuditContext) -> Result<Vec<Finding>, RuleError> {
        let mut findings = Vec::new();

        for (id, locations) in ctx.identifiers() {
            let Some((first, others)) = locations.split_first() else {
                continue;
            };
            if others.is_empty() {
                continue;
            }

            let mut files: Vec<&str> = locations.iter().map(|l| l.source_file.as_str()).collect();
            files.dedup();

            findings.push(
                Finding::new(
                    self.name(),
                    self.severity(),
                    Some(id.as_str()),
                    &first.source_file,
                    first.record_offset,
                    format!(
                        "Identifier {} occurs {} times ({})",
                        id,
                        locations.len(),
                        files.join(", ")
                    ),
                )
                .with_related(others.iter().cloned().collect::<Vec<Location>>()),
            );
        }

        Ok(findings)
    }
}

// ============================================================================
// DANGLING REFERENCE (global)
// ============================================================================

pub struct DanglingReferenceRule;

impl GlobalRule for DanglingReferenceRule {
    fn name(&self) -> &str {
        "dangling-reference"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn description(&self) -> &str {
        "Linked record identifiers exist in the processed set"
    }

    fn check(&self, ctx: &AuditContext) -> Result<Vec<Finding>, RuleError> {
        let mut findings = Vec::new();

        for entry in ctx.records() {
            for target in &entry.references {
                if ctx.contains(target) {
                    continue;
                }
                findings.push(Finding::new(
                    self.name(),
                    self.severity(),
                    entry.identifier.as_deref(),
                    &entry.location.source_file,
                    entry.location.record_offset,
                    format!("Reference to unknown record {}", target),
                ));
            }
        }

        Ok(findings)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReferenceField;
    use crate::context::ContextBuilder;
    use crate::record::{Field, Provenance, Subfield};

    const GOOD_LEADER: &str = "00000nam a2200000 a 4500";
    const GOOD_008: &str = "040715s2003    enk           000 0 eng d";

    fn record(id: Option<&str>, file: &str, offset: usize) -> CatalogueRecord {
        let mut r = CatalogueRecord::new(GOOD_LEADER, Provenance::new(file, offset, 0));
        if let Some(id) = id {
            r = r.with_field(Field::control("001", id));
        }
        r.with_field(Field::control("008", GOOD_008)).with_field(Field::data(
            "245",
            ['1', '0'],
            vec![Subfield { code: 'a', value: "Title".to_string() }],
        ))
    }

    fn run_all(r: &CatalogueRecord) -> Vec<Finding> {
        record_rules(&AuditConfig::default().with_years(2020, 2019))
            .iter()
            .flat_map(|rule| rule.check(r).unwrap())
            .collect()
    }

    #[test]
    fn test_well_formed_record_is_clean() {
        assert!(run_all(&record(Some("A"), "full1.lex", 1)).is_empty());
    }

    #[test]
    fn test_missing_identifier() {
        let findings = RecordIdentifierRule.check(&record(None, "full3.lex", 7)).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "Record without ID at position 7 in file full3.lex");
        assert_eq!(findings[0].record_id, None);
    }

    #[test]
    fn test_missing_required_fields() {
        let r = CatalogueRecord::new(GOOD_LEADER, Provenance::new("full1.lex", 1, 0))
            .with_field(Field::control("001", "A"));
        let rule = RequiredFieldsRule::new(vec!["008".to_string(), "245".to_string()]);
        let findings = rule.check(&r).unwrap();

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].message, "Missing required field 008");
        assert_eq!(findings[1].message, "Missing required field 245");
    }

    #[test]
    fn test_invalid_leader_positions() {
        let mut r = record(Some("A"), "full1.lex", 1);
        r.leader = "00000xam a2200000 q 4500".to_string();
        let findings = LeaderValuesRule.check(&r).unwrap();

        assert_eq!(findings.len(), 2);
        assert!(findings[0].message.contains("position 5"));
        assert!(findings[1].message.contains("position 18"));
    }

    #[test]
    fn test_publication_year_range() {
        let rule = PublicationYearRule::new(1000, 2020);

        let mut r = record(Some("A"), "full1.lex", 1);
        r.fields[1] = Field::control("008", "040715s2099    enk           000 0 eng d");
        let findings = rule.check(&r).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("2099"));

        r.fields[1] = Field::control("008", "040715s0999    enk           000 0 eng d");
        assert!(rule.check(&r).unwrap()[0].message.contains("early"));

        r.fields[1] = Field::control("008", "040715s19uu    enk           000 0 eng d");
        assert!(rule.check(&r).unwrap().is_empty());
    }

    #[test]
    fn test_fixed_field_codes() {
        let mut r = record(Some("A"), "full1.lex", 1);
        r.fields[1] = Field::control("008", "      s2003");
        let findings = FixedFieldCodesRule.check(&r).unwrap();

        assert_eq!(findings.len(), 3);
        assert!(findings.iter().all(|f| f.severity == Severity::Info));
    }

    fn context(records: &[CatalogueRecord]) -> AuditContext {
        let mut builder = ContextBuilder::new(&[ReferenceField { tag: "773".to_string(), code: 'w' }]);
        for r in records {
            builder.add_record(r);
        }
        builder.freeze()
    }

    #[test]
    fn test_duplicate_identifier_one_finding_per_group() {
        let ctx = context(&[
            record(Some("A"), "full1.lex", 1),
            record(Some("B"), "full1.lex", 2),
            record(Some("C"), "full1.lex", 3),
            record(Some("C"), "full2.lex", 1),
            record(Some("D"), "full2.lex", 2),
            record(Some("C"), "full2.lex", 3),
        ]);

        let findings = DuplicateIdentifierRule.check(&ctx).unwrap();
        assert_eq!(findings.len(), 1);

        let f = &findings[0];
        assert_eq!(f.record_id.as_deref(), Some("C"));
        assert_eq!(f.source_file, "full1.lex");
        assert_eq!(f.record_offset, 3);
        assert_eq!(f.related.len(), 2);
        assert!(f.message.contains("full1.lex, full2.lex"));
    }

    #[test]
    fn test_dangling_reference() {
        let linked = record(Some("B"), "full1.lex", 2).with_field(Field::data(
            "773",
            ['0', ' '],
            vec![
                Subfield { code: 'w', value: "(Uk)A".to_string() },
                Subfield { code: 'w', value: "Z".to_string() },
            ],
        ));
        let ctx = context(&[record(Some("A"), "full1.lex", 1), linked]);

        let findings = DanglingReferenceRule.check(&ctx).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].record_id.as_deref(), Some("B"));
        assert_eq!(findings[0].message, "Reference to unknown record Z");
    }
}
