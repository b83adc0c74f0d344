// 🗂️ Audit Context - What the global rules are allowed to see
// Built record by record during the per-record phase, then frozen

use crate::config::ReferenceField;
use crate::finding::Location;
use crate::record::CatalogueRecord;
use std::collections::BTreeMap;

/// Identity and outgoing references of one processed record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    pub identifier: Option<String>,
    pub location: Location,
    pub references: Vec<String>,
}

// ============================================================================
// CONTEXT BUILDER (per-record phase)
// ============================================================================

pub struct ContextBuilder {
    reference_fields: Vec<ReferenceField>,
    entries: Vec<RecordEntry>,
}

impl ContextBuilder {
    pub fn new(reference_fields: &[ReferenceField]) -> Self {
        ContextBuilder {
            reference_fields: reference_fields.to_vec(),
            entries: Vec::new(),
        }
    }

    pub fn add_record(&mut self, record: &CatalogueRecord) {
        let mut references = Vec::new();
        for rf in &self.reference_fields {
            for value in record.subfield_values(&[rf.tag.as_str()], rf.code) {
                if let Some(target) = normalize_reference(value) {
                    if !references.contains(&target) {
                        references.push(target);
                    }
                }
            }
        }

        self.entries.push(RecordEntry {
            identifier: record.identifier().map(str::to_string),
            location: Location::from(&record.provenance),
            references,
        });
    }

    /// End of the per-record phase
    pub fn freeze(self) -> AuditContext {
        let mut identifiers: BTreeMap<String, Vec<Location>> = BTreeMap::new();
        for entry in &self.entries {
            if let Some(id) = &entry.identifier {
                identifiers
                    .entry(id.clone())
                    .or_default()
                    .push(entry.location.clone());
            }
        }
        AuditContext {
            entries: self.entries,
            identifiers,
        }
    }
}

/// Strip a leading "(ORG)" prefix: "(Uk)012345678" -> "012345678"
pub fn normalize_reference(value: &str) -> Option<String> {
    let mut value = value.trim();
    if value.starts_with('(') {
        if let Some(end) = value.find(')') {
            value = value[end + 1..].trim();
        }
    }
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

// ============================================================================
// AUDIT CONTEXT (global phase, read-only)
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct AuditContext {
    entries: Vec<RecordEntry>,
    identifiers: BTreeMap<String, Vec<Location>>,
}

impl AuditContext {
    /// Every processed record, in processing order
    pub fn records(&self) -> &[RecordEntry] {
        &self.entries
    }

    /// Identifier -> every place it occurs, in processing order
    pub fn identifiers(&self) -> &BTreeMap<String, Vec<Location>> {
        &self.identifiers
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.identifiers.contains_key(identifier)
    }

    pub fn record_count(&self) -> usize {
        self.entries.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================
