// 📚 Record Model - In-memory catalogue records
// Leader, fields and subfields of one MARC 21 bibliographic record, plus provenance

use serde::{Deserialize, Serialize};

// ============================================================================
// CONSTANTS
// ============================================================================

pub const LEADER_LENGTH: usize = 24;
pub const DIRECTORY_ENTRY_LENGTH: usize = 12;
pub const SUBFIELD_INDICATOR: u8 = 0x1F;
pub const END_OF_FIELD: u8 = 0x1E;
pub const END_OF_RECORD: u8 = 0x1D;

/// Aleph system fields that carry raw data like 00X control fields
pub const ALEPH_CONTROL_FIELDS: [&str; 2] = ["DB ", "SYS"];

/// Subject access fields (600-662)
pub const SUBJECT_TAGS: [&str; 15] = [
    "600", "610", "611", "630", "647", "648", "650", "651", "653", "654", "655", "656", "657",
    "658", "662",
];

/// True for 00X tags and the Aleph system tags
pub fn is_control_tag(tag: &str) -> bool {
    (tag < "010" && !tag.is_empty() && tag.chars().all(|c| c.is_ascii_digit()))
        || ALEPH_CONTROL_FIELDS.contains(&tag)
}

// ============================================================================
// PROVENANCE
// ============================================================================

/// Where a record came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub source_file: String,
    /// 1-based position of the record within its file
    pub record_offset: usize,
    /// Byte offset of the first byte of the record
    pub byte_offset: u64,
}

impl Provenance {
    pub fn new(source_file: impl Into<String>, record_offset: usize, byte_offset: u64) -> Self {
        Provenance {
            source_file: source_file.into(),
            record_offset,
            byte_offset,
        }
    }
}

// ============================================================================
// FIELDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subfield {
    pub code: char,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldContent {
    Control(String),
    Data {
        indicators: [char; 2],
        subfields: Vec<Subfield>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub tag: String,
    pub content: FieldContent,
}

impl Field {
    pub fn control(tag: impl Into<String>, data: impl Into<String>) -> Self {
        Field {
            tag: tag.into(),
            content: FieldContent::Control(data.into()),
        }
    }

    pub fn data(tag: impl Into<String>, indicators: [char; 2], subfields: Vec<Subfield>) -> Self {
        Field {
            tag: tag.into(),
            content: FieldContent::Data {
                indicators,
                subfields,
            },
        }
    }

    pub fn is_control(&self) -> bool {
        matches!(self.content, FieldContent::Control(_))
    }

    /// Raw data of a control field
    pub fn control_data(&self) -> Option<&str> {
        match &self.content {
            FieldContent::Control(data) => Some(data),
            FieldContent::Data { .. } => None,
        }
    }

    pub fn subfields(&self) -> &[Subfield] {
        match &self.content {
            FieldContent::Data { subfields, .. } => subfields,
            FieldContent::Control(_) => &[],
        }
    }

    /// Values of all subfields with the given code, in order
    pub fn subfield_values(&self, code: char) -> impl Iterator<Item = &str> {
        self.subfields()
            .iter()
            .filter(move |s| s.code == code)
            .map(|s| s.value.as_str())
    }

    pub fn has_subfield(&self, code: char) -> bool {
        self.subfields().iter().any(|s| s.code == code)
    }
}

// ============================================================================
// CATALOGUE RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueRecord {
    pub leader: String,
    pub fields: Vec<Field>,
    pub provenance: Provenance,
}

impl CatalogueRecord {
    pub fn new(leader: impl Into<String>, provenance: Provenance) -> Self {
        CatalogueRecord {
            leader: leader.into(),
            fields: Vec::new(),
            provenance,
        }
    }

    /// Builder pattern: append a field
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Record identifier (first 001), `None` when missing or blank
    pub fn identifier(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.tag == "001")
            .and_then(Field::control_data)
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// All fields whose tag is one of `tags`
    pub fn fields<'a>(&'a self, tags: &'a [&'a str]) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields.iter().filter(move |f| tags.contains(&f.tag.as_str()))
    }

    pub fn has_field(&self, tag: &str) -> bool {
        self.fields.iter().any(|f| f.tag == tag)
    }

    pub fn has_any_field(&self, tags: &[&str]) -> bool {
        self.fields(tags).next().is_some()
    }

    /// Subfield values with `code` across every field tagged with one of `tags`
    pub fn subfield_values<'a>(
        &'a self,
        tags: &'a [&'a str],
        code: char,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.fields(tags).flat_map(move |f| f.subfield_values(code))
    }

    /// True if any `tags $code` value contains `needle` (case-insensitive)
    pub fn subfield_contains(&self, tags: &[&str], code: char, needle: &str) -> bool {
        let needle = needle.to_uppercase();
        self.subfield_values(tags, code)
            .any(|v| v.to_uppercase().contains(&needle))
    }

    /// First control field data for a tag (e.g. 008)
    pub fn control_field(&self, tag: &str) -> Option<&str> {
        self.fields
            .iter()
            .filter(|f| f.tag == tag)
            .find_map(Field::control_data)
    }

    pub fn leader_byte(&self, position: usize) -> Option<char> {
        self.leader.as_bytes().get(position).map(|b| *b as char)
    }

    pub fn has_subjects(&self) -> bool {
        self.has_any_field(&SUBJECT_TAGS)
    }
}

// ============================================================================
// TESTS
// ============================================================================
