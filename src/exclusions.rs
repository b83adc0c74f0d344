// 🚫 Exclusion Categories - Records out of scope for coverage statistics
// Classification only: matching records are listed in the report, not flagged as findings

use crate::record::CatalogueRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// CATEGORIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExclusionCategory {
    #[serde(rename = "sta-ffp")]
    SuppressedWithoutFfp,
    #[serde(rename = "979")]
    NegativeShelfmark,
    #[serde(rename = "src-dss")]
    SourceDss,
    #[serde(rename = "src-mop")]
    SourceMop,
    #[serde(rename = "src-lds")]
    SourceLds,
    #[serde(rename = "other")]
    Other,
}

impl ExclusionCategory {
    pub const ALL: [ExclusionCategory; 6] = [
        ExclusionCategory::SuppressedWithoutFfp,
        ExclusionCategory::NegativeShelfmark,
        ExclusionCategory::SourceDss,
        ExclusionCategory::SourceMop,
        ExclusionCategory::SourceLds,
        ExclusionCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ExclusionCategory::SuppressedWithoutFfp => "STA SUPPRESSED",
            ExclusionCategory::NegativeShelfmark => "979 $j N",
            ExclusionCategory::SourceDss => "SRC $a DSS02-04",
            ExclusionCategory::SourceMop => "SRC $a MOP",
            ExclusionCategory::SourceLds => "SRC $a LDS",
            ExclusionCategory::Other => "Other",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ExclusionCategory::SuppressedWithoutFfp => "932/STA suppressed and no 949/FFP",
            ExclusionCategory::NegativeShelfmark => {
                "979 $j N and none of the following: 082, 245 $h electronic resource, \
                 538 $a internet, 600-662, 852 $b STI, HMNTS, OC, NPL, MAPS or MUSIC, \
                 922/LKR $a ANA, 949/FFP, 952/UNO"
            }
            ExclusionCategory::SourceDss => {
                "930/SRC $a DSS02, DSS03 or DSS04 and none of the following: 082, \
                 245 $h electronic resource, 260, 264, 300, 538 $a internet, 600-662, \
                 908/CFI, 920/LEO, 949/FFP, 952/UNO"
            }
            ExclusionCategory::SourceMop => {
                "930/SRC $a MOP and none of the following: 082, 600-662, 852 $j, 920/LEO"
            }
            ExclusionCategory::SourceLds => {
                "930/SRC $a LDS and none of the following: 082, 600-662, 852, 908/CFI, 920/LEO"
            }
            ExclusionCategory::Other => {
                "None of the following: LDR/17=5, 082, 600-662, 852, 913/FIN, 922/LKR, \
                 928/SID, 949/FFP, 952/UNO, 985 $a LDLSCP or ELECTRONIC"
            }
        }
    }
}

// ============================================================================
// RECORD SIGNALS
// ============================================================================

/// The subfield tests the categories are built from, evaluated once per record
struct Signals {
    electronic_245h: bool,
    internet_538a: bool,
    shelfmark_852b: bool,
    has_852j: bool,
    ffp: bool,
    analytic_lkr: bool,
    src_dss: bool,
    src_lds: bool,
    src_mop: bool,
    suppressed: bool,
    subjects: bool,
    legal_deposit_985a: bool,
    negative_979j: bool,
}

impl Signals {
    fn of(record: &CatalogueRecord) -> Self {
        let any_of = |tags: &[&str], code: char, needles: &[&str]| {
            needles
                .iter()
                .any(|needle| record.subfield_contains(tags, code, needle))
        };

        Signals {
            electronic_245h: record.subfield_contains(&["245"], 'h', "ELECTRONIC RESOURCE"),
            internet_538a: record.subfield_contains(&["538"], 'a', "INTERNET"),
            shelfmark_852b: any_of(&["852"], 'b', &["HMNTS", "MAPS", "MUSIC", "NPL", "OC", "STI"]),
            has_852j: record.fields(&["852"]).any(|f| f.has_subfield('j')),
            ffp: record.subfield_contains(&["949", "FFP"], 'a', "Y"),
            analytic_lkr: record.subfield_contains(&["922", "LKR"], 'a', "ANA"),
            src_dss: any_of(&["930", "SRC"], 'a', &["DSS02", "DSS03", "DSS04"]),
            src_lds: record.subfield_contains(&["930", "SRC"], 'a', "LDS"),
            src_mop: record.subfield_contains(&["930", "SRC"], 'a', "MOP"),
            suppressed: record.subfield_contains(&["932", "STA"], 'a', "SUPPRESSED"),
            subjects: record.has_subjects(),
            legal_deposit_985a: any_of(&["985"], 'a', &["LDLSCP", "ELECTRONIC"]),
            negative_979j: record.subfield_contains(&["979"], 'j', "N"),
        }
    }
}

/// Categories a record falls into, in category order
pub fn classify(record: &CatalogueRecord) -> Vec<ExclusionCategory> {
    let s = Signals::of(record);
    let mut categories = Vec::new();

    if s.suppressed && !s.ffp {
        categories.push(ExclusionCategory::SuppressedWithoutFfp);
    }

    if s.negative_979j
        && !(s.electronic_245h || s.internet_538a || s.shelfmark_852b || s.analytic_lkr || s.subjects)
        && !record.has_any_field(&["082", "949", "FFP", "952", "UNO"])
    {
        categories.push(ExclusionCategory::NegativeShelfmark);
    }

    if s.src_dss
        && !(s.electronic_245h || s.internet_538a || s.subjects)
        && !record.has_any_field(&[
            "082", "260", "264", "300", "920", "LEO", "908", "CFI", "949", "FFP", "952", "UNO",
        ])
    {
        categories.push(ExclusionCategory::SourceDss);
    }

    if s.src_mop && !s.has_852j && !record.has_any_field(&["082", "920", "LEO"]) {
        categories.push(ExclusionCategory::SourceMop);
    }

    if s.src_lds
        && !s.subjects
        && !record.has_any_field(&["082", "852", "920", "LEO", "908", "CFI"])
    {
        categories.push(ExclusionCategory::SourceLds);
    }

    if record.leader_byte(17) != Some('5')
        && !(s.legal_deposit_985a || s.subjects)
        && !record.has_any_field(&[
            "082", "852", "913", "FIN", "922", "LKR", "928", "SID", "949", "FFP", "952", "UNO",
        ])
    {
        categories.push(ExclusionCategory::Other);
    }

    categories
}

// ============================================================================
// CLASSIFIER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionSummary {
    pub category: ExclusionCategory,
    pub label: String,
    pub description: String,
    pub count: usize,
    pub identifiers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionReport {
    pub categories: Vec<ExclusionSummary>,
    /// Distinct records in at least one category
    pub total: usize,
}

/// Collects excluded identifiers per category across the run
#[derive(Debug, Default)]
pub struct ExclusionClassifier {
    by_category: BTreeMap<ExclusionCategory, BTreeSet<String>>,
}

impl ExclusionClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one identified record; returns true if it is excluded
    pub fn observe(&mut self, identifier: &str, record: &CatalogueRecord) -> bool {
        let categories = classify(record);
        for category in &categories {
            self.by_category
                .entry(*category)
                .or_default()
                .insert(identifier.to_string());
        }
        !categories.is_empty()
    }

    pub fn report(&self) -> ExclusionReport {
        let categories = ExclusionCategory::ALL
            .iter()
            .map(|category| {
                let identifiers: Vec<String> = self
                    .by_category
                    .get(category)
                    .map(|ids| ids.iter().cloned().collect())
                    .unwrap_or_default();
                ExclusionSummary {
                    category: *category,
                    label: category.label().to_string(),
                    description: category.description().to_string(),
                    count: identifiers.len(),
                    identifiers,
                }
            })
            .collect();

        let union: BTreeSet<&String> = self.by_category.values().flatten().collect();

        ExclusionReport {
            categories,
            total: union.len(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
