// 📊 Coverage Statistics - How much of each field the catalogue carries
// Rows are date bands and publication years, columns are formats

use crate::fixed_fields::{FixedFields, PublicationYear};
use crate::record::CatalogueRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const TOTAL_ROW: &str = "Total for all years";
pub const PRE_ALEPH: &str = "Pre-Aleph implementation";
pub const POST_ALEPH: &str = "Post-Aleph implementation";
pub const NO_DATE_ENTERED: &str = "No date entered on file";
pub const PROCESS_YEAR_TOTAL: &str = "Process year: Total";
pub const ALL_FORMATS: &str = "All formats";

/// Column headings of a coverage table, in counter order
pub const COUNTER_LABELS: [&str; 12] = [
    "Total",
    "008 Date",
    "008 Country",
    "008 Language",
    "082",
    "337 unmediated",
    "337 computer",
    "Other 337",
    "6XX",
    "920/LEO $a MP1",
    "920/LEO $a MP15",
    "920/LEO $a MP17",
];

/// Aleph went live on 2004-06-01, compared as YYYYMMDD
const ALEPH_IMPLEMENTATION: u64 = 20040601;

/// Date band of 008/00-05
///
/// Banding uses the digits as written, so partial or impossible dates still
/// land on one side of the cut-over.
pub fn date_band(fixed: Option<&FixedFields>) -> &'static str {
    match fixed.and_then(FixedFields::date_entered_key) {
        Some(key) if key < ALEPH_IMPLEMENTATION => PRE_ALEPH,
        Some(_) => POST_ALEPH,
        None => NO_DATE_ENTERED,
    }
}

// ============================================================================
// COUNTERS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageCounts {
    pub total: u64,
    pub date_008: u64,
    pub country_008: u64,
    pub language_008: u64,
    pub classification_082: u64,
    pub unmediated_337: u64,
    pub computer_337: u64,
    pub other_337: u64,
    pub subjects_6xx: u64,
    pub leo_mp1: u64,
    pub leo_mp15: u64,
    pub leo_mp17: u64,
}

impl CoverageCounts {
    pub fn values(&self) -> [u64; 12] {
        [
            self.total,
            self.date_008,
            self.country_008,
            self.language_008,
            self.classification_082,
            self.unmediated_337,
            self.computer_337,
            self.other_337,
            self.subjects_6xx,
            self.leo_mp1,
            self.leo_mp15,
            self.leo_mp17,
        ]
    }

    fn add(&mut self, obs: &Observation) {
        self.total += 1;
        self.date_008 += obs.date as u64;
        self.country_008 += obs.country as u64;
        self.language_008 += obs.language as u64;
        self.classification_082 += obs.classification as u64;
        self.unmediated_337 += obs.unmediated as u64;
        self.computer_337 += obs.computer as u64;
        self.other_337 += obs.other_media as u64;
        self.subjects_6xx += obs.subjects as u64;
        self.leo_mp1 += obs.mp1 as u64;
        self.leo_mp15 += obs.mp15 as u64;
        self.leo_mp17 += obs.mp17 as u64;
    }
}

/// What one record contributes to every cell it lands in
struct Observation {
    date: bool,
    country: bool,
    language: bool,
    classification: bool,
    unmediated: bool,
    computer: bool,
    other_media: bool,
    subjects: bool,
    mp1: bool,
    mp15: bool,
    mp17: bool,
}

impl Observation {
    fn of(record: &CatalogueRecord, fixed: Option<&FixedFields>) -> Self {
        let media: BTreeSet<String> = record
            .subfield_values(&["337"], 'a')
            .map(|v| v.trim().to_lowercase())
            .collect();
        let unmediated = media.contains("unmediated");
        let computer = !unmediated && media.contains("computer");

        let leo_has = |code: &str| record.subfield_contains(&["920", "LEO"], 'a', code);

        Observation {
            date: fixed.map_or(false, |f| f.publication_year.is_present()),
            country: fixed.map_or(false, FixedFields::has_valid_country),
            language: fixed.map_or(false, FixedFields::has_valid_language),
            classification: record.has_field("082"),
            unmediated,
            computer,
            other_media: !unmediated && !computer && !media.is_empty(),
            subjects: record.has_subjects(),
            mp1: leo_has("MP1"),
            mp15: leo_has("MP15"),
            mp17: leo_has("MP17"),
        }
    }
}

// ============================================================================
// COVERAGE TABLE
// ============================================================================

/// Row label -> format -> counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageTable {
    pub process_year: i32,
    pub rows: BTreeMap<String, BTreeMap<String, CoverageCounts>>,
}

impl CoverageTable {
    pub fn new(process_year: i32) -> Self {
        CoverageTable {
            process_year,
            rows: BTreeMap::new(),
        }
    }

    /// Count one in-scope record (identified and not excluded)
    pub fn add_record(&mut self, record: &CatalogueRecord) {
        let fixed = FixedFields::from_record(record);
        let band = date_band(fixed.as_ref());
        let year = fixed
            .as_ref()
            .map(|f| f.publication_year.clone())
            .unwrap_or(PublicationYear::None);
        let obs = Observation::of(record, fixed.as_ref());

        let mut formats: BTreeSet<String> = record
            .subfield_values(&["914", "FMT"], 'a')
            .map(|v| v.trim().to_uppercase())
            .filter(|v| !v.is_empty())
            .collect();
        formats.insert(ALL_FORMATS.to_string());

        let mut rows = vec![TOTAL_ROW.to_string(), band.to_string(), year.label()];
        if year == PublicationYear::Year(self.process_year) {
            rows.push(PROCESS_YEAR_TOTAL.to_string());
            rows.push(format!("Process year: {}", band));
        }

        for row in rows {
            let cells = self.rows.entry(row).or_default();
            for format in &formats {
                cells.entry(format.clone()).or_default().add(&obs);
            }
        }
    }

    pub fn get(&self, row: &str, format: &str) -> Option<&CoverageCounts> {
        self.rows.get(row).and_then(|cells| cells.get(format))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Field, Provenance, Subfield};

    fn record(f008: &str) -> CatalogueRecord {
        CatalogueRecord::new("00000nam a2200000 a 4500", Provenance::new("full1.lex", 1, 0))
            .with_field(Field::control("001", "A"))
            .with_field(Field::control("008", f008))
    }

    fn data(tag: &str, code: char, value: &str) -> Field {
        Field::data(tag, [' ', ' '], vec![Subfield { code, value: value.to_string() }])
    }

    #[test]
    fn test_rows_and_counters() {
        let mut table = CoverageTable::new(2003);
        let r = record("040715s2003    enk           000 0 eng d")
            .with_field(data("082", 'a', "025.3"))
            .with_field(data("337", 'a', "Computer"))
            .with_field(data("FMT", 'a', "bk"))
            .with_field(data("LEO", 'a', "MP15"));
        table.add_record(&r);

        for row in [TOTAL_ROW, POST_ALEPH, "2003", PROCESS_YEAR_TOTAL, "Process year: Post-Aleph implementation"] {
            let counts = table.get(row, ALL_FORMATS).unwrap();
            assert_eq!(counts.total, 1, "row {}", row);
        }

        let counts = table.get(TOTAL_ROW, "BK").unwrap();
        assert_eq!(counts.date_008, 1);
        assert_eq!(counts.country_008, 1);
        assert_eq!(counts.language_008, 1);
        assert_eq!(counts.classification_082, 1);
        assert_eq!(counts.computer_337, 1);
        assert_eq!(counts.unmediated_337, 0);
        assert_eq!(counts.other_337, 0);
        // MP15 also matches MP1
        assert_eq!(counts.leo_mp1, 1);
        assert_eq!(counts.leo_mp15, 1);
        assert_eq!(counts.leo_mp17, 0);
    }

    #[test]
    fn test_pre_aleph_and_other_process_year() {
        let mut table = CoverageTable::new(2020);
        table.add_record(&record("990101s19uu    xx            000 0 eng d"));

        assert_eq!(table.get(PRE_ALEPH, ALL_FORMATS).unwrap().total, 1);
        assert_eq!(table.get("Other", ALL_FORMATS).unwrap().total, 1);
        assert!(table.get(PROCESS_YEAR_TOTAL, ALL_FORMATS).is_none());
    }

    #[test]
    fn test_missing_008() {
        let mut table = CoverageTable::new(2020);
        let r = CatalogueRecord::new("", Provenance::new("full1.lex", 1, 0))
            .with_field(Field::control("001", "A"))
            .with_field(data("337", 'a', "video"));
        table.add_record(&r);

        let counts = table.get(NO_DATE_ENTERED, ALL_FORMATS).unwrap();
        assert_eq!(counts.total, 1);
        assert_eq!(counts.date_008, 0);
        assert_eq!(counts.other_337, 1);
        assert!(table.get("None", ALL_FORMATS).is_some());
        assert_eq!(table.rows[TOTAL_ROW].keys().collect::<Vec<_>>(), vec![ALL_FORMATS]);
    }

    #[test]
    fn test_leo_codes_ignore_case() {
        let mut table = CoverageTable::new(2020);
        table.add_record(&record("040715s2003    enk           000 0 eng d").with_field(data("920", 'a', "mp17")));

        let counts = table.get(TOTAL_ROW, ALL_FORMATS).unwrap();
        assert_eq!(counts.leo_mp17, 1);
        assert_eq!(counts.leo_mp1, 1);
        assert_eq!(counts.leo_mp15, 0);
    }

    #[test]
    fn test_partial_and_impossible_dates_are_banded() {
        let mut table = CoverageTable::new(2020);
        // 200407 sorts before 20040601
        table.add_record(&record("0407  s2003    enk           000 0 eng d"));
        // month 13 is still compared by its digits
        table.add_record(&record("041345s2003    enk           000 0 eng d"));

        assert_eq!(table.get(PRE_ALEPH, ALL_FORMATS).unwrap().total, 1);
        assert_eq!(table.get(POST_ALEPH, ALL_FORMATS).unwrap().total, 1);
        assert!(table.get(NO_DATE_ENTERED, ALL_FORMATS).is_none());
    }
}
