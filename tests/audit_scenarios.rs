// Audit runs over real folders of full<N>.lex files

use catalogue_audit::{
    audit_folder, encode_record, AuditConfig, AuditReport, CatalogueRecord, Field, Provenance,
    ReportFormat, Severity, Subfield, MALFORMED_RECORD,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const LEADER: &str = "00000nam a2200000 a 4500";
const F008: &str = "040715s2003    enk           000 0 eng d";

fn record(id: &str) -> CatalogueRecord {
    CatalogueRecord::new(LEADER, Provenance::new("", 0, 0))
        .with_field(Field::control("001", id))
        .with_field(Field::control("008", F008))
        .with_field(Field::data(
            "245",
            ['1', '0'],
            vec![Subfield { code: 'a', value: format!("Title {}", id) }],
        ))
}

fn linked(id: &str, target: &str) -> CatalogueRecord {
    record(id).with_field(Field::data(
        "773",
        ['0', ' '],
        vec![Subfield { code: 'w', value: target.to_string() }],
    ))
}

fn write_lex(dir: &Path, name: &str, records: &[CatalogueRecord]) {
    let mut bytes = Vec::new();
    for r in records {
        bytes.extend(encode_record(r));
        bytes.push(b'\n');
    }
    fs::write(dir.join(name), bytes).unwrap();
}

fn config() -> AuditConfig {
    AuditConfig::default().with_years(2025, 2003)
}

fn run(input: &Path, output: &Path, config: &AuditConfig) -> AuditReport {
    let path = audit_folder(input, output, config).unwrap();
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn duplicate_across_files_is_reported_once() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_lex(input.path(), "full1.lex", &[record("A"), record("B"), record("C")]);
    write_lex(input.path(), "full2.lex", &[record("C"), record("D")]);

    let report = run(input.path(), output.path(), &config());

    assert_eq!(report.summary.records_processed, 5);
    assert_eq!(report.summary.files_processed, 2);
    assert_eq!(report.summary.total_findings, 1);

    let finding = &report.findings[0];
    assert_eq!(finding.rule, "duplicate-identifier");
    assert_eq!(finding.severity, Severity::Error);
    assert_eq!(finding.record_id.as_deref(), Some("C"));
    assert_eq!(finding.source_file, "full1.lex");
    assert_eq!(finding.related.len(), 1);
    assert_eq!(finding.related[0].source_file, "full2.lex");
}

#[test]
fn reference_to_missing_record_is_dangling() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    // forward reference to B resolves, Z never appears
    write_lex(input.path(), "full1.lex", &[linked("A", "(Uk)B"), linked("X", "Z")]);
    write_lex(input.path(), "full2.lex", &[record("B")]);

    let report = run(input.path(), output.path(), &config());

    let dangling: Vec<_> = report.findings_for_rule("dangling-reference").collect();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].record_id.as_deref(), Some("X"));
    assert!(dangling[0].message.contains('Z'));
    assert_eq!(report.summary.total_findings, 1);
}

#[test]
fn empty_folder_produces_empty_report() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    fs::write(input.path().join("readme.txt"), "not an export").unwrap();

    let report = run(input.path(), output.path(), &config());

    assert_eq!(report.summary.files_processed, 0);
    assert_eq!(report.summary.records_processed, 0);
    assert_eq!(report.summary.total_findings, 0);
    assert!(report.findings.is_empty());
    assert!(report.coverage.is_empty());
}

#[test]
fn identical_input_gives_identical_bytes() {
    let input = TempDir::new().unwrap();
    write_lex(input.path(), "full1.lex", &[record("A"), linked("B", "Q"), record("A")]);
    write_lex(input.path(), "full2.lex", &[record("C")]);

    for format in [ReportFormat::Json, ReportFormat::Tsv] {
        let config = config().with_format(format);
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();

        let a = fs::read(audit_folder(input.path(), first.path(), &config).unwrap()).unwrap();
        let b = fs::read(audit_folder(input.path(), second.path(), &config).unwrap()).unwrap();
        assert_eq!(a, b, "{} output differs between runs", format);
    }
}

#[test]
fn parser_resynchronises_after_bad_records() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();

    let mut bytes = encode_record(&record("A"));
    bytes.extend_from_slice(b"12x45nam a2200000 a 4500\x1e\x1d");
    bytes.extend(encode_record(&record("B")));
    let mut wrong_length = encode_record(&record("C"));
    wrong_length[0..5].copy_from_slice(b"00010");
    bytes.extend(wrong_length);
    bytes.extend(encode_record(&record("D")));
    fs::write(input.path().join("full1.lex"), bytes).unwrap();

    let report = run(input.path(), output.path(), &config());

    // 5 records in the file, 2 of them malformed
    assert_eq!(report.summary.malformed_records, 2);
    assert_eq!(report.summary.records_processed, 3);
    let offsets: Vec<usize> = report
        .findings_for_rule(MALFORMED_RECORD)
        .map(|f| f.record_offset)
        .collect();
    assert_eq!(offsets, vec![2, 4]);
}

#[test]
fn findings_are_ordered_by_file_then_offset() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let no_title = CatalogueRecord::new(LEADER, Provenance::new("", 0, 0))
        .with_field(Field::control("001", "N"))
        .with_field(Field::control("008", F008));
    write_lex(input.path(), "full10.lex", &[no_title.clone()]);
    write_lex(input.path(), "full2.lex", &[record("A"), no_title]);

    let report = run(input.path(), output.path(), &config());

    let order: Vec<(&str, usize, &str)> = report
        .findings
        .iter()
        .map(|f| (f.source_file.as_str(), f.record_offset, f.rule.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("full2.lex", 2, "required-fields"),
            ("full2.lex", 2, "duplicate-identifier"),
            ("full10.lex", 1, "required-fields"),
        ]
    );
}

#[test]
fn missing_input_folder_is_fatal() {
    let base = TempDir::new().unwrap();
    let output = base.path().join("out");

    let result = audit_folder(&base.path().join("nope"), &output, &config());

    assert!(result.is_err());
    assert!(!output.join("catalogue-audit-report.json").exists());
}
