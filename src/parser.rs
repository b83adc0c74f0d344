// 🏗️ Parser Framework - Pluggable record formats
// ISO 2709 / MARC 21 exchange records, framed on the end-of-record byte

use crate::record::{
    is_control_tag, CatalogueRecord, Field, FieldContent, Provenance, Subfield, DIRECTORY_ENTRY_LENGTH,
    END_OF_FIELD, END_OF_RECORD, LEADER_LENGTH, SUBFIELD_INDICATOR,
};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead};
use thiserror::Error;

/// Raw text kept for a malformed record
const RAW_EXCERPT_CHARS: usize = 200;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Why a single record could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ParseError {
    #[error("Invalid record length in first 5 bytes of record")]
    RecordLength,

    #[error("Declared record length {declared} does not match actual length {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("Error reading record leader")]
    Leader,

    #[error("Error locating base address of record")]
    BaseAddress,

    #[error("Base address exceeds size of record")]
    BaseAddressLength,

    #[error("Record directory is invalid")]
    Directory,

    #[error("Error locating fields in record")]
    Fields,

    #[error("Field {tag} is not valid UTF-8")]
    Encoding { tag: String },

    #[error("Record is truncated (no end-of-record marker)")]
    Truncated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MalformedRecord {
    pub provenance: Provenance,
    pub reason: ParseError,
    /// Lossy excerpt of the offending bytes
    pub raw: String,
}

/// One item from a record stream
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Record(CatalogueRecord),
    Malformed(MalformedRecord),
}

// ============================================================================
// RECORD FORMAT TRAIT
// ============================================================================

/// RecordFormat - the only thing the engine knows about the file serialisation
///
/// Implementations turn one pass over a file into a lazy stream of records.
/// A malformed record yields `ParseOutcome::Malformed` and the stream carries on
/// with the next record; an I/O failure yields `Err` and ends the stream.
pub trait RecordFormat: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    fn records<'a>(
        &self,
        reader: Box<dyn BufRead + 'a>,
        source_file: &str,
    ) -> Box<dyn Iterator<Item = io::Result<ParseOutcome>> + 'a>;
}

/// MARC 21 exchange format (`.lex` exports)
#[derive(Debug, Default, Clone, Copy)]
pub struct MarcFormat;

impl RecordFormat for MarcFormat {
    fn name(&self) -> &str {
        "marc21"
    }

    fn records<'a>(
        &self,
        reader: Box<dyn BufRead + 'a>,
        source_file: &str,
    ) -> Box<dyn Iterator<Item = io::Result<ParseOutcome>> + 'a> {
        Box::new(MarcReader::new(reader, source_file))
    }
}

// ============================================================================
// MARC READER
// ============================================================================

pub struct MarcReader<R> {
    reader: R,
    source_file: String,
    record_count: usize,
    position: u64,
    done: bool,
}

impl<R: BufRead> MarcReader<R> {
    pub fn new(reader: R, source_file: &str) -> Self {
        MarcReader {
            reader,
            source_file: source_file.to_string(),
            record_count: 0,
            position: 0,
            done: false,
        }
    }

    /// Skip line breaks and padding between records
    fn skip_separators(&mut self) -> io::Result<()> {
        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                return Ok(());
            }
            let skip = buf
                .iter()
                .take_while(|b| matches!(b, b'\r' | b'\n' | b' ' | 0))
                .count();
            let exhausted = skip == buf.len();
            self.reader.consume(skip);
            self.position += skip as u64;
            if !exhausted {
                return Ok(());
            }
        }
    }

    fn read_next(&mut self) -> io::Result<Option<ParseOutcome>> {
        self.skip_separators()?;

        let mut buf = Vec::new();
        let read = self.reader.read_until(END_OF_RECORD, &mut buf)?;
        if read == 0 {
            return Ok(None);
        }

        self.record_count += 1;
        let provenance = Provenance::new(&self.source_file, self.record_count, self.position);
        self.position += read as u64;

        let decoded = if buf.last() == Some(&END_OF_RECORD) {
            decode_record(&buf)
        } else {
            Err(ParseError::Truncated)
        };

        Ok(Some(match decoded {
            Ok((leader, fields)) => ParseOutcome::Record(CatalogueRecord {
                leader,
                fields,
                provenance,
            }),
            Err(reason) => ParseOutcome::Malformed(MalformedRecord {
                provenance,
                reason,
                raw: raw_excerpt(&buf),
            }),
        }))
    }
}

impl<R: BufRead> Iterator for MarcReader<R> {
    type Item = io::Result<ParseOutcome>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_next() {
            Ok(Some(outcome)) => Some(Ok(outcome)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

// ============================================================================
// DECODING
// ============================================================================

fn parse_number(bytes: &[u8]) -> Option<usize> {
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

fn raw_excerpt(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .take(RAW_EXCERPT_CHARS)
        .collect()
}

fn utf8(bytes: &[u8], tag: &str) -> Result<String, ParseError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| ParseError::Encoding {
        tag: tag.to_string(),
    })
}

/// Decode one complete record (terminator included) into leader and fields
pub fn decode_record(marc: &[u8]) -> Result<(String, Vec<Field>), ParseError> {
    let declared = marc.get(0..5).and_then(parse_number).ok_or(ParseError::RecordLength)?;
    if declared != marc.len() {
        return Err(ParseError::LengthMismatch {
            declared,
            actual: marc.len(),
        });
    }

    let leader_bytes = marc.get(0..LEADER_LENGTH).ok_or(ParseError::Leader)?;
    if !leader_bytes.is_ascii() {
        return Err(ParseError::Leader);
    }
    let leader = String::from_utf8_lossy(leader_bytes).into_owned();

    let base_address = parse_number(&leader_bytes[12..17]).ok_or(ParseError::BaseAddress)?;
    if base_address == 0 {
        return Err(ParseError::BaseAddress);
    }
    if base_address >= marc.len() {
        return Err(ParseError::BaseAddressLength);
    }

    // base_address - 1 skips the directory's end-of-field byte
    if base_address - 1 < LEADER_LENGTH {
        return Err(ParseError::Directory);
    }
    let directory = &marc[LEADER_LENGTH..base_address - 1];
    if !directory.is_ascii() || directory.len() % DIRECTORY_ENTRY_LENGTH != 0 {
        return Err(ParseError::Directory);
    }

    let mut fields = Vec::with_capacity(directory.len() / DIRECTORY_ENTRY_LENGTH);
    for entry in directory.chunks(DIRECTORY_ENTRY_LENGTH) {
        let tag = String::from_utf8_lossy(&entry[0..3]).into_owned();
        let length = parse_number(&entry[3..7]).ok_or(ParseError::Directory)?;
        let offset = parse_number(&entry[7..12]).ok_or(ParseError::Directory)?;

        let start = base_address + offset;
        let end = (start + length).checked_sub(1).ok_or(ParseError::Directory)?;
        if length == 0 || end > marc.len() {
            return Err(ParseError::Directory);
        }
        let data = &marc[start..end];

        fields.push(decode_field(tag, data)?);
    }

    if fields.is_empty() {
        return Err(ParseError::Fields);
    }

    Ok((leader, fields))
}

fn decode_field(tag: String, data: &[u8]) -> Result<Field, ParseError> {
    if is_control_tag(&tag) {
        let data = utf8(data, &tag)?;
        return Ok(Field::control(tag, data));
    }

    let mut chunks = data.split(|b| *b == SUBFIELD_INDICATOR);

    // Missing indicators become blanks, extra indicator bytes are ignored
    let head = utf8(chunks.next().unwrap_or_default(), &tag)?;
    let mut indicator_chars = head.chars().chain(std::iter::repeat(' '));
    let indicators = [
        indicator_chars.next().unwrap_or(' '),
        indicator_chars.next().unwrap_or(' '),
    ];

    let mut subfields = Vec::new();
    for chunk in chunks {
        let Some((&code, value)) = chunk.split_first() else {
            continue;
        };
        if !code.is_ascii() {
            return Err(ParseError::Encoding { tag });
        }
        subfields.push(Subfield {
            code: code as char,
            value: utf8(value, &tag)?,
        });
    }

    Ok(Field::data(tag, indicators, subfields))
}

// ============================================================================
// ENCODING
// ============================================================================

fn field_bytes(field: &Field) -> Vec<u8> {
    let mut out = Vec::new();
    match field.control_data() {
        Some(data) => out.extend_from_slice(data.as_bytes()),
        None => {
            if let FieldContent::Data { indicators, .. } = &field.content {
                for indicator in indicators {
                    let mut tmp = [0u8; 4];
                    out.extend_from_slice(indicator.encode_utf8(&mut tmp).as_bytes());
                }
            }
            for subfield in field.subfields() {
                out.push(SUBFIELD_INDICATOR);
                let mut tmp = [0u8; 4];
                out.extend_from_slice(subfield.code.encode_utf8(&mut tmp).as_bytes());
                out.extend_from_slice(subfield.value.as_bytes());
            }
        }
    }
    out.push(END_OF_FIELD);
    out
}

/// Serialise a record into MARC 21 exchange format
///
/// Record length and base address in the leader are recomputed; the rest of
/// the leader is kept (padded to 24 characters).
pub fn encode_record(record: &CatalogueRecord) -> Vec<u8> {
    let mut directory = Vec::new();
    let mut data = Vec::new();

    for field in &record.fields {
        let bytes = field_bytes(field);
        let tag: String = format!("{:<3}", field.tag).chars().take(3).collect();
        directory.extend_from_slice(tag.as_bytes());
        directory.extend_from_slice(format!("{:04}{:05}", bytes.len(), data.len()).as_bytes());
        data.extend_from_slice(&bytes);
    }
    directory.push(END_OF_FIELD);

    let base_address = LEADER_LENGTH + directory.len();
    let total = base_address + data.len() + 1;

    let mut leader: Vec<u8> = format!("{:<24}", record.leader)
        .bytes()
        .take(LEADER_LENGTH)
        .collect();
    leader[0..5].copy_from_slice(format!("{:05}", total).as_bytes());
    leader[12..17].copy_from_slice(format!("{:05}", base_address).as_bytes());

    let mut out = leader;
    out.extend_from_slice(&directory);
    out.extend_from_slice(&data);
    out.push(END_OF_RECORD);
    out
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn record(id: &str) -> CatalogueRecord {
        CatalogueRecord::new("00000nam a2200000 a 4500", Provenance::new("full1.lex", 0, 0))
            .with_field(Field::control("001", id))
            .with_field(Field::control("008", "040715s2003    enk           000 0 eng d"))
            .with_field(Field::data(
                "245",
                ['1', '0'],
                vec![Subfield {
                    code: 'a',
                    value: "Catalogue d'été".to_string(),
                }],
            ))
    }

    fn read_all(bytes: Vec<u8>) -> Vec<ParseOutcome> {
        MarcReader::new(Cursor::new(bytes), "full1.lex")
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_decode_encoded_record() {
        let bytes = encode_record(&record("A1"));
        let (leader, fields) = decode_record(&bytes).unwrap();

        assert_eq!(leader.len(), LEADER_LENGTH);
        assert_eq!(&leader[5..12], "nam a22");
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].control_data(), Some("A1"));
        assert_eq!(
            fields[2].subfield_values('a').collect::<Vec<_>>(),
            vec!["Catalogue d'été"]
        );
    }

    #[test]
    fn test_reader_assigns_provenance() {
        let mut bytes = encode_record(&record("A1"));
        bytes.extend(b"\r\n");
        bytes.extend(encode_record(&record("B2")));

        let outcomes = read_all(bytes);
        assert_eq!(outcomes.len(), 2);

        match &outcomes[1] {
            ParseOutcome::Record(r) => {
                assert_eq!(r.identifier(), Some("B2"));
                assert_eq!(r.provenance.record_offset, 2);
                assert_eq!(r.provenance.source_file, "full1.lex");
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_resync_after_bad_length() {
        let mut bad = encode_record(&record("B2"));
        bad[0..5].copy_from_slice(b"x0012");

        let mut bytes = encode_record(&record("A1"));
        bytes.extend(bad);
        bytes.extend(encode_record(&record("C3")));

        let outcomes = read_all(bytes);
        assert_eq!(outcomes.len(), 3);
        assert!(matches!(outcomes[0], ParseOutcome::Record(_)));
        match &outcomes[1] {
            ParseOutcome::Malformed(m) => {
                assert_eq!(m.reason, ParseError::RecordLength);
                assert_eq!(m.provenance.record_offset, 2);
            }
            other => panic!("expected malformed, got {:?}", other),
        }
        match &outcomes[2] {
            ParseOutcome::Record(r) => assert_eq!(r.identifier(), Some("C3")),
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_length_mismatch() {
        let mut bytes = encode_record(&record("A1"));
        let wrong = format!("{:05}", bytes.len() + 3);
        bytes[0..5].copy_from_slice(wrong.as_bytes());

        assert!(matches!(
            decode_record(&bytes),
            Err(ParseError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_bad_base_address() {
        let mut bytes = encode_record(&record("A1"));
        bytes[12..17].copy_from_slice(b"00000");
        assert_eq!(decode_record(&bytes), Err(ParseError::BaseAddress));

        let mut bytes = encode_record(&record("A1"));
        bytes[12..17].copy_from_slice(b"99999");
        assert_eq!(decode_record(&bytes), Err(ParseError::BaseAddressLength));
    }

    #[test]
    fn test_bad_directory_entry() {
        let mut bytes = encode_record(&record("A1"));
        // Length digits of the first directory entry
        bytes[27..31].copy_from_slice(b"zz12");
        assert_eq!(decode_record(&bytes), Err(ParseError::Directory));
    }

    #[test]
    fn test_truncated_trailing_record() {
        let mut bytes = encode_record(&record("A1"));
        let partial = encode_record(&record("B2"));
        bytes.extend(&partial[..partial.len() / 2]);

        let outcomes = read_all(bytes);
        assert_eq!(outcomes.len(), 2);
        match &outcomes[1] {
            ParseOutcome::Malformed(m) => {
                assert_eq!(m.reason, ParseError::Truncated);
                assert!(!m.raw.is_empty());
            }
            other => panic!("expected malformed, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_indicators_are_blank() {
        let field = decode_field("245".to_string(), b"\x1faTitle").unwrap();
        match field.content {
            FieldContent::Data { indicators, subfields } => {
                assert_eq!(indicators, [' ', ' ']);
                assert_eq!(subfields.len(), 1);
            }
            _ => panic!("expected data field"),
        }
    }

    #[test]
    fn test_invalid_utf8_field() {
        let result = decode_field("245".to_string(), b"10\x1fa\xff\xfe");
        assert_eq!(
            result,
            Err(ParseError::Encoding {
                tag: "245".to_string()
            })
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(read_all(Vec::new()).is_empty());
        assert!(read_all(b"\n\n".to_vec()).is_empty());
    }
}
