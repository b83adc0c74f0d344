// 📅 Fixed-Length Data Elements - 008 decoding
// Date entered on file, publication year, country and language codes

use crate::record::CatalogueRecord;
use chrono::NaiveDate;

/// Years 00-30 in 008/00-05 are 20xx, the rest 19xx
const CENTURY_PIVOT: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicationYear {
    /// Four-digit year
    Year(i32),
    /// Four positions present but unknown (contains `u`) or a placeholder (0000, 9999)
    Other,
    /// No usable date in 008/07-10
    None,
}

impl PublicationYear {
    pub fn is_present(&self) -> bool {
        !matches!(self, PublicationYear::None)
    }

    /// Row label used by the coverage table
    pub fn label(&self) -> String {
        match self {
            PublicationYear::Year(y) => y.to_string(),
            PublicationYear::Other => "Other".to_string(),
            PublicationYear::None => "None".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedFields {
    /// 008/00-05, `None` when absent or not a calendar date
    pub date_entered: Option<NaiveDate>,
    /// 008/00-05 as it appears in the record
    pub date_entered_raw: String,
    pub publication_year: PublicationYear,
    /// 008/15-17 letters, lowercased
    pub country: String,
    /// 008/35-37 letters
    pub language: String,
}

fn slice(data: &str, start: usize, len: usize) -> String {
    data.chars().skip(start).take(len).collect()
}

impl FixedFields {
    /// Decode the first 008 of a record, `None` if it has none
    pub fn from_record(record: &CatalogueRecord) -> Option<Self> {
        record.control_field("008").map(Self::parse)
    }

    pub fn parse(data: &str) -> Self {
        let date_entered_raw = slice(data, 0, 6);
        let date_entered = parse_date_entered(&date_entered_raw);

        let year: String = slice(data, 7, 4)
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == 'u')
            .collect();
        let publication_year = if year.len() != 4 {
            PublicationYear::None
        } else if year.contains('u') || year == "0000" || year == "9999" {
            PublicationYear::Other
        } else {
            year.parse()
                .map(PublicationYear::Year)
                .unwrap_or(PublicationYear::None)
        };

        let country = slice(data, 15, 3)
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_lowercase())
            .collect();
        let language = slice(data, 35, 3)
            .chars()
            .filter(|c| c.is_ascii_lowercase())
            .collect();

        FixedFields {
            date_entered,
            date_entered_raw,
            publication_year,
            country,
            language,
        }
    }

    /// 008/00-05 digits as a YYYYMMDD-style number, century from the pivot
    ///
    /// Unlike `date_entered` this keeps partial and impossible dates:
    /// "0407  " gives 200407, "041345" gives 20041345.
    pub fn date_entered_key(&self) -> Option<u64> {
        let digits: String = self
            .date_entered_raw
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        if digits.is_empty() {
            return None;
        }
        let yy: u32 = digits.chars().take(2).collect::<String>().parse().ok()?;
        let century = if yy <= CENTURY_PIVOT { "20" } else { "19" };
        format!("{}{}", century, digits).parse().ok()
    }

    pub fn has_valid_country(&self) -> bool {
        (2..=3).contains(&self.country.len())
    }

    pub fn has_valid_language(&self) -> bool {
        (2..=3).contains(&self.language.len())
    }
}

fn parse_date_entered(raw: &str) -> Option<NaiveDate> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 6 {
        return None;
    }
    let yy: u32 = digits[0..2].parse().ok()?;
    let month: u32 = digits[2..4].parse().ok()?;
    let day: u32 = digits[4..6].parse().ok()?;
    let century = if yy <= CENTURY_PIVOT { 2000 } else { 1900 };
    NaiveDate::from_ymd_opt((century + yy) as i32, month, day)
}
