pub mod date;
pub mod lists;
pub mod pdf;
pub mod title;

pub use date::DateZone;
pub use title::TitleAlias;

use super::record::RawRecord;

/// Every normalized value pulled out of one search hit.
#[derive(Debug, Clone)]
pub struct ExtractedRecord {
    pub pdf_url: String,
    pub date: String,
    pub titles: Vec<TitleAlias>,
    pub notice_types: Vec<String>,
    pub parties: Vec<String>,
}

pub fn extract_all(record: &RawRecord, zone: DateZone) -> ExtractedRecord {
    ExtractedRecord {
        pdf_url: pdf::extract(record),
        date: date::extract(record, zone),
        titles: title::extract(record),
        notice_types: lists::notice_types(record),
        parties: lists::parties(record),
    }
}

// ── Tests ──
