use crate::parser::record::RawRecord;
use crate::text::SENTINEL;

pub const PARTIES_FIELD: &str = "z95xpartiesinvolved";
pub const NOTICE_TYPE_FIELD: &str = "z95xnoticesdecisionstype";

/// Values of a multi-valued field, one slot per element. Blank elements and an
/// empty or missing list come back as the sentinel, so there is always a first slot.
pub fn extract(record: &RawRecord, field: &str) -> Vec<String> {
    let values: Vec<String> = record
        .string_list(field)
        .iter()
        .map(|v| match v.trim() {
            "" => SENTINEL.to_string(),
            trimmed => trimmed.to_string(),
        })
        .collect();
    if values.is_empty() {
        vec![SENTINEL.to_string()]
    } else {
        values
    }
}

pub fn parties(record: &RawRecord) -> Vec<String> {
    extract(record, PARTIES_FIELD)
}

pub fn notice_types(record: &RawRecord) -> Vec<String> {
    extract(record, NOTICE_TYPE_FIELD)
}
