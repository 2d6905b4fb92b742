use chrono::{DateTime, Local};
use serde::Deserialize;
use serde_json::Value;

use crate::parser::record::RawRecord;
use crate::text::SENTINEL;

const SYSDATE: &str = "sysdate";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Zone used to decide which calendar day a timestamp falls on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateZone {
    #[default]
    Local,
    Utc,
}

pub fn extract(record: &RawRecord, zone: DateZone) -> String {
    record
        .field(SYSDATE)
        .and_then(as_millis)
        .and_then(|ms| format_millis(ms, zone))
        .unwrap_or_else(|| SENTINEL.to_string())
}

/// Format a millisecond epoch as `YYYY-MM-DD`.
pub fn format_millis(millis: i64, zone: DateZone) -> Option<String> {
    let instant = DateTime::from_timestamp_millis(millis)?;
    let day = match zone {
        DateZone::Utc => instant.format(DATE_FORMAT).to_string(),
        DateZone::Local => instant.with_timezone(&Local).format(DATE_FORMAT).to_string(),
    };
    Some(day)
}

fn as_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(float_millis)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_millis))
        }
        Value::Array(items) => items.first().and_then(as_millis),
        _ => None,
    }
}

fn float_millis(f: f64) -> Option<i64> {
    if f.is_finite() && f.abs() < i64::MAX as f64 {
        Some(f.trunc() as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(sysdate: Value) -> RawRecord {
        RawRecord::new(json!({ "raw": { "sysdate": sysdate } }))
    }

    #[test]
    fn millis_to_utc_day() {
        assert_eq!(extract(&record(json!(1700000000000u64)), DateZone::Utc), "2023-11-14");
        assert_eq!(extract(&record(json!(1700000000000.0)), DateZone::Utc), "2023-11-14");
        assert_eq!(extract(&record(json!("1700000000000")), DateZone::Utc), "2023-11-14");
    }

    #[test]
    fn local_zone_matches_chrono_local() {
        let expected = DateTime::from_timestamp_millis(1700000000000)
            .unwrap()
            .with_timezone(&Local)
            .format("%Y-%m-%d")
            .to_string();
        assert_eq!(extract(&record(json!(1700000000000u64)), DateZone::Local), expected);
    }

    #[test]
    fn missing_or_empty_is_sentinel() {
        let empty = RawRecord::new(json!({ "raw": {} }));
        assert_eq!(extract(&empty, DateZone::Utc), SENTINEL);
        assert_eq!(extract(&record(json!("")), DateZone::Utc), SENTINEL);
        assert_eq!(extract(&record(json!("  ")), DateZone::Utc), SENTINEL);
        assert_eq!(extract(&record(json!([])), DateZone::Utc), SENTINEL);
        assert_eq!(extract(&record(json!(null)), DateZone::Utc), SENTINEL);
        assert_eq!(extract(&record(json!("soon")), DateZone::Utc), SENTINEL);
    }

    #[test]
    fn out_of_range_is_sentinel() {
        assert_eq!(extract(&record(json!(i64::MAX)), DateZone::Utc), SENTINEL);
    }
}
