pub mod extract;
pub mod record;

use crate::crawler::CrawlCursor;
use crate::table::Row;
use crate::text::indexed_column;
use extract::DateZone;
use record::{RawRecord, SearchResponse};

const ONSITE_PAGE_URL: &str = "https://www.asc.ca/en/enforcement/notices-decisions-and-orders\
#first={OFFSET}&sort=%40z95xcreateddate%20descending";

/// Deep link to the listing page a hit was found on.
pub fn page_url(offset: u64) -> String {
    ONSITE_PAGE_URL.replace("{OFFSET}", &offset.to_string())
}

/// Assemble one row from a hit and the cursor of the page it arrived on.
/// Multi-valued fields spill into `_NN` columns; title and alias always share an index.
pub fn assemble(record: &RawRecord, cursor: &CrawlCursor, zone: DateZone) -> Row {
    let extracted = extract::extract_all(record, zone);
    let mut row = Row::new();

    row.insert("url".into(), page_url(cursor.offset));
    row.insert("pdf_url".into(), extracted.pdf_url);
    row.insert("date".into(), extracted.date);

    for (i, pair) in extracted.titles.into_iter().enumerate() {
        row.insert(indexed_column("title", i), pair.title);
        row.insert(indexed_column("alias", i), pair.alias);
    }
    for (i, value) in extracted.notice_types.into_iter().enumerate() {
        row.insert(indexed_column("type", i), value);
    }
    for (i, value) in extracted.parties.into_iter().enumerate() {
        row.insert(indexed_column("parties_involved", i), value);
    }

    row
}

/// All rows for one page, in hit order.
pub fn process_page(page: &SearchResponse, cursor: &CrawlCursor, zone: DateZone) -> Vec<Row> {
    page.results
        .iter()
        .map(|record| assemble(record, cursor, zone))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::SENTINEL;
    use serde_json::json;

    fn cursor(offset: u64) -> CrawlCursor {
        CrawlCursor {
            offset,
            page_size: 10,
            total_count: None,
        }
    }

    fn index_set(row: &Row, base: &str) -> Vec<String> {
        row.keys()
            .filter_map(|k| {
                if k == base {
                    Some(String::new())
                } else {
                    k.strip_prefix(&format!("{}_", base)).map(str::to_string)
                }
            })
            .collect()
    }

    #[test]
    fn url_encodes_page_offset() {
        let row = assemble(&RawRecord::new(json!({})), &cursor(20), DateZone::Utc);
        assert_eq!(
            row["url"],
            "https://www.asc.ca/en/enforcement/notices-decisions-and-orders#first=20&sort=%40z95xcreateddate%20descending"
        );
    }

    #[test]
    fn malformed_hit_still_gives_full_row() {
        let row = assemble(&RawRecord::new(json!("not an object")), &cursor(0), DateZone::Utc);
        for column in ["title", "alias", "date", "pdf_url", "type", "parties_involved"] {
            assert_eq!(row[column], SENTINEL, "{}", column);
        }
    }

    #[test]
    fn titles_and_aliases_share_indices() {
        let record = RawRecord::new(json!({
            "raw": { "z95xsitecoretitle": ["A", "B aka C", "D"] }
        }));
        let row = assemble(&record, &cursor(0), DateZone::Utc);
        assert_eq!(index_set(&row, "title"), index_set(&row, "alias"));
        assert_eq!(row["title_03"], "D");
        assert_eq!(row["alias_02"], "C");
        assert_eq!(row["alias_03"], SENTINEL);
    }

    #[test]
    fn list_fields_spill_into_indexed_columns() {
        let record = RawRecord::new(json!({
            "raw": {
                "z95xnoticesdecisionstype": ["Decision", "Order"],
                "z95xpartiesinvolved": ["X", "Y", "Z"]
            }
        }));
        let row = assemble(&record, &cursor(0), DateZone::Utc);
        assert_eq!(row["type"], "Decision");
        assert_eq!(row["type_02"], "Order");
        assert_eq!(row["parties_involved_03"], "Z");
        assert!(!row.contains_key("type_03"));
    }

    #[test]
    fn page_rows_keep_hit_order() {
        let json = std::fs::read_to_string("tests/fixtures/page_0.json").unwrap();
        let page: SearchResponse = serde_json::from_str(&json).unwrap();
        let rows = process_page(&page, &cursor(10), DateZone::Utc);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1]["title_02"], "Northern Résources Inc");
        assert_eq!(rows[2]["title"], "Jane Doe");
        assert!(rows.iter().all(|r| r["url"].contains("#first=10&")));
    }
}
