use crate::parser::record::RawRecord;
use crate::text::SENTINEL;

const STAGING_HOST: &str = "https://asc-cws-prod-web-cm-staging.azurewebsites.net";
const PRODUCTION_HOST: &str = "https://www.asc.ca";

/// Document link with the staging host swapped for the public one.
pub fn extract(record: &RawRecord) -> String {
    match record.click_uri().map(str::trim) {
        Some(uri) if !uri.is_empty() => uri.replace(STAGING_HOST, PRODUCTION_HOST),
        _ => SENTINEL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rewrites_staging_host() {
        let r = RawRecord::new(json!({
            "clickUri": "https://asc-cws-prod-web-cm-staging.azurewebsites.net/-/media/ASC-Documents/a.pdf"
        }));
        assert_eq!(extract(&r), "https://www.asc.ca/-/media/ASC-Documents/a.pdf");
    }

    #[test]
    fn other_hosts_untouched() {
        let r = RawRecord::new(json!({ "clickUri": "https://www.asc.ca/b.pdf" }));
        assert_eq!(extract(&r), "https://www.asc.ca/b.pdf");
    }

    #[test]
    fn empty_click_uri_is_sentinel() {
        assert_eq!(extract(&RawRecord::new(json!({ "clickUri": "" }))), SENTINEL);
        assert_eq!(extract(&RawRecord::new(json!({ "clickUri": " " }))), SENTINEL);
        assert_eq!(extract(&RawRecord::new(json!({}))), SENTINEL);
    }
}
