use serde::Deserialize;
use serde_json::Value;

/// One page of the search API response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "totalCountFiltered", default)]
    pub total_count: u64,
    #[serde(default)]
    pub results: Vec<RawRecord>,
}

/// A single search hit, kept as untyped JSON so that no hit can fail to parse.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Value);

impl RawRecord {
    #[cfg(test)]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// A field from the hit's `raw` sub-object.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0.get("raw").and_then(|raw| raw.get(key))
    }

    pub fn click_uri(&self) -> Option<&str> {
        self.0.get("clickUri").and_then(Value::as_str)
    }

    /// A field read as a list of strings. Scalars become a single element,
    /// `null` elements become empty strings.
    pub fn string_list(&self, key: &str) -> Vec<String> {
        match self.field(key) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().map(value_text).collect(),
            Some(other) => vec![value_text(other)],
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
