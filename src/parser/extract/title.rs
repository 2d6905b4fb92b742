use crate::parser::record::RawRecord;
use crate::text::{non_blank, SENTINEL, SEPARATOR};

const TITLE_FIELD: &str = "z95xsitecoretitle";

/// How a keyword splits a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Split {
    /// The keyword introduces another name and is dropped.
    Consume,
    /// The keyword ends a name and stays with it; the split happens after it.
    After,
}

/// Applied in order, so the longer phrases are consumed before their fragments.
/// Matching is by literal substring, which also hits mid-word ("Osaka" contains "aka").
const ALIAS_KEYWORDS: &[(&str, Split)] = &[
    ("formerly known as", Split::Consume),
    ("carrying on business as", Split::Consume),
    ("previously known as", Split::Consume),
    ("now known as", Split::Consume),
    ("also known as", Split::Consume),
    ("operating as", Split::Consume),
    ("formerly", Split::Consume),
    ("known as", Split::Consume),
    ("a.k.a.", Split::Consume),
    ("aka", Split::Consume),
    ("dba", Split::Consume),
    ("Inc", Split::After),
    ("Ltd", Split::After),
    ("Inc.", Split::After),
    ("Ltd.", Split::After),
    (".,", Split::Consume),
    (";", Split::Consume),
];

/// A title and the alias split off it. Either may be the sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleAlias {
    pub title: String,
    pub alias: String,
}

/// One `TitleAlias` per raw title entry; at least one, even for a missing field.
pub fn extract(record: &RawRecord) -> Vec<TitleAlias> {
    let entries = record.string_list(TITLE_FIELD);
    if entries.is_empty() {
        return vec![TitleAlias {
            title: SENTINEL.to_string(),
            alias: SENTINEL.to_string(),
        }];
    }
    entries.iter().map(|entry| split_title_alias(entry)).collect()
}

pub fn split_title_alias(raw: &str) -> TitleAlias {
    let mut text = raw.replace('\n', "").replace("<br>", "");
    for &(keyword, split) in ALIAS_KEYWORDS {
        let replacement = match split {
            Split::Consume => format!(" {} ", SEPARATOR),
            Split::After => format!("{} {} ", keyword, SEPARATOR),
        };
        text = text.replace(keyword, &replacement);
    }

    let mut segments = text.split(SEPARATOR);
    let title = segments.next().and_then(non_blank).map(str::to_string);

    let rest: Vec<&str> = segments.map(str::trim).filter(|s| !s.is_empty()).collect();
    let alias = if rest.is_empty() {
        None
    } else {
        let joined = rest.join(" ");
        non_blank(joined.trim_matches('.')).map(str::to_string)
    };

    TitleAlias {
        title: title.unwrap_or_else(|| SENTINEL.to_string()),
        alias: alias.unwrap_or_else(|| SENTINEL.to_string()),
    }
}
