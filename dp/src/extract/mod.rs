//! Recovery of structured data from free-text model replies
//!
//! The upstream model is only loosely instructed to answer in JSON and often wraps the
//! object in prose or a code fence. Extraction tries an ordered list of independent
//! strategies, each a pure `&str -> Option<Record>`; the first that yields a JSON object
//! wins. Nothing here returns an error: failure is `None` (or an empty list).

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// A parsed JSON object
pub type Record = serde_json::Map<String, Value>;

/// One way of turning reply text into a record
pub type ParseStrategy = fn(&str) -> Option<Record>;

/// Strategies in the order they are attempted
pub const STRATEGIES: &[(&str, ParseStrategy)] = &[
    ("fenced-json", fenced_json_block),
    ("balanced-braces", first_balanced_object),
    ("whole-text", whole_text),
];

/// Maximum URLs taken from a reply without structure
pub const MAX_SCANNED_URLS: usize = 3;

/// Maximum length of a title synthesized from surrounding text
pub const MAX_SCANNED_TITLE_CHARS: usize = 200;

static FENCED_JSON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)\s*(\{.*?\})\s*```").expect("valid fence regex"));

static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://[^\s)]+").expect("valid url regex"));

/// Extract the first JSON object found by any strategy
pub fn extract_record(text: &str) -> Option<Record> {
    debug!(text_len = text.len(), "extract_record: called");
    for (name, strategy) in STRATEGIES {
        if let Some(record) = strategy(text) {
            debug!(%name, "extract_record: strategy matched");
            return Some(record);
        }
    }
    debug!("extract_record: no strategy matched");
    None
}

fn parse_object(candidate: &str) -> Option<Record> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(record)) => Some(record),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "parse_object: not valid JSON");
            None
        }
    }
}

/// Interior of a code fence tagged `json`
pub fn fenced_json_block(text: &str) -> Option<Record> {
    let captures = FENCED_JSON_RE.captures(text)?;
    parse_object(captures.get(1)?.as_str())
}

/// The object opened by the first `{`, closed at its matching `}`
///
/// Braces inside JSON strings are ignored when tracking depth.
pub fn first_balanced_object(text: &str) -> Option<Record> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (i, b) in text.bytes().enumerate().skip(start) {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match b {
                b'\\' => escape = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return parse_object(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// The whole reply as one object
pub fn whole_text(text: &str) -> Option<Record> {
    parse_object(text.trim())
}

/// A citation recovered from a reply, before it becomes a [`crate::domain::Citation`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCandidate {
    pub id: Option<String>,
    pub title: String,
    pub url: String,
}

/// Title used when a reply gives a URL without a name
pub fn default_title(query: &str) -> String {
    format!("Article on: {}", query)
}

fn first_str<'a>(item: &'a Record, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| item.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Citations listed under `key` in a record
///
/// Entries without a URL are dropped.
pub fn sources_from_record(record: &Record, key: &str, query: &str) -> Vec<SourceCandidate> {
    let Some(items) = record.get(key).and_then(Value::as_array) else {
        debug!(%key, "sources_from_record: no source array");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|item| {
            let Some(url) = first_str(item, &["url", "link", "href"]) else {
                debug!(?item, "sources_from_record: dropping source without url");
                return None;
            };
            Some(SourceCandidate {
                id: first_str(item, &["id"]).map(str::to_string),
                title: first_str(item, &["title", "name"])
                    .map(str::to_string)
                    .unwrap_or_else(|| default_title(query)),
                url: url.to_string(),
            })
        })
        .collect()
}

/// Pair bare URLs in plain text with the text just before them on the same line
pub fn scan_urls(text: &str, query: &str) -> Vec<SourceCandidate> {
    debug!(text_len = text.len(), "scan_urls: called");
    let mut found: Vec<SourceCandidate> = Vec::new();

    for m in URL_RE.find_iter(text) {
        if found.len() >= MAX_SCANNED_URLS {
            break;
        }
        let url = m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?', '"', '\'', ']', '>']);
        if found.iter().any(|c| c.url == url) {
            continue;
        }

        let line_start = text[..m.start()].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let prefix = &text[line_start..m.start()];
        let title = if prefix.ends_with(char::is_whitespace) {
            clean_title(prefix)
        } else {
            String::new()
        };

        found.push(SourceCandidate {
            id: None,
            title: if title.is_empty() { default_title(query) } else { title },
            url: url.to_string(),
        });
    }

    debug!(count = found.len(), "scan_urls: done");
    found
}

fn clean_title(raw: &str) -> String {
    raw.trim()
        .trim_start_matches(['-', '•', '*'])
        .trim()
        .trim_end_matches([':', '-', '–', '—'])
        .trim()
        .chars()
        .take(MAX_SCANNED_TITLE_CHARS)
        .collect()
}

/// Citations from a search reply: structured first, URL scan second
///
/// A reply that parses as a record but lists no sources yields nothing; the scan only
/// runs when no record could be recovered at all.
pub fn extract_sources(text: &str, query: &str) -> Vec<SourceCandidate> {
    match extract_record(text) {
        Some(record) => sources_from_record(&record, "sources", query),
        None => {
            debug!("extract_sources: no record, scanning for urls");
            scan_urls(text, query)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OBJECT: &str = r#"{"answer": "morning", "sources": [{"url": "https://a.example", "title": "A"}]}"#;

    #[test]
    fn test_fenced_block_with_and_without_prose() {
        let bare = format!("```json\n{}\n```", OBJECT);
        let wrapped = format!("Sure! Here is the answer:\n\n```json\n{}\n```\n\nHope that helps {{:", OBJECT);

        let a = extract_record(&bare).unwrap();
        let b = extract_record(&wrapped).unwrap();
        assert_eq!(a, b);
        assert_eq!(a["answer"], "morning");
    }

    #[test]
    fn test_fenced_block_preferred_over_earlier_braces() {
        let text = format!("Note {{not json}} first.\n```json\n{}\n```", OBJECT);
        assert_eq!(extract_record(&text).unwrap()["answer"], "morning");
    }

    #[test]
    fn test_balanced_braces_in_prose() {
        let text = format!("The result is {} as requested.", OBJECT);
        let record = extract_record(&text).unwrap();
        assert_eq!(record["sources"][0]["title"], "A");
    }

    #[test]
    fn test_balanced_braces_ignores_braces_in_strings() {
        let text = r#"Reply: {"answer": "evening }", "note": "{nested"} trailing }"#;
        let record = first_balanced_object(text).unwrap();
        assert_eq!(record["answer"], "evening }");
    }

    #[test]
    fn test_whole_text() {
        assert!(whole_text(&format!("  {}\n", OBJECT)).is_some());
        assert!(whole_text("[1, 2, 3]").is_none());
    }

    #[test]
    fn test_unstructured_text_is_not_found() {
        assert!(extract_record("I think mornings are best for this.").is_none());
        assert!(extract_record("").is_none());
        assert!(extract_record("{ broken: json").is_none());
        assert!(extract_record("```json\n{oops}\n```").is_none());
    }

    #[test]
    fn test_sources_from_record_drops_missing_urls() {
        let record = whole_text(
            r#"{"sources": [
                {"title": "Has url", "url": "https://x.example"},
                {"title": "No url"},
                {"name": "Named", "link": "https://y.example", "id": "s-9"},
                {"href": "https://z.example", "url": "  "}
            ]}"#,
        )
        .unwrap();

        let sources = sources_from_record(&record, "sources", "yoga");
        assert_eq!(sources.len(), 3);
        assert_eq!(sources[0].title, "Has url");
        assert_eq!(sources[1].title, "Named");
        assert_eq!(sources[1].id.as_deref(), Some("s-9"));
        assert_eq!(sources[2].url, "https://z.example");
        assert_eq!(sources[2].title, "Article on: yoga");
    }

    #[test]
    fn test_scan_urls_pairs_preceding_text() {
        let text = "Here are some reads:\n\
                    - Sleep and productivity: https://sleep.example/a\n\
                    * Morning light https://light.example/b.\n\
                    https://bare.example/c\n\
                    - Extra https://extra.example/d";

        let found = scan_urls(text, "focus");
        assert_eq!(found.len(), MAX_SCANNED_URLS);
        assert_eq!(found[0].title, "Sleep and productivity");
        assert_eq!(found[0].url, "https://sleep.example/a");
        assert_eq!(found[1].title, "Morning light");
        assert_eq!(found[1].url, "https://light.example/b");
        assert_eq!(found[2].title, "Article on: focus");
    }

    #[test]
    fn test_scan_urls_skips_repeats_and_parens() {
        let text = "See [guide](https://g.example/x) and again https://g.example/x";
        let found = scan_urls(text, "q");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, "https://g.example/x");
        assert_eq!(found[0].title, "Article on: q");
    }

    #[test]
    fn test_scan_caps_title_length() {
        let text = format!("{} https://long.example", "t".repeat(500));
        assert_eq!(scan_urls(&text, "q")[0].title.chars().count(), MAX_SCANNED_TITLE_CHARS);
    }

    #[test]
    fn test_extract_sources_structured_first() {
        let text = format!("Found these https://ignored.example\n```json\n{}\n```", OBJECT);
        let sources = extract_sources(&text, "q");
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].url, "https://a.example");
    }

    #[test]
    fn test_extract_sources_record_without_sources_is_empty() {
        assert!(extract_sources(r#"{"sources": []} see https://x.example"#, "q").is_empty());
    }

    #[test]
    fn test_extract_sources_never_fails() {
        assert!(extract_sources("nothing useful here", "q").is_empty());
        assert!(extract_sources("", "q").is_empty());
    }
}
