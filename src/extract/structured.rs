//! Tolerant parser for model output that should be JSON
//!
//! Models wrap JSON in Markdown fences, prepend a sentence, or append a
//! sign-off. The parser peels those layers off before decoding and reports
//! anything it still cannot read as [`BuddyError::MalformedOutput`].

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::{BuddyError, Result};

/// Decode `raw` into `T`.
///
/// Order of attempts: the trimmed text with any code fence removed, then the
/// outermost `{..}` or `[..]` span found in it.
pub fn parse<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let unfenced = strip_fences(raw);

    let first_err = match serde_json::from_str::<T>(unfenced) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    if let Some(span) = outermost_json_span(unfenced) {
        if span.len() != unfenced.len() {
            if let Ok(value) = serde_json::from_str::<T>(span) {
                return Ok(value);
            }
        }
    }

    Err(BuddyError::MalformedOutput(first_err.to_string()))
}

/// Untyped variant of [`parse`]
pub fn parse_value(raw: &str) -> Result<Value> {
    parse::<Value>(raw)
}

/// Remove surrounding whitespace and one layer of Markdown code fence.
///
/// Accepts a bare fence or one with a language tag (`json`, `JSON`, ...).
/// Text without a fence comes back trimmed.
pub fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Language tag runs to the end of the opening line
    let body = match rest.find('\n') {
        Some(newline) => {
            let tag = rest[..newline].trim();
            if tag.chars().all(|c| c.is_ascii_alphanumeric()) {
                &rest[newline + 1..]
            } else {
                rest
            }
        }
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };

    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Widest span starting at the first `{` or `[` and ending at the matching
/// last `}` or `]`
fn outermost_json_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let close = match text.as_bytes()[start] {
        b'{' => '}',
        _ => ']',
    };
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Receipt {
        merchant: String,
        total: f64,
    }

    #[test]
    fn test_plain_json() {
        let receipt: Receipt = parse(r#"{"merchant": "Cafe", "total": 12.5}"#).unwrap();
        assert_eq!(receipt.merchant, "Cafe");
        assert_eq!(receipt.total, 12.5);
    }

    #[test]
    fn test_json_fence() {
        let raw = "```json\n{\"merchant\": \"Cafe\", \"total\": 3}\n```";
        let receipt: Receipt = parse(raw).unwrap();
        assert_eq!(receipt.total, 3.0);
    }

    #[test]
    fn test_uppercase_tag_and_bare_fence() {
        assert!(parse_value("```JSON\n[1, 2]\n```").unwrap().is_array());
        assert!(parse_value("```\n{\"a\": 1}\n```").unwrap().is_object());
    }

    #[test]
    fn test_surrounding_prose() {
        let raw = "Here is the data you asked for:\n{\"merchant\": \"Shop\", \"total\": 9}\nLet me know!";
        let receipt: Receipt = parse(raw).unwrap();
        assert_eq!(receipt.merchant, "Shop");
    }

    #[test]
    fn test_malformed_is_error() {
        let err = parse_value("I could not read the document.").unwrap_err();
        assert!(matches!(err, BuddyError::MalformedOutput(_)));

        let err = parse_value("```json\n{\"a\": \n```").unwrap_err();
        assert!(matches!(err, BuddyError::MalformedOutput(_)));
    }

    #[test]
    fn test_strip_fences_leaves_plain_text() {
        assert_eq!(strip_fences("  {\"a\": 1}  "), "{\"a\": 1}");
        assert_eq!(strip_fences("```json\n{}\n```"), "{}");
    }
}
