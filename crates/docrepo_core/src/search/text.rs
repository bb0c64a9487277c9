//! Full-text term matching for paginated search.
//!
//! # Invariants
//! - Tokens are maximal runs of letters/digits, lowercased.
//! - A query matches when any query token matches any value token.
//! - A trailing `*` on a query word turns its last token into a prefix match.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("valid token regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryToken {
    pub text: String,
    pub prefix: bool,
}

/// Splits text into lowercase word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(text)
        .map(|found| found.as_str().to_lowercase())
        .collect()
}

/// Parses a user search term into query tokens.
pub fn parse_query(term: &str) -> Vec<QueryToken> {
    let mut tokens = Vec::new();
    for word in term.split_whitespace() {
        let prefix = word.ends_with('*');
        let mut word_tokens = tokenize(word);
        let last = word_tokens.pop();
        tokens.extend(word_tokens.into_iter().map(|text| QueryToken {
            text,
            prefix: false,
        }));
        if let Some(text) = last {
            tokens.push(QueryToken { text, prefix });
        }
    }
    tokens
}

/// Whether a stored field value matches any token of `term`.
pub fn value_matches(value: &Value, term: &str) -> bool {
    let query = parse_query(term);
    if query.is_empty() {
        return false;
    }

    let mut value_tokens = Vec::new();
    collect_tokens(value, &mut value_tokens);

    query.iter().any(|token| {
        value_tokens.iter().any(|candidate| {
            if token.prefix {
                candidate.starts_with(token.text.as_str())
            } else {
                candidate == &token.text
            }
        })
    })
}

fn collect_tokens(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(text) => out.extend(tokenize(text)),
        Value::Number(number) => out.extend(tokenize(&number.to_string())),
        Value::Array(items) => items.iter().for_each(|item| collect_tokens(item, out)),
        Value::Bool(_) | Value::Null | Value::Object(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_query, tokenize, value_matches, QueryToken};
    use serde_json::json;

    #[test]
    fn tokenize_lowercases_and_splits_on_punctuation() {
        assert_eq!(tokenize("Anne-Marie O'Neil"), vec!["anne", "marie", "o", "neil"]);
    }

    #[test]
    fn parse_query_marks_trailing_wildcard_as_prefix() {
        assert_eq!(
            parse_query("jo* smith"),
            vec![
                QueryToken {
                    text: "jo".to_string(),
                    prefix: true
                },
                QueryToken {
                    text: "smith".to_string(),
                    prefix: false
                },
            ]
        );
    }

    #[test]
    fn value_matches_any_token() {
        assert!(value_matches(&json!("Mary Jane"), "jane doe"));
        assert!(value_matches(&json!(["red", "Blue"]), "blue"));
        assert!(value_matches(&json!("Johnson"), "john*"));
        assert!(!value_matches(&json!("Johnson"), "john"));
        assert!(!value_matches(&json!("anything"), "   "));
    }
}
