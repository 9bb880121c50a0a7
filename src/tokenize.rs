//! Identifier splitting and query normalization (C3).

use regex::Regex;
use std::sync::OnceLock;

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap())
}

/// Equivalent to `^(?=.*[a-z])(?=.*[A-Z])[A-Za-z0-9_]+$`, rewritten without
/// look-around since the `regex` crate does not support it.
fn is_mixed_case_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && s.chars().any(|c| c.is_ascii_lowercase())
        && s.chars().any(|c| c.is_ascii_uppercase())
}

/// Splits `s` on camelCase, acronym, `-`, and `_` boundaries and lowercases
/// the result. `"XMLHttpRequest"` -> `"xml http request"`.
pub fn split_identifier(s: &str) -> String {
    let s = s.trim_start_matches('_');
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == '_' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if !current.is_empty() {
            let prev = *current.as_bytes().last().unwrap() as char;
            let next = chars.get(i + 1).copied();
            let camel_boundary = prev.is_lowercase() && c.is_uppercase();
            let acronym_boundary = prev.is_uppercase()
                && c.is_uppercase()
                && next.is_some_and(|n| n.is_lowercase());
            if camel_boundary || acronym_boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .into_iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extracts mixed-case identifiers from `content`, splits each, dedupes
/// preserving first-seen order, and drops tokens shorter than 2 chars.
pub fn extract_code_tokens(content: &str) -> String {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for m in identifier_re().find_iter(content) {
        let ident = m.as_str();
        if !is_mixed_case_identifier(ident) {
            continue;
        }
        for tok in split_identifier(ident).split_whitespace() {
            if tok.len() < 2 {
                continue;
            }
            if seen.insert(tok.to_string()) {
                out.push(tok.to_string());
            }
        }
    }
    out.join(" ")
}

/// Normalizes a user query for full-text search: splits mixed-case tokens,
/// lowercases plain tokens, and strips characters reserved by the full-text
/// query grammar.
pub fn normalize_query(q: &str) -> String {
    let reserved: &[char] = &['*', '"', '(', ')', ':', ']', '[', '^'];
    let mut out = Vec::new();
    for tok in q.split_whitespace() {
        let piece = if tok.chars().any(|c| c.is_uppercase()) {
            split_identifier(tok)
        } else {
            tok.to_lowercase()
        };
        let cleaned: String = piece.chars().filter(|c| !reserved.contains(c)).collect();
        let cleaned = cleaned.trim();
        if !cleaned.is_empty() {
            out.push(cleaned.to_string());
        }
    }
    out.join(" ")
}

/// Builds the string fed to the embedder. Never stored.
pub fn contextual_embedding_input(
    path: &str,
    language: &str,
    symbol: Option<&str>,
    content: &str,
) -> String {
    match symbol {
        Some(sym) => format!("File: {path}\nLanguage: {language}\nSymbol: {sym}\n\n{content}"),
        None => format!("File: {path}\nLanguage: {language}\n\n{content}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_camel_case() {
        assert_eq!(split_identifier("authenticateUser"), "authenticate user");
    }

    #[test]
    fn splits_acronym_boundary() {
        assert_eq!(split_identifier("XMLHttpRequest"), "xml http request");
    }

    #[test]
    fn strips_leading_underscore() {
        assert_eq!(split_identifier("_privateField"), "private field");
    }

    #[test]
    fn splits_on_dash_and_underscore() {
        assert_eq!(split_identifier("foo-bar_baz"), "foo bar baz");
    }

    #[test]
    fn extract_tokens_dedupes_and_filters_short() {
        let content = "fn getUserId() -> i32 { getUserId(); let a = 1; }";
        let tokens = extract_code_tokens(content);
        assert_eq!(tokens, "get user id");
    }

    #[test]
    fn normalize_query_strips_reserved_chars() {
        assert_eq!(normalize_query("foo* (bar):baz"), "foo bar baz");
    }

    #[test]
    fn normalize_query_splits_mixed_case_tokens() {
        assert_eq!(normalize_query("authenticateUser token"), "authenticate user token");
    }

    #[test]
    fn normalize_query_empty_input_is_empty() {
        assert_eq!(normalize_query("   "), "");
    }

    #[test]
    fn contextual_input_omits_symbol_line_when_absent() {
        let s = contextual_embedding_input("a.rs", "rust", None, "fn x(){}");
        assert!(!s.contains("Symbol:"));
    }
}
