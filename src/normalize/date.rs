// src/normalize/date.rs
use once_cell::sync::Lazy;
use regex::Regex;

static DMY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{2}\.\d{2}\.\d{4}").unwrap());

/// First `DD.MM.YYYY` substring of `text`, verbatim, or "" if there is none.
/// The match is purely lexical; "32.13.9999" is returned as-is.
pub fn extract_date(text: &str) -> String {
    DMY.find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
