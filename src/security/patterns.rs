//! Injection and XSS signature matching.

use once_cell::sync::Lazy;
use regex::Regex;

/// Signatures for externally supplied content that must never reach a page.
static SUSPICIOUS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)<script\b",
        r"(?i)javascript:",
        r"(?i)\bon\w+\s*=",
        r"(?i)<iframe\b",
        r"(?i)<object\b",
        r"(?i)<embed\b",
        r"(?i)<style\b",
        r"(?i)<link\b",
        r"(?i)<meta\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static pattern must compile"))
    .collect()
});

/// Whether `input` matches any injection/XSS signature.
///
/// Pure and stateless; used both for event classification and as a gate
/// before accepting externally supplied content.
pub fn is_suspicious_input(input: &str) -> bool {
    SUSPICIOUS_PATTERNS
        .iter()
        .any(|pattern| pattern.is_match(input))
}
