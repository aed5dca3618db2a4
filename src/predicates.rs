//! Value predicates shared by schema constraints

use once_cell::sync::Lazy;
use regex::Regex;

/// Fixed address shape: something@something.something, no whitespace
pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// Absolute URL with a scheme and a host
pub const URL_PATTERN: &str = r"^[a-zA-Z][a-zA-Z0-9+.\-]*://[^\s/?#]+[^\s]*$";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern compiles"));
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(URL_PATTERN).expect("url pattern compiles"));

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

pub fn is_valid_url(value: &str) -> bool {
    URL_RE.is_match(value)
}

/// Length in UTF-16 code units, the unit browser form inputs report
pub fn utf16_len(value: &str) -> usize {
    value.encode_utf16().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(is_valid_email("ann@example.com"));
        assert!(!is_valid_email("ann@example"));
        assert!(!is_valid_email("ann @example.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn test_url() {
        assert!(is_valid_url("https://example.com/path?q=1"));
        assert!(is_valid_url("ftp://files.example.com"));
        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url("https://"));
        assert!(!is_valid_url("https://exa mple.com"));
    }

    #[test]
    fn test_utf16_len() {
        assert_eq!(utf16_len("héllo"), 5);
        assert_eq!(utf16_len(""), 0);
        // astral plane characters take a surrogate pair
        assert_eq!(utf16_len("😀"), 2);
        assert_eq!(utf16_len("a😀b"), 4);
    }
}
