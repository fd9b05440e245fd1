//! Key rules shared by every backend
//!
//! Prefix scans are range queries over the lexicographic key order:
//! `[prefix, prefix + MAX_KEY_CHAR]`, both ends inclusive. That range only
//! covers every key starting with `prefix` when no key character sorts at or
//! above [`MAX_KEY_CHAR`], so writes are validated against it.

use crate::error::{StoreError, StoreResult};

/// Reserved key holding the application schema version written by `init`.
pub const VERSION_KEY: &str = "version";

/// Upper-bound suffix for prefix range queries.
pub const MAX_KEY_CHAR: char = '~';

/// Inclusive `(lower, upper)` bounds of the range holding every key starting with `prefix`.
pub fn prefix_bounds(prefix: &str) -> (String, String) {
    let mut upper = String::with_capacity(prefix.len() + 1);
    upper.push_str(prefix);
    upper.push(MAX_KEY_CHAR);
    (prefix.to_string(), upper)
}

/// Check that every character of `key` sorts strictly below [`MAX_KEY_CHAR`].
pub fn validate_key(key: &str) -> StoreResult<()> {
    if key.chars().all(|c| c < MAX_KEY_CHAR) {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_bounds() {
        assert_eq!(
            prefix_bounds("user/"),
            ("user/".to_string(), "user/~".to_string())
        );
        assert_eq!(prefix_bounds(""), (String::new(), "~".to_string()));
    }

    #[test]
    fn test_bounds_cover_prefixed_keys_only() {
        let (lower, upper) = prefix_bounds("a");
        let in_range = |k: &str| k >= lower.as_str() && k <= upper.as_str();

        assert!(in_range("a"));
        assert!(in_range("ab"));
        assert!(in_range("a}}}}"));
        assert!(!in_range("b"));
        assert!(!in_range("A"));
        assert!(!in_range(""));
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("").is_ok());
        assert!(validate_key("version").is_ok());
        assert!(validate_key("user/42:settings").is_ok());
        assert!(validate_key("{braces}|pipes").is_ok());

        assert_eq!(
            validate_key("a~b"),
            Err(StoreError::InvalidKey("a~b".to_string()))
        );
        assert!(validate_key("del\u{7f}").is_err());
        assert!(validate_key("café").is_err());
    }
}
