//! Input normalization shared by the auth and upload paths.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CoreError, Result};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

/// Trims and lowercases an email address, rejecting values that are not
/// shaped like `local@domain.tld`.
pub fn normalize_email(raw: &str) -> Result<String> {
    let email = require_non_empty("email", raw)?.to_ascii_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(CoreError::invalid_field("email", "is not a valid address"));
    }
    Ok(email)
}

/// Returns the trimmed value, or an error naming the field when it is blank.
pub fn require_non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::invalid_field(field, "must not be empty"));
    }
    Ok(trimmed)
}

/// Replaces every character outside `[A-Za-z0-9]` with `_`.
pub fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(
            normalize_email("  Ada.Lovelace@Example.COM ").unwrap(),
            "ada.lovelace@example.com"
        );
    }

    #[test]
    fn email_shape_is_checked() {
        for bad in ["", "   ", "no-at-sign", "a@b", "two words@x.io", "@example.com"] {
            assert!(normalize_email(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn blank_values_are_rejected_with_field_name() {
        let err = require_non_empty("name", " \t").unwrap_err();
        assert_eq!(err.to_string(), "Invalid name: must not be empty");
        assert_eq!(require_non_empty("name", " Ada ").unwrap(), "Ada");
    }

    #[test]
    fn file_stems_are_sanitized() {
        assert_eq!(sanitize_file_stem("cat photo (1).png"), "cat_photo__1__png");
        assert_eq!(sanitize_file_stem("résumé.jpg"), "r_sum__jpg");
        assert_eq!(sanitize_file_stem("plain"), "plain");
    }
}
