//! Stateless input validation: application slugs and regex-based config values.

use crate::SchemaError;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Validate an application slug: 1-64 characters of `[a-z0-9-]`, with no
/// leading or trailing dash.
pub fn validate_slug(slug: &str) -> Result<(), SchemaError> {
    if slug.is_empty() || slug.len() > 64 {
        return Err(SchemaError::InvalidSlug(
            "application slug must be 1-64 characters".to_owned(),
        ));
    }
    if !slug
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(SchemaError::InvalidSlug(
            "application slug must match [a-z0-9-]".to_owned(),
        ));
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(SchemaError::InvalidSlug(
            "application slug must not start or end with a dash".to_owned(),
        ));
    }
    Ok(())
}

const REGEX_MATCH_ERROR: &str = "Value does not match regex";

/// Outcome of a failed config value validation, surfaced to the operator
/// alongside the validator that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
    pub pattern: String,
}

/// Validates a config value against a user-supplied regular expression.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegexValidator {
    pub pattern: String,
}

impl RegexValidator {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// Check `input` against the pattern. Returns `None` on success.
    ///
    /// An unparseable pattern is reported as a validation error, not a
    /// panic: the pattern itself is operator-supplied config.
    pub fn validate(&self, input: &str) -> Option<ValidationError> {
        let re = match Regex::new(&self.pattern) {
            Ok(re) => re,
            Err(e) => {
                return Some(ValidationError {
                    message: format!("Invalid regex: {e}"),
                    pattern: self.pattern.clone(),
                });
            }
        };
        if re.is_match(input) {
            None
        } else {
            Some(ValidationError {
                message: REGEX_MATCH_ERROR.to_owned(),
                pattern: self.pattern.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_slugs() {
        assert!(validate_slug("my-app").is_ok());
        assert!(validate_slug("app2").is_ok());
        assert!(validate_slug("a").is_ok());
    }

    #[test]
    fn invalid_slugs() {
        assert!(validate_slug("").is_err());
        assert!(validate_slug("My-App").is_err());
        assert!(validate_slug("my_app").is_err());
        assert!(validate_slug("-app").is_err());
        assert!(validate_slug("app-").is_err());
        assert!(validate_slug(&"a".repeat(65)).is_err());
    }

    #[test]
    fn regex_validator_accepts_match() {
        let v = RegexValidator::new(".*");
        assert_eq!(v.validate("test"), None);
    }

    #[test]
    fn regex_validator_reports_invalid_pattern() {
        let v = RegexValidator::new("[");
        let err = v.validate("test").unwrap();
        assert!(err.message.starts_with("Invalid regex:"));
        assert_eq!(err.pattern, "[");
    }

    #[test]
    fn regex_validator_reports_mismatch() {
        let v = RegexValidator::new("test");
        let err = v.validate("foo").unwrap();
        assert_eq!(err.message, REGEX_MATCH_ERROR);
        assert_eq!(err.pattern, "test");
    }
}
