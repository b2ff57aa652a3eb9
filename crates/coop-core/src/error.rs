//! Validation errors for request payloads.
//!
//! Every variant names the offending field so the message returned to the
//! client says exactly what to fix.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be between {min} and {max} characters")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
    },

    #[error("{field} must match {other}")]
    Mismatch {
        field: &'static str,
        other: &'static str,
    },

    #[error("{field} is not a valid {expected}")]
    Format {
        field: &'static str,
        expected: &'static str,
    },

    #[error("{field} is unchanged")]
    Unchanged { field: &'static str },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} contains duplicate id {id}")]
    Duplicate { field: &'static str, id: String },

    #[error("{field} references unknown {target} {id}")]
    UnknownReference {
        field: &'static str,
        target: &'static str,
        id: String,
    },
}

impl ValidationError {
    /// Require a non-blank string whose character count lies in `min..=max`.
    pub fn check_required(field: &'static str, value: &str, min: usize, max: usize) -> Result<(), Self> {
        if value.trim().is_empty() {
            return Err(Self::Required { field });
        }
        Self::check_length(field, value, min, max)
    }

    pub fn check_length(field: &'static str, value: &str, min: usize, max: usize) -> Result<(), Self> {
        let len = value.chars().count();
        if len < min || len > max {
            return Err(Self::Length { field, min, max });
        }
        Ok(())
    }

    /// Length check that passes when the optional value is absent.
    pub fn check_optional(field: &'static str, value: Option<&str>, max: usize) -> Result<(), Self> {
        match value {
            Some(v) => Self::check_length(field, v, 0, max),
            None => Ok(()),
        }
    }

    /// Minimal email shape: one `@` with non-empty local part and a dotted domain.
    pub fn check_email(field: &'static str, value: &str) -> Result<(), Self> {
        let invalid = Self::Format {
            field,
            expected: "email address",
        };
        let Some((local, domain)) = value.split_once('@') else {
            return Err(invalid);
        };
        let domain_ok = domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !domain.contains('@');
        if local.is_empty() || !domain_ok || value.chars().any(char::is_whitespace) {
            return Err(invalid);
        }
        Ok(())
    }

    /// Non-negative decimal amount with at most two fraction digits, e.g. `1500.50`.
    pub fn check_decimal(field: &'static str, value: &str) -> Result<(), Self> {
        let invalid = Self::Format {
            field,
            expected: "decimal amount",
        };
        let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
        let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !digits(whole) || !digits(fraction) || fraction.len() > 2 {
            return Err(invalid);
        }
        if value.ends_with('.') {
            return Err(invalid);
        }
        Ok(())
    }
}
