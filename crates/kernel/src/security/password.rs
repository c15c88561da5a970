//! Password strength rules.

use std::fmt;

use serde::Serialize;

/// A rule the password broke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "rule")]
pub enum PasswordViolation {
    TooShort { min: usize },
    MissingUppercase,
    MissingLowercase,
    MissingDigit,
    MissingSymbol,
}

impl fmt::Display for PasswordViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordViolation::TooShort { min } => {
                write!(f, "Password must be at least {min} characters long")
            }
            PasswordViolation::MissingUppercase => {
                f.write_str("Password must contain at least one uppercase letter")
            }
            PasswordViolation::MissingLowercase => {
                f.write_str("Password must contain at least one lowercase letter")
            }
            PasswordViolation::MissingDigit => {
                f.write_str("Password must contain at least one number")
            }
            PasswordViolation::MissingSymbol => {
                f.write_str("Password must contain at least one special character")
            }
        }
    }
}

/// Outcome of [`validate_password`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordCheck {
    pub is_valid: bool,
    /// Every violated rule, in rule order.
    pub errors: Vec<PasswordViolation>,
}

/// Check `password` against every rule and report all violations.
pub fn validate_password(password: &str, min_length: usize) -> PasswordCheck {
    let mut errors = Vec::new();

    if password.chars().count() < min_length {
        errors.push(PasswordViolation::TooShort { min: min_length });
    }
    if !password.chars().any(char::is_uppercase) {
        errors.push(PasswordViolation::MissingUppercase);
    }
    if !password.chars().any(char::is_lowercase) {
        errors.push(PasswordViolation::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push(PasswordViolation::MissingDigit);
    }
    if !password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
    {
        errors.push(PasswordViolation::MissingSymbol);
    }

    PasswordCheck {
        is_valid: errors.is_empty(),
        errors,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn strong_password_passes() {
        let check = validate_password("Str0ng!pass", 8);
        assert!(check.is_valid);
        assert!(check.errors.is_empty());
    }

    #[test]
    fn reports_every_violation() {
        let check = validate_password("abc", 8);
        assert!(!check.is_valid);
        assert_eq!(
            check.errors,
            vec![
                PasswordViolation::TooShort { min: 8 },
                PasswordViolation::MissingUppercase,
                PasswordViolation::MissingDigit,
                PasswordViolation::MissingSymbol,
            ]
        );
    }

    #[test]
    fn whitespace_is_not_a_symbol() {
        let check = validate_password("Abcdefg1 ", 8);
        assert_eq!(check.errors, vec![PasswordViolation::MissingSymbol]);
    }

    #[test]
    fn messages_are_human_readable() {
        assert_eq!(
            PasswordViolation::TooShort { min: 12 }.to_string(),
            "Password must be at least 12 characters long"
        );
    }

    #[test]
    fn serializes_in_camel_case() {
        let value = serde_json::to_value(validate_password("abcdefgh", 8)).unwrap();
        assert_eq!(value["isValid"], false);
        assert!(value.get("is_valid").is_none());
        assert_eq!(value["errors"][0]["rule"], "missing_uppercase");
    }
}
