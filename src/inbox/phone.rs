//! Phone-number normalization and outbound field validation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Country code prepended to local mobile numbers.
const LOCAL_COUNTRY_CODE: &str = "57";
/// Length of a local mobile number without country code.
const LOCAL_MOBILE_LEN: usize = 10;
/// Leading digit of local mobile numbers.
const LOCAL_MOBILE_PREFIX: char = '3';

/// Canonicalize a phone number into a comparable digit string.
///
/// Every non-digit character is dropped. A 10-digit number starting with `3`
/// is a local mobile number and gets the `57` country code; anything else is
/// returned as the bare digits. Input without digits yields an empty string.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    if digits.len() == LOCAL_MOBILE_LEN && digits.starts_with(LOCAL_MOBILE_PREFIX) {
        format!("{LOCAL_COUNTRY_CODE}{digits}")
    } else {
        digits
    }
}

/// Bounds applied to outbound submissions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRules {
    /// Minimum number of digits accepted for `phone`.
    pub min_phone_digits: usize,
    /// Maximum number of digits accepted for `phone`.
    pub max_phone_digits: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_phone_digits: 10,
            max_phone_digits: 15,
        }
    }
}

/// Field-level validation failures, keyed by field name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    /// Record a failure for `field`, keeping the first message per field.
    fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Whether no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Message recorded for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate an outbound submission before any network or storage effect.
///
/// # Errors
/// Returns every failing field at once.
pub fn validate_outbound(
    phone: &str,
    message: &str,
    rules: &ValidationRules,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let phone = phone.trim();

    if phone.is_empty() {
        errors.add("phone", "The phone field is required.");
    } else if !phone.chars().all(|c| c.is_ascii_digit()) {
        errors.add("phone", "The phone must be numeric.");
    } else if phone.len() < rules.min_phone_digits || phone.len() > rules.max_phone_digits {
        errors.add(
            "phone",
            format!(
                "The phone must be between {} and {} digits.",
                rules.min_phone_digits, rules.max_phone_digits
            ),
        );
    }

    if message.trim().is_empty() {
        errors.add("message", "The message field is required.");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_mobile_gets_country_code() {
        assert_eq!(normalize("3001234567"), "573001234567");
    }

    #[test]
    fn test_already_normalized_is_unchanged() {
        assert_eq!(normalize("573001234567"), "573001234567");
    }

    #[test]
    fn test_non_digits_are_stripped() {
        assert_eq!(normalize("abc123"), "123");
        assert_eq!(normalize("+57 (300) 123-4567"), "573001234567");
        assert_eq!(normalize("300 123 4567"), "573001234567");
        assert_eq!(normalize("no digits"), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_ten_digits_not_starting_with_three() {
        assert_eq!(normalize("6011234567"), "6011234567");
    }

    #[test]
    fn test_non_ascii_digits_are_dropped() {
        assert_eq!(normalize("٣٠٠1234"), "1234");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "3001234567",
            "573001234567",
            "abc123",
            "+1 (555) 010-9999",
            "",
            "3",
            "33333333333",
            "--3001234567--",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_validate_accepts_valid_submission() {
        let rules = ValidationRules::default();
        assert!(validate_outbound("3001234567", "Hola", &rules).is_ok());
        assert!(validate_outbound("573001234567", "Hola", &rules).is_ok());
    }

    #[test]
    fn test_validate_reports_all_fields() {
        let rules = ValidationRules::default();
        let errors = validate_outbound("12ab", "   ", &rules).unwrap_err();
        assert_eq!(errors.get("phone"), Some("The phone must be numeric."));
        assert_eq!(errors.get("message"), Some("The message field is required."));
    }

    #[test]
    fn test_validate_digit_bounds() {
        let rules = ValidationRules::default();
        let short = validate_outbound("123456789", "hi", &rules).unwrap_err();
        assert!(short.get("phone").is_some());
        assert!(short.get("message").is_none());

        let long = validate_outbound("1234567890123456", "hi", &rules).unwrap_err();
        assert!(long.get("phone").is_some());

        assert!(validate_outbound("123456789012345", "hi", &rules).is_ok());
    }

    #[test]
    fn test_validate_missing_phone() {
        let errors = validate_outbound("", "hi", &ValidationRules::default()).unwrap_err();
        assert_eq!(errors.get("phone"), Some("The phone field is required."));
    }
}
